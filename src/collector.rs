//! Per-app detail collection.
//!
//! For each app, four metadata fetches run in isolation: a failure in any
//! one is logged and leaves that report field absent without touching the
//! others. When the droplet turns out to be Java-built, the droplet is
//! retrieved and scanned under the same isolation rule.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::api::CfApiClient;
use crate::droplet::DropletRetriever;
use crate::model::{
    App, AppReport, AppsPage, Droplet, EnvResponse, FolderScan, ProcessInfo, ProcessStats,
    ProcessesPage, StatsPage,
};
use crate::scanner;

/// The per-app unit of work the orchestrator fans out over.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Gathers everything we can learn about one app. Never fails: any
    /// sub-fetch failure is downgraded to an absent report field.
    async fn collect(&self, app: &App) -> AppReport;
}

/// Production [`Collector`]: CF API metadata plus droplet scan.
pub struct AppDetailCollector {
    api: CfApiClient,
    retriever: DropletRetriever,
    cleanup_droplets: bool,
}

impl AppDetailCollector {
    pub fn new(api: CfApiClient, retriever: DropletRetriever, cleanup_droplets: bool) -> Self {
        Self {
            api,
            retriever,
            cleanup_droplets,
        }
    }

    async fn fetch_processes(&self, guid: &str) -> Result<Vec<ProcessInfo>> {
        let path = format!("/v3/apps/{guid}/processes");
        let processes = self
            .api
            .fetch_all(&path, |pages: Vec<ProcessesPage>| {
                pages
                    .into_iter()
                    .filter_map(|page| page.resources)
                    .flatten()
                    .collect()
            })
            .await?;
        Ok(processes)
    }

    async fn fetch_stats(&self, guid: &str) -> Result<Vec<ProcessStats>> {
        let path = format!("/v3/processes/{guid}/stats");
        let stats = self
            .api
            .fetch_all(&path, |pages: Vec<StatsPage>| {
                pages
                    .into_iter()
                    .filter_map(|page| page.resources)
                    .flatten()
                    .collect()
            })
            .await?;
        Ok(stats)
    }

    async fn fetch_jdk_env(&self, guid: &str) -> Result<Option<String>> {
        let path = format!("/v3/apps/{guid}/env");
        let setting = self
            .api
            .fetch_all(&path, |pages: Vec<EnvResponse>| {
                pages.iter().find_map(|page| page.jdk_env())
            })
            .await?;
        Ok(setting)
    }

    async fn fetch_droplet(&self, guid: &str) -> Result<Option<Droplet>> {
        let path = format!("/v3/apps/{guid}/droplets/current");
        let droplet = self
            .api
            .fetch_all(&path, |pages: Vec<Droplet>| pages.into_iter().next())
            .await?;
        Ok(droplet)
    }

    async fn scan_droplet(&self, app_name: &str, droplet_guid: &str) -> Result<FolderScan> {
        let result = self.retrieve_and_scan(app_name, droplet_guid).await;
        // Cleanup runs whether the scan succeeded or not.
        if self.cleanup_droplets {
            let retriever = self.retriever.clone();
            let guid = droplet_guid.to_string();
            let cleanup = tokio::task::spawn_blocking(move || retriever.cleanup(&guid)).await;
            match cleanup {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(app = app_name, error = %err, "droplet cleanup failed");
                }
                Err(err) => {
                    warn!(app = app_name, error = %err, "droplet cleanup task failed");
                }
            }
        }
        result
    }

    async fn retrieve_and_scan(&self, app_name: &str, droplet_guid: &str) -> Result<FolderScan> {
        let app_dir = self.retriever.retrieve(app_name, droplet_guid).await?;
        // The walk reads and hashes every file; keep it off the async
        // worker threads.
        tokio::task::spawn_blocking(move || scanner::scan_app_folder(&app_dir)).await?
    }
}

#[async_trait]
impl Collector for AppDetailCollector {
    async fn collect(&self, app: &App) -> AppReport {
        let mut report = AppReport::bare(app.clone());

        info!(app = %app.name, "extracting app processes info");
        report.processes = match self.fetch_processes(&app.guid).await {
            Ok(processes) => Some(processes),
            Err(err) => {
                error!(app = %app.name, error = %err, "error extracting app processes info");
                None
            }
        };

        info!(app = %app.name, "extracting app process stats info");
        report.stats = match self.fetch_stats(&app.guid).await {
            Ok(stats) => Some(stats),
            Err(err) => {
                error!(app = %app.name, error = %err, "error extracting app process stats info");
                None
            }
        };

        info!(app = %app.name, "extracting jdk env info");
        report.jdk_env = match self.fetch_jdk_env(&app.guid).await {
            Ok(setting) => setting,
            Err(err) => {
                error!(app = %app.name, error = %err, "error extracting jdk env info");
                None
            }
        };

        info!(app = %app.name, "extracting app droplet info");
        report.droplet = match self.fetch_droplet(&app.guid).await {
            Ok(droplet) => droplet,
            Err(err) => {
                error!(app = %app.name, error = %err, "error extracting app droplet info");
                None
            }
        };

        if let Some(droplet) = &report.droplet {
            if let Some(droplet_guid) = scan_target(droplet) {
                info!(app = %app.name, "scanning java app");
                report.scan = match self.scan_droplet(&app.name, &droplet_guid).await {
                    Ok(scan) => Some(scan),
                    Err(err) => {
                        error!(app = %app.name, error = %err, "error scanning java app");
                        None
                    }
                };
            }
        }

        report
    }
}

/// Whether a droplet should be downloaded and scanned, and under which guid.
///
/// A droplet qualifies when its guid is known and at least one buildpack
/// name contains the substring `java` (case-sensitive, matched anywhere).
pub fn scan_target(droplet: &Droplet) -> Option<String> {
    let guid = droplet.guid.as_ref()?;
    let java_built = droplet
        .buildpacks
        .as_ref()?
        .iter()
        .any(|bp| bp.name.as_deref().is_some_and(|name| name.contains("java")));
    java_built.then(|| guid.clone())
}

/// Flattens paginated `/v3/apps` responses into the app list, preserving
/// page and in-page order.
pub fn flatten_apps(pages: Vec<AppsPage>) -> Vec<App> {
    pages
        .into_iter()
        .filter_map(|page| page.resources)
        .flatten()
        .collect()
}
