//! Bounded-concurrency fan-out over all apps in a space.
//!
//! One task per app, admitted through a shared [`Semaphore`]: a task does no
//! work before holding a permit and releases it when its report is built,
//! successful or not. Each in-flight app may spawn several `cf` subprocesses
//! and touch disk, which is why admission is bounded rather than the task
//! count. The `join_all` barrier keeps reports in input-list order
//! regardless of completion order.

use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

use crate::api::CfApiClient;
use crate::collector::{flatten_apps, Collector};
use crate::model::{App, AppReport};

pub struct ScanOrchestrator {
    api: CfApiClient,
    collector: Arc<dyn Collector>,
    permits: usize,
    progress: Option<ProgressBar>,
}

impl ScanOrchestrator {
    pub fn new(api: CfApiClient, collector: Arc<dyn Collector>, permits: usize) -> Self {
        Self {
            api,
            collector,
            // A zero-permit gate would never admit anything.
            permits: permits.max(1),
            progress: None,
        }
    }

    /// Attaches a progress bar ticked once per completed app.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scans every app in the space and returns one report per app, in the
    /// order the listing returned them.
    ///
    /// # Errors
    ///
    /// Only the initial app listing can fail this call; there is no partial
    /// report in that case. Per-app failures surface as absent report fields.
    pub async fn run(&self, space_guid: &str) -> Result<Vec<AppReport>> {
        let path = format!("/v3/apps?order_by=name&space_guids={space_guid}");
        let apps: Vec<App> = self
            .api
            .fetch_all(&path, flatten_apps)
            .await
            .with_context(|| format!("failed to list apps in space {space_guid}"))?;

        if let Some(progress) = &self.progress {
            progress.set_length(apps.len() as u64);
        }

        Ok(self.scan_apps(&apps).await)
    }

    /// Fans one collect task out per app under the admission gate.
    ///
    /// Every task is spawned onto the runtime so one app blocking on
    /// subprocess wait or disk I/O stalls only itself, never its siblings
    /// or the coordinator.
    pub async fn scan_apps(&self, apps: &[App]) -> Vec<AppReport> {
        let semaphore = Arc::new(Semaphore::new(self.permits));

        let handles: Vec<_> = apps
            .iter()
            .map(|app| {
                let app = app.clone();
                let semaphore = Arc::clone(&semaphore);
                let collector = Arc::clone(&self.collector);
                let progress = self.progress.clone();
                tokio::spawn(async move {
                    // The semaphore is never closed, so acquire cannot fail.
                    let _permit = semaphore.acquire().await.ok();
                    let report = collector.collect(&app).await;
                    if let Some(progress) = &progress {
                        progress.inc(1);
                    }
                    report
                })
            })
            .collect();

        let joined = join_all(handles).await;
        joined
            .into_iter()
            .zip(apps)
            .map(|(result, app)| match result {
                Ok(report) => report,
                Err(err) => {
                    error!(app = %app.name, error = %err, "scan task failed");
                    AppReport::bare(app.clone())
                }
            })
            .collect()
    }
}
