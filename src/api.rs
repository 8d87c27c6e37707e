//! Paginated, retrying access to the CF v3 API.
//!
//! All reads go through the operator's authenticated `cf` CLI session: one
//! `cf curl <path>` subprocess per page, stdout decoded as a single JSON
//! page. Pages are followed through `pagination.next.href` and handed to a
//! caller-supplied reducer, so callers only ever see the flattened view.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::ApiError;
use crate::model::Paginated;

/// Total attempts per page fetch, including the first.
const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles after each failed attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(300);

/// The single-page transport seam: one raw JSON page per call.
///
/// Decoding, retry, and pagination live in [`CfApiClient`]; implementations
/// only have to produce bytes or a transport failure.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, ApiError>;
}

/// Production [`PageSource`]: `cf curl` under the operator's existing login
/// and target, one subprocess per page.
#[derive(Debug, Clone, Default)]
pub struct CfCliSource;

#[async_trait]
impl PageSource for CfCliSource {
    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        debug!(path, "cf curl");
        let output = Command::new("cf")
            .arg("curl")
            .arg(path)
            .output()
            .await
            .map_err(ApiError::Spawn)?;

        if !output.status.success() {
            return Err(ApiError::Command {
                path: path.to_string(),
                status: output.status,
            });
        }

        Ok(output.stdout)
    }
}

/// Client for the platform's read-only HTTP API, driven through the `cf`
/// CLI rather than a direct HTTP stack so the operator's existing login and
/// target are reused.
#[derive(Clone)]
pub struct CfApiClient {
    source: Arc<dyn PageSource>,
}

impl Default for CfApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CfApiClient {
    pub fn new() -> Self {
        Self::with_source(Arc::new(CfCliSource))
    }

    /// Client over a custom transport; used by tests to fake the API.
    pub fn with_source(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Fetches every page reachable from `path` and reduces them to a single
    /// value.
    ///
    /// Each individual page fetch is retried with exponential backoff; a
    /// page that still fails after the last attempt fails the whole call.
    pub async fn fetch_all<T, R, F>(&self, path: &str, reduce: F) -> Result<R, ApiError>
    where
        T: DeserializeOwned + Paginated,
        F: FnOnce(Vec<T>) -> R,
    {
        let mut pages: Vec<T> = Vec::new();
        let mut next: Option<String> = Some(path.to_string());

        while let Some(page_path) = next {
            let page: T = self.fetch_page(&page_path).await?;
            next = page.next_page().map(normalize_href);
            pages.push(page);
        }

        Ok(reduce(pages))
    }

    async fn fetch_page<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        retry_with_backoff(MAX_ATTEMPTS, INITIAL_BACKOFF, || self.fetch_page_once(path)).await
    }

    async fn fetch_page_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.source.fetch_raw(path).await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// Next-page hrefs occasionally arrive with JSON-escaped ampersands when the
/// emitting side double-encodes query strings; normalize before reuse.
fn normalize_href(href: &str) -> String {
    href.replace("\\u0026", "&")
}

/// Runs `op` up to `max_attempts` times, sleeping `initial_delay` before the
/// first retry and doubling the delay after each failed attempt. Only the
/// final attempt's error is surfaced.
pub(crate) async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(_) => {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}
