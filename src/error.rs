//! Error types for API access and droplet retrieval.

use std::path::PathBuf;

/// A single-page API fetch failure.
///
/// All three variants are treated identically by the retry policy: a page
/// fetch either produced a decoded JSON page or it failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The `cf` binary could not be spawned.
    #[error("failed to spawn cf curl: {0}")]
    Spawn(#[source] std::io::Error),

    /// `cf curl` ran but exited non-zero.
    #[error("cf curl {path} exited with status {status}")]
    Command { path: String, status: std::process::ExitStatus },

    /// The command output was not the expected JSON page shape.
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A hard failure while fetching or unpacking one app's droplet.
///
/// These abort the single app's scan; the collector downgrades them to an
/// absent `scan` field in that app's report.
#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("failed to spawn cf download-droplet: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("droplet download failed for app '{app}' (exit code {code:?})")]
    Download { app: String, code: Option<i32> },

    #[error("failed to prepare extraction dir {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clean up {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking-pool task carrying extraction work panicked or was
    /// cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}
