use serde::{Deserialize, Serialize};

use crate::model::{App, CfConfig, Droplet, ProcessInfo, ProcessStats};

/// Which version scanner produced a [`ScanResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScannerKind {
    Manifest,
    DependencyName,
    ClassFile,
}

/// The output of exactly one scanner run against one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub file_name: String,
    pub scanner: ScannerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spring_boot_version: Option<String>,
}

/// Inventory entry for one regular file visited by the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    pub file_path: String,
    pub length: u64,
    pub checksum: String,
}

/// Everything the pipeline learned from one extracted app directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderScan {
    pub scanned_files: Vec<ScannedFile>,
    pub results: Vec<ScanResult>,
}

/// The full audit record for a single app.
///
/// `app` is always populated; every other field may independently be absent
/// because its sub-fetch failed. Absence of one field never implies absence
/// of another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppReport {
    pub app: App,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<ProcessInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<ProcessStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdk_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub droplet: Option<Droplet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<FolderScan>,
}

impl AppReport {
    /// A report carrying nothing but the app identity.
    pub fn bare(app: App) -> Self {
        Self {
            app,
            processes: None,
            stats: None,
            jdk_env: None,
            droplet: None,
            scan: None,
        }
    }
}

/// The complete report for one scan run: the CF target it ran against plus
/// one [`AppReport`] per app in the space, in listing order.
#[derive(Debug, Clone, Serialize)]
pub struct SpaceReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CfConfig>,
    pub app_details: Vec<AppReport>,
}
