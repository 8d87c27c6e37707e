use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

use crate::model::{ScanResult, ScannerKind};

// Line-anchored manifest attributes. `Build-Jdk` appears both bare and as
// `Build-Jdk-Spec` depending on the Maven plugin that wrote the manifest.
static BUILD_JDK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Build-Jdk.*: (.*)$").expect("valid regex"));
static SPRING_BOOT_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Spring-Boot-Version: (.*)$").expect("valid regex"));

/// Scans a `MANIFEST.MF` file for build JDK and Spring Boot version
/// attributes. Either may remain absent; an unreadable file yields `None`.
pub fn scan_manifest(path: &Path) -> Option<ScanResult> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed to open manifest");
            return None;
        }
    };

    let mut java_version: Option<String> = None;
    let mut spring_boot_version: Option<String> = None;

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to read manifest");
                return None;
            }
        };
        if java_version.is_some() && spring_boot_version.is_some() {
            break;
        }
        java_version = capture(&BUILD_JDK, &line).or(java_version);
        spring_boot_version = capture(&SPRING_BOOT_VERSION, &line).or(spring_boot_version);
    }

    Some(ScanResult {
        file_name: super::display_file_name(path),
        scanner: ScannerKind::Manifest,
        java_version,
        spring_boot_version,
    })
}

fn capture(regex: &Regex, line: &str) -> Option<String> {
    regex
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
