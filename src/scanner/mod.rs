//! File-classification and version-detection pipeline.
//!
//! The pipeline walks an extracted app directory and dispatches each file to
//! at most one version scanner:
//!
//! | Scanner | Trigger | Detects |
//! |---------|---------|---------|
//! | [`scan_manifest`] | filename contains `MANIFEST.MF` | build JDK + Spring Boot version |
//! | [`scan_dependency_name`] | `spring-boot-<x>.<y>.*.jar` filename | Spring Boot version |
//! | [`scan_class_file`] | first `.class` file encountered | bytecode Java version |
//!
//! One class file is representative for the whole app, so the class-file
//! scanner runs at most once per walk; the other two run for every match.
//! Buildpack-internal cache artifacts are skipped before classification.

mod classfile;
mod dependency;
mod manifest;

pub use classfile::scan_class_file;
pub use dependency::scan_dependency_name;
pub use manifest::scan_manifest;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::model::{FolderScan, ScannedFile};

/// Spring Boot dependency jars as packaged into a droplet, with the version
/// as the capture group.
pub(crate) static SPRING_BOOT_JAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^spring-boot-(\d\.\d\..*)\.jar$").expect("valid regex"));

/// Path segment used by the Java buildpack for its download cache.
const BUILDPACK_CACHE_SEGMENT: &str = ".java-buildpack";
/// Cache-metadata suffixes written next to cached buildpack downloads.
const CACHE_SUFFIXES: &[&str] = &[".cached", ".etag", ".last_modified"];

/// Scans one extracted app directory.
///
/// Walks the tree recursively, records an inventory entry for every regular
/// application file, and appends the non-null output of each matching
/// version scanner in walk order.
///
/// # Errors
///
/// Returns an error if the walk itself or an inventory read fails; scanner
/// failures on individual files are logged and skipped instead.
pub fn scan_app_folder(dir: &Path) -> Result<FolderScan> {
    let mut scan = FolderScan::default();
    let mut class_scanned = false;

    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_buildpack_cache_artifact(path) {
            continue;
        }

        scan.scanned_files.push(inventory_file(path)?);

        let name = entry.file_name().to_string_lossy();
        if name.contains("MANIFEST.MF") {
            if let Some(result) = scan_manifest(path) {
                scan.results.push(result);
            }
        } else if SPRING_BOOT_JAR.is_match(&name) {
            if let Some(result) = scan_dependency_name(path) {
                scan.results.push(result);
            }
        } else if !class_scanned && name.contains(".class") {
            if let Some(result) = scan_class_file(path) {
                scan.results.push(result);
            }
            class_scanned = true;
        }
    }

    Ok(scan)
}

/// Deployment-infrastructure files the buildpack leaves next to application
/// content; never part of the app itself.
fn is_buildpack_cache_artifact(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    if path_str.contains(BUILDPACK_CACHE_SEGMENT) {
        return true;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    CACHE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn inventory_file(path: &Path) -> Result<ScannedFile> {
    let data =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(ScannedFile {
        file_path: path.display().to_string(),
        length: data.len() as u64,
        checksum: blake3::hash(&data).to_hex().to_string(),
    })
}

pub(crate) fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
