//! Configuration file handling.
//!
//! This module provides loading and saving of dropletscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/dropletscan/config.toml`
//! - macOS: `~/Library/Application Support/dropletscan/config.toml`
//! - Windows: `%APPDATA%\dropletscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! droplets_tmp_folder = "/tmp/dropletscan"
//! download_droplets = true
//! cleanup_droplets = true
//! scanned_apps_in_parallel = 4
//! default_format = "json"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// This struct represents all configurable options for dropletscan.
/// It can be loaded from a TOML file or created with default values;
/// CLI flags override individual fields after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for downloaded tarballs and extraction directories.
    ///
    /// All per-droplet paths are derived deterministically from the droplet
    /// guid under this directory.
    pub droplets_tmp_folder: PathBuf,

    /// Whether to download and extract droplets before scanning.
    ///
    /// When false, the scan runs against whatever a previous run left under
    /// `droplets_tmp_folder`.
    pub download_droplets: bool,

    /// Whether to delete the tarball and extraction directory after each
    /// app's scan, regardless of scan outcome.
    pub cleanup_droplets: bool,

    /// Number of apps scanned concurrently (the admission-gate permit
    /// count). Each in-flight app may hold a subprocess and disk I/O.
    pub scanned_apps_in_parallel: usize,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "json", "table"
    pub default_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            droplets_tmp_folder: std::env::temp_dir().join("dropletscan"),
            download_droplets: true,
            cleanup_droplets: true,
            scanned_apps_in_parallel: 4,
            default_format: "json".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dropletscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
