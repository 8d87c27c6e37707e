//! Core data types for the Cloud Foundry API and scan reports.
//!
//! This module contains the fundamental types used throughout dropletscan:
//!
//! - [`App`], [`ProcessInfo`], [`ProcessStats`], [`Droplet`] - resources
//!   decoded from the CF v3 API
//! - [`Paginated`] - the paging seam used by the API client
//! - [`CfConfig`] - the operator's CF CLI target from `~/.cf/config.json`
//! - [`AppReport`], [`ScanResult`], [`SpaceReport`] - the report shapes
//!   produced by a scan run

mod cf;
mod report;

pub use cf::*;
pub use report::*;
