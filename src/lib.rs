pub mod api;
pub mod collector;
pub mod config;
pub mod droplet;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod scanner;

pub use api::{CfApiClient, PageSource};
pub use collector::{AppDetailCollector, Collector};
pub use config::Config;
pub use droplet::DropletRetriever;
pub use model::{App, AppReport, CfConfig, Droplet, ScanResult, SpaceReport};
pub use orchestrator::ScanOrchestrator;
