use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dropletscan::{
    api::CfApiClient,
    collector::AppDetailCollector,
    config::Config,
    droplet::DropletRetriever,
    model::{CfConfig, SpaceReport},
    orchestrator::ScanOrchestrator,
    output::{format_report_to_string, print_report, OutputFormat},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dropletscan")]
#[command(
    author,
    version,
    about = "Audit Java and Spring Boot versions across a Cloud Foundry space"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all apps in a space
    Scan {
        /// Space guid to scan (defaults to the targeted space in ~/.cf/config.json)
        space: Option<String>,

        /// Output format (json, table)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Number of apps scanned concurrently
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Scan previously extracted droplets instead of downloading
        #[arg(long)]
        no_download: bool,

        /// Keep tarballs and extraction directories after scanning
        #[arg(long)]
        keep_droplets: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Reports go to stdout; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            space,
            format,
            output,
            parallel,
            no_download,
            keep_droplets,
        } => {
            let format_str = format.unwrap_or(config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

            let mut config = config;
            if let Some(parallel) = parallel {
                config.scanned_apps_in_parallel = parallel;
            }
            if no_download {
                config.download_droplets = false;
            }
            if keep_droplets {
                config.cleanup_droplets = false;
            }

            run_scan(space, config, format, output).await
        }
        Commands::Config { init, path } => handle_config(init, path),
    }
}

async fn run_scan(
    space: Option<String>,
    config: Config,
    format: OutputFormat,
    output_file: Option<String>,
) -> Result<()> {
    let cf_config = load_cf_config();
    let space_guid = match space {
        Some(guid) => guid,
        None => cf_config
            .as_ref()
            .map(|c| c.space_fields.guid.clone())
            .context("no space guid given and no targeted space in ~/.cf/config.json")?,
    };

    let api = CfApiClient::new();
    let retriever = DropletRetriever::new(
        config.droplets_tmp_folder.clone(),
        config.download_droplets,
    );
    let collector = AppDetailCollector::new(api.clone(), retriever, config.cleanup_droplets);
    let mut orchestrator = ScanOrchestrator::new(
        api,
        Arc::new(collector),
        config.scanned_apps_in_parallel,
    );

    let is_interactive = format == OutputFormat::Table && output_file.is_none();
    if is_interactive {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Scanning apps...")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        orchestrator = orchestrator.with_progress(pb);
    }

    let app_details = orchestrator.run(&space_guid).await?;
    let report = SpaceReport {
        config: cf_config,
        app_details,
    };

    if let Some(path) = output_file {
        let rendered = format_report_to_string(&report, format)?;
        std::fs::write(&path, rendered)
            .with_context(|| format!("failed to write report to {path}"))?;
        println!("Report written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    Ok(())
}

fn load_cf_config() -> Option<CfConfig> {
    let path = CfConfig::default_path();
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not parse cf config");
            None
        }
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'dropletscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
