//! cvbench dashboard server
//!
//! Serves benchmark records from a directory of JSON files together with
//! the server-rendered viewer page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvbench_common::ViewerConfig;
use cvbench_dashboard::{DataSource, FileStatus, RecordStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cvbench-dashboard")]
#[command(about = "Computer-vision benchmark dashboard server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory holding benchmark JSON files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Static files directory
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable development mode (more verbose logging)
    #[arg(long)]
    dev: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve,
    /// Create the data directory and seed default mock data
    Init,
    /// Show what the data directory contains
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.dev { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config =
        ViewerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(dir) = cli.data_dir {
        config.server.data_dir = dir;
    }
    if let Some(dir) = cli.static_dir {
        config.server.static_dir = dir;
    }

    match cli.command {
        Some(Commands::Serve) | None => cvbench_dashboard::serve(&config).await,
        Some(Commands::Init) => {
            let store = RecordStore::new(&config.server.data_dir);
            let seeded = store
                .init()
                .await
                .context("Failed to initialize data directory")?;
            if seeded {
                info!("Data directory initialized at: {}", store.data_dir().display());
            } else {
                info!("Data directory already initialized: {}", store.data_dir().display());
            }
            Ok(())
        }
        Some(Commands::Stats) => show_stats(&RecordStore::new(&config.server.data_dir)).await,
    }
}

async fn show_stats(store: &RecordStore) -> Result<()> {
    let report = store.scan().await.context("Failed to scan data directory")?;

    println!("Data Directory Statistics:");
    println!("==========================");
    println!("directory: {}", store.data_dir().display());
    let source = match report.source {
        DataSource::User => "user data",
        DataSource::DefaultMock => "default mock data",
        DataSource::Empty => "nothing (empty list)",
    };
    println!("serving: {}", source);
    println!("records: {}", report.records.len());

    println!("\nFiles:");
    println!("======");
    for file in &report.files {
        match file {
            FileStatus::Loaded { name, records } => println!("{}: {} records", name, records),
            FileStatus::Skipped { name, reason } => println!("{}: skipped ({})", name, reason),
        }
    }
    Ok(())
}
