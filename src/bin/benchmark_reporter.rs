//! Offline HTML report generator
//!
//! Reads a benchmark data directory the same way the dashboard does and
//! writes a standalone page with the table and both charts.

use anyhow::{Context, Result};
use clap::Parser;
use cvbench::view::{ChartSelection, ViewQuery};
use cvbench::ViewerConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "benchmark_reporter")]
#[command(about = "Render a standalone HTML report from a benchmark data directory")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding benchmark JSON files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "benchmark_report.html")]
    output: PathBuf,

    /// Report title
    #[arg(long, default_value = "Computer Vision Algorithm Benchmarks")]
    title: String,

    /// Metric to chart, e.g. speed_metrics.units_per_second
    #[arg(short, long)]
    metric: Option<String>,

    /// Keep records whose algorithm name contains this text
    #[arg(long)]
    algorithm: Option<String>,

    /// Keep records whose dataset name contains this text
    #[arg(long)]
    dataset: Option<String>,

    /// Column key to sort by
    #[arg(long)]
    sort: Option<String>,

    /// Sort direction (asc or desc)
    #[arg(long)]
    dir: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config =
        ViewerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let data_dir = cli.data_dir.unwrap_or(config.server.data_dir);

    let query = ViewQuery {
        algorithm: cli.algorithm,
        dataset: cli.dataset,
        sort: cli.sort,
        dir: cli.dir,
        metric: cli.metric,
        ..ViewQuery::default()
    };
    let view = query.to_view(&ChartSelection::from_config(&config.chart));

    let html = cvbench::generate_report(&data_dir, &view, &cli.title)
        .await
        .with_context(|| format!("Failed to read {}", data_dir.display()))?;
    tokio::fs::write(&cli.output, html)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    info!("Report written to {}", cli.output.display());
    Ok(())
}
