use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvbench_common::ViewerConfig;
use cvbench_view::DatasetType;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod terminal;

use commands::{ChartArgs, ChartKind, FilterArgs};

#[derive(Parser)]
#[command(name = "cvbench")]
#[command(about = "Computer-vision benchmark viewer CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dashboard base URL
    #[arg(long, global = true, env = "CVBENCH_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show benchmark records as a table
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Column key to sort by
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List numeric metrics found on the records
    Metrics {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write a chart or full report to a file
    Chart {
        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        chart: ChartArgs,

        /// What to render
        #[arg(short, long, value_enum, default_value = "bar")]
        kind: ChartKind,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Submit a benchmark record
    Add {
        /// JSON file with one record or an array of records
        #[arg(long, conflicts_with = "fields")]
        file: Option<PathBuf>,

        /// Dataset type for form fields (OCR or Checkerboard)
        #[arg(long, default_value = "OCR")]
        dataset_type: DatasetType,

        /// Form field as name=value, e.g. accuracy_metrics.word_error_rate=0.12
        #[arg(short = 'f', long = "field", value_parser = commands::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Redraw the bar view in the terminal, re-fetching periodically
    Watch {
        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        chart: ChartArgs,

        /// Seconds between re-fetches
        #[arg(long, default_value = "10")]
        refresh: u64,
    },
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config =
        ViewerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.client.api_url = url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.client.timeout_secs = timeout;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let session = commands::open_session(&config)?;

    match cli.command {
        Commands::List {
            filters,
            sort,
            desc,
            json,
        } => commands::list(&session, &filters, sort, desc, json).await,
        Commands::Metrics { filters } => commands::metrics(&session, &filters).await,
        Commands::Chart {
            filters,
            chart,
            kind,
            output,
        } => commands::chart(&session, &filters, &chart, kind, &output).await,
        Commands::Add {
            file,
            dataset_type,
            fields,
        } => commands::add(&session, file, dataset_type, &fields).await,
        Commands::Watch {
            filters,
            chart,
            refresh,
        } => commands::watch(&session, &config, &filters, &chart, refresh).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
