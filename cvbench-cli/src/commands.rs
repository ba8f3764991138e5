//! Command implementations

use crate::client::ApiClient;
use crate::terminal::TerminalBackend;
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use cvbench_common::ViewerConfig;
use cvbench_view::{
    bar_chart_svg, line_chart_svg, render_page, BenchmarkDraft, BenchmarkRecord, ChartSelection,
    DatasetType, FilterState, LoadState, PageOptions, RenderLoop, Session, SortDirection,
    SortState, TableView, ViewModel,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{info, warn};

/// Substring filters shared by the read commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep records whose algorithm name contains this text
    #[arg(long)]
    pub algorithm: Option<String>,

    /// Keep records whose dataset name contains this text
    #[arg(long)]
    pub dataset: Option<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> FilterState {
        FilterState::new(
            self.algorithm.clone().unwrap_or_default(),
            self.dataset.clone().unwrap_or_default(),
        )
    }
}

/// Chart key overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ChartArgs {
    /// Metric path, e.g. speed_metrics.units_per_second
    #[arg(short, long)]
    pub metric: String,

    /// Category key of the bar view
    #[arg(long)]
    pub category: Option<String>,

    /// X-axis key of the line view
    #[arg(long)]
    pub x_axis: Option<String>,

    /// Series key of the line view
    #[arg(long)]
    pub series: Option<String>,
}

impl ChartArgs {
    pub fn to_selection(&self, defaults: &ChartSelection) -> ChartSelection {
        let mut chart = defaults.with_metric(self.metric.clone());
        if let Some(key) = &self.category {
            chart.category_key = key.clone();
        }
        if let Some(key) = &self.x_axis {
            chart.x_axis_key = key.clone();
        }
        if let Some(key) = &self.series {
            chart.series_key = key.clone();
        }
        chart
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// 3D bar view over categories
    Bar,
    /// Line view over the x-axis key
    Line,
    /// Full HTML report with table and both charts
    Html,
}

pub fn open_session(config: &ViewerConfig) -> Result<Session<ApiClient>> {
    let client = ApiClient::new(&config.client).context("Failed to create API client")?;
    info!("Using dashboard at {}", client.base_url());
    Ok(Session::new(client, ChartSelection::from_config(&config.chart)))
}

async fn ready_model(session: &Session<ApiClient>) -> Result<ViewModel> {
    session.refresh().await?;
    match session.render().await {
        Some(model) => Ok(model),
        None => match session.load_state().await {
            LoadState::Failed(message) => bail!(message),
            other => bail!("session not ready: {:?}", other),
        },
    }
}

pub fn render_table(table: &TableView) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().map(|header| header.label()));
    for row in &table.rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::rounded()).to_string()
}

pub async fn list(
    session: &Session<ApiClient>,
    filters: &FilterArgs,
    sort: Option<String>,
    descending: bool,
    json: bool,
) -> Result<()> {
    let filters = filters.to_filters();
    session
        .update_view(|view| {
            let mut next = view.with_filters(filters);
            if let Some(key) = sort {
                next.sort = SortState {
                    key,
                    direction: if descending {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    },
                };
            }
            next
        })
        .await;
    let model = ready_model(session).await?;

    if json {
        let rows: Vec<Value> = model
            .table
            .rows
            .iter()
            .map(|row| {
                model
                    .table
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| (header.key.to_string(), Value::String(cell.clone())))
                    .collect::<serde_json::Map<_, _>>()
                    .into()
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if model.is_empty() {
        println!("{}", cvbench_view::shell::NO_MATCHES_MESSAGE.yellow());
        return Ok(());
    }
    println!("{}", render_table(&model.table));
    println!("Showing {} of {} records", model.shown, model.total);
    Ok(())
}

pub async fn metrics(session: &Session<ApiClient>, filters: &FilterArgs) -> Result<()> {
    session.set_filters(filters.to_filters()).await;
    let model = ready_model(session).await?;
    if model.metrics.is_empty() {
        println!("{}", "No numeric metrics found.".yellow());
        return Ok(());
    }
    println!("Available metrics:");
    println!("==================");
    for metric in &model.metrics {
        println!("  {}", metric);
    }
    Ok(())
}

/// Document for `kind`
pub fn chart_document(model: &ViewModel, kind: ChartKind) -> String {
    match kind {
        ChartKind::Bar => bar_chart_svg(model),
        ChartKind::Line => line_chart_svg(model),
        ChartKind::Html => render_page(
            model,
            &[],
            &PageOptions {
                generated_at: Some(chrono::Utc::now()),
                interactive: false,
                ..PageOptions::default()
            },
        ),
    }
}

pub async fn chart(
    session: &Session<ApiClient>,
    filters: &FilterArgs,
    chart: &ChartArgs,
    kind: ChartKind,
    output: &Path,
) -> Result<()> {
    let filters = filters.to_filters();
    session
        .update_view(|view| {
            let selection = chart.to_selection(&view.chart);
            view.with_filters(filters).with_chart(selection)
        })
        .await;
    let model = ready_model(session).await?;
    if !model.metrics.iter().any(|metric| metric == &chart.metric) {
        warn!("Metric {} not found on the visible records", chart.metric);
    }

    let document = chart_document(&model, kind);
    tokio::fs::write(output, document)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{} {}", "Chart written to".green(), output.display());
    Ok(())
}

/// Records from a JSON file holding one object or an array of objects
pub fn records_from_file(content: &str) -> Result<Vec<BenchmarkRecord>> {
    let value: Value = serde_json::from_str(content).context("File is not valid JSON")?;
    let values = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            BenchmarkRecord::from_value(value).with_context(|| format!("Record {} is invalid", index + 1))
        })
        .collect()
}

/// Draft from `key=value` form fields
pub fn draft_from_fields(dataset_type: DatasetType, fields: &[(String, String)]) -> Result<BenchmarkDraft> {
    let mut draft = BenchmarkDraft::new(dataset_type);
    for (name, value) in fields {
        draft.set_field(name, value.clone())?;
    }
    Ok(draft)
}

pub fn parse_field(text: &str) -> std::result::Result<(String, String), String> {
    text.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{text}'"))
}

pub async fn add(
    session: &Session<ApiClient>,
    file: Option<PathBuf>,
    dataset_type: DatasetType,
    fields: &[(String, String)],
) -> Result<()> {
    let outcome = match file {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let records = records_from_file(&content)?;
            let mut submitted = 0;
            for record in records {
                session.submit(record).await?;
                submitted += 1;
            }
            Ok(submitted)
        }
        None => session
            .submit_draft(draft_from_fields(dataset_type, fields)?)
            .await
            .map(|_| 1),
    };

    match outcome {
        Ok(count) => {
            println!("{} {} benchmark(s) submitted", "✓".green(), count);
            Ok(())
        }
        Err(e) => {
            for notice in session.notices().await {
                eprintln!("{} {}", "✗".red(), notice.message);
            }
            Err(e.into())
        }
    }
}

pub async fn watch(
    session: &Session<ApiClient>,
    config: &ViewerConfig,
    filters: &FilterArgs,
    chart: &ChartArgs,
    refresh_secs: u64,
) -> Result<()> {
    let filters = filters.to_filters();
    session
        .update_view(|view| {
            let selection = chart.to_selection(&view.chart);
            view.with_filters(filters).with_chart(selection)
        })
        .await;

    let redraw = Duration::from_millis(config.chart.redraw_interval_ms.max(1));
    let mut render = RenderLoop::new(TerminalBackend::stdout(""), redraw);
    let mut refresh = tokio::time::interval(Duration::from_secs(refresh_secs.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = refresh.tick() => {
                if let Err(e) = session.refresh().await {
                    warn!("Refresh failed: {}", e);
                }
                let model = session.render().await;
                let bars = model.as_ref().and_then(|model| model.bars.as_ref());
                if let Some(projection) = bars {
                    let shared = render.backend();
                    let mut backend = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    backend.set_title(projection.title.clone());
                }
                render.restart(bars).await;
            }
        }
    }

    render.stop().await;
    info!("Watch stopped");
    Ok(())
}
