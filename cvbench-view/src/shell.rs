//! Session state and the view model built from it
//!
//! A [`Session`] owns the record set for one viewer session together with
//! the current [`ViewState`], load status and pending notices. Everything it
//! shows is produced by [`compose`], which is pure.

use crate::aggregate::{aggregate_categories, aggregate_series};
use crate::discovery::{discover, reconcile};
use crate::engine;
use crate::form::BenchmarkDraft;
use crate::path::Record;
use crate::projection::{project_bars, project_lines, BarProjection, LineProjection};
use crate::record::BenchmarkRecord;
use crate::state::{ChartSelection, FilterState, ViewState};
use crate::table::{build_table, TableView};
use async_trait::async_trait;
use cvbench_common::{Result, ViewerError};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub const LOADING_MESSAGE: &str = "Loading benchmark data...";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load benchmark data. Please try again later.";
pub const NO_MATCHES_MESSAGE: &str = "No data matches your current filters, or no data is available.";

/// Where records come from and where new ones go
#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>>;

    async fn submit(&self, record: &BenchmarkRecord) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Ready,
    /// Blocking: no stale records are shown alongside it
    Failed(String),
}

/// Dismissible, non-blocking message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

/// Everything needed to draw one frame of the viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub view: ViewState,
    /// Metrics discovered on the visible records
    pub metrics: Vec<String>,
    pub table: TableView,
    pub bars: Option<BarProjection>,
    pub lines: Option<LineProjection>,
    pub shown: usize,
    pub total: usize,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.shown == 0
    }
}

/// Filter and sort `records`, discover metrics on the result, reconcile the
/// chart selection and project both charts
pub fn compose(records: &[Record], view: &ViewState) -> ViewModel {
    let visible = engine::apply(records, view);
    let metrics = discover(&visible);
    let chart = reconcile(&view.chart, &metrics);
    let view = view.with_chart(chart);

    let (bars, lines) = match view.chart.metric.as_deref() {
        Some(metric) if !visible.is_empty() => {
            let categories = aggregate_categories(&visible, &view.chart.category_key, metric);
            let series = aggregate_series(
                &visible,
                &view.chart.x_axis_key,
                &view.chart.series_key,
                metric,
            );
            (Some(project_bars(&categories)), Some(project_lines(&series)))
        }
        _ => (None, None),
    };

    ViewModel {
        table: build_table(&visible, &view.sort),
        shown: visible.len(),
        total: records.len(),
        view,
        metrics,
        bars,
        lines,
    }
}

#[derive(Debug)]
struct SessionState {
    records: Vec<Record>,
    view: ViewState,
    load: LoadState,
    notices: Vec<Notice>,
    next_notice: u64,
}

impl SessionState {
    fn push_notice(&mut self, message: String) -> u64 {
        self.next_notice += 1;
        self.notices.push(Notice {
            id: self.next_notice,
            message,
        });
        self.next_notice
    }
}

/// One viewer session over a [`BenchmarkSource`]
pub struct Session<S: BenchmarkSource> {
    source: S,
    fetch_lock: Mutex<()>,
    state: RwLock<SessionState>,
}

impl<S: BenchmarkSource> Session<S> {
    pub fn new(source: S, chart: ChartSelection) -> Self {
        Self {
            source,
            fetch_lock: Mutex::new(()),
            state: RwLock::new(SessionState {
                records: Vec::new(),
                view: ViewState::default().with_chart(chart),
                load: LoadState::Loading,
                notices: Vec::new(),
                next_notice: 0,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Re-fetch the record set. Fetches are serialised; the latest completed
    /// fetch wins. On failure the records are dropped and the session shows
    /// the blocking error.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.fetch_lock.lock().await;
        self.state.write().await.load = LoadState::Loading;

        match self.source.fetch().await {
            Ok(records) => {
                let count = records.len();
                let mut state = self.state.write().await;
                state.records = records;
                state.load = LoadState::Ready;
                info!("Loaded {} benchmark records", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Benchmark fetch failed: {}", e);
                let mut state = self.state.write().await;
                state.records.clear();
                state.load = LoadState::Failed(FETCH_FAILED_MESSAGE.to_string());
                Err(ViewerError::FetchFailed(e.to_string()))
            }
        }
    }

    /// Submit a record, re-fetching on success. A failure leaves the record
    /// set untouched and stores a notice.
    pub async fn submit(&self, record: BenchmarkRecord) -> Result<()> {
        if let Err(e) = record.validate() {
            self.state.write().await.push_notice(e.to_string());
            return Err(e);
        }

        if let Err(e) = self.source.submit(&record).await {
            warn!("Benchmark submission failed: {}", e);
            let error = match e {
                ViewerError::SubmitFailed(_) | ViewerError::InvalidRecord(_) => e,
                other => ViewerError::SubmitFailed(other.to_string()),
            };
            self.state.write().await.push_notice(error.to_string());
            return Err(error);
        }

        info!(
            "Submitted benchmark for {} on {}",
            record.algorithm_name, record.dataset_name
        );
        self.refresh().await.map(|_| ())
    }

    pub async fn submit_draft(&self, draft: BenchmarkDraft) -> Result<()> {
        match draft.into_record() {
            Ok(record) => self.submit(record).await,
            Err(e) => {
                self.state.write().await.push_notice(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the view state with `update(current)`
    pub async fn update_view<F>(&self, update: F) -> ViewState
    where
        F: FnOnce(&ViewState) -> ViewState,
    {
        let mut state = self.state.write().await;
        state.view = update(&state.view);
        debug!("View state replaced: {:?}", state.view);
        state.view.clone()
    }

    pub async fn set_filters(&self, filters: FilterState) -> ViewState {
        self.update_view(|view| view.with_filters(filters)).await
    }

    pub async fn toggle_sort(&self, key: &str) -> ViewState {
        self.update_view(|view| view.toggled_sort(key)).await
    }

    pub async fn select_chart(&self, chart: ChartSelection) -> ViewState {
        self.update_view(|view| view.with_chart(chart)).await
    }

    pub async fn view(&self) -> ViewState {
        self.state.read().await.view.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.read().await.load.clone()
    }

    pub async fn records(&self) -> Vec<Record> {
        self.state.read().await.records.clone()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.state.read().await.notices.clone()
    }

    /// Remove a notice; returns whether it existed
    pub async fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.write().await;
        let before = state.notices.len();
        state.notices.retain(|notice| notice.id != id);
        state.notices.len() != before
    }

    /// The current view model, or `None` unless the session is ready.
    /// A chart selection reconciled against the visible metrics replaces the
    /// stored one.
    pub async fn render(&self) -> Option<ViewModel> {
        let mut state = self.state.write().await;
        if state.load != LoadState::Ready {
            return None;
        }
        let model = compose(&state.records, &state.view);
        if model.view.chart != state.view.chart {
            debug!(
                "Chart metric reconciled: {:?} -> {:?}",
                state.view.chart.metric, model.view.chart.metric
            );
            state.view.chart = model.view.chart.clone();
        }
        Some(model)
    }
}
