//! cvbench: computer-vision benchmark viewer
//!
//! Umbrella crate over the workspace. It re-exports the shared types, the
//! viewer pipeline and the dashboard store, and renders standalone reports
//! straight from a data directory.

pub use cvbench_common as common;
pub use cvbench_dashboard as dashboard;
pub use cvbench_view as view;

pub use cvbench_common::{Result, ViewerConfig, ViewerError};

use chrono::Utc;
use cvbench_dashboard::RecordStore;
use cvbench_view::{compose, render_page, PageOptions, ViewState};
use std::path::Path;
use tracing::info;

/// Commonly used items
pub mod prelude {
    pub use cvbench_common::{Result, ViewerConfig, ViewerError};
    pub use cvbench_view::{
        compose, BenchmarkRecord, BenchmarkSource, ChartSelection, FilterState, Record,
        Session, SortDirection, SortState, ViewModel, ViewState,
    };
}

/// Render a non-interactive HTML report of the records in `data_dir`
pub async fn generate_report(data_dir: &Path, view: &ViewState, title: &str) -> Result<String> {
    let store = RecordStore::new(data_dir);
    let records = store.load().await?;
    let model = compose(&records, view);
    info!(
        "Rendering report for {} of {} records",
        model.shown, model.total
    );
    let options = PageOptions {
        title: title.to_string(),
        generated_at: Some(Utc::now()),
        interactive: false,
        ..PageOptions::default()
    };
    Ok(render_page(&model, &[], &options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvbench_view::ChartSelection;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_report_from_data_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("runs.json"),
            r#"[{"algorithm_name": "Tesseract", "dataset_name": "ICDAR2015",
                 "speed_metrics": {"units_per_second": 4.2}}]"#,
        )
        .unwrap();
        let view = ViewState::default()
            .with_chart(ChartSelection::default().with_metric("speed_metrics.units_per_second"));

        let html = generate_report(dir.path(), &view, "Nightly OCR").await.unwrap();
        assert!(html.contains("<title>Nightly OCR</title>"));
        assert!(html.contains("Tesseract"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("<form"));
    }

    #[tokio::test]
    async fn test_report_for_missing_dir_shows_empty_state() {
        let dir = tempdir().unwrap();
        let html = generate_report(&dir.path().join("none"), &ViewState::default(), "Empty")
            .await
            .unwrap();
        assert!(html.contains(cvbench_view::shell::NO_MATCHES_MESSAGE));
    }
}
