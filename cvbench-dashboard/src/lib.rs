//! Dashboard server for computer-vision benchmark records
//!
//! Serves the records in a data directory over a small REST API and renders
//! the viewer page server-side.

pub mod api;
pub mod store;

pub use api::{router, ApiResponse, AppState};
pub use store::{DataSource, FileStatus, LoadReport, RecordStore};

use anyhow::{Context, Result};
use cvbench_common::ViewerConfig;
use cvbench_view::ChartSelection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Bind and serve until the process is stopped
pub async fn serve(config: &ViewerConfig) -> Result<()> {
    let server = &config.server;
    let state = AppState {
        store: Arc::new(RecordStore::new(&server.data_dir)),
        chart: ChartSelection::from_config(&config.chart),
    };
    let app = router(state, &server.static_dir);

    info!("Starting benchmark dashboard server on {}", server.bind);
    info!("Data directory: {}", server.data_dir.display());
    info!("Static files served from: {}", server.static_dir.display());

    let listener = TcpListener::bind(&server.bind)
        .await
        .context("Failed to bind server")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
