//! REST API and server-rendered view

use crate::store::{LoadReport, RecordStore};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cvbench_common::ViewerError;
use cvbench_view::{
    compose, render_page, render_status_page, BenchmarkRecord, ChartSelection, PageOptions,
    Record, ViewQuery,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    /// Chart defaults for the view page
    pub chart: ChartSelection,
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(view_page))
        .route("/api/health", get(health_check))
        .route("/api/stats", get(data_stats))
        .route("/api/benchmarks", get(list_benchmarks))
        .route("/api/benchmarks/add", post(add_benchmark))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "cvbench-dashboard".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    Json(ApiResponse::success(status))
}

async fn data_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LoadReport>>, StatusCode> {
    match state.store.scan().await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(e) => {
            warn!("Failed to scan data directory: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Bare array of records; clients expect the unwrapped list
async fn list_benchmarks(State(state): State<AppState>) -> Result<Json<Vec<Record>>, StatusCode> {
    match state.store.load().await {
        Ok(records) => {
            debug!("Serving {} records", records.len());
            Ok(Json(records))
        }
        Err(e) => {
            warn!("Failed to load benchmarks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn add_benchmark(
    State(state): State<AppState>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected benchmark body: {}", rejection.body_text());
            return rejected(rejection.body_text());
        }
    };

    let record = match BenchmarkRecord::from_value(body) {
        Ok(record) => record,
        Err(e) => {
            warn!("Invalid benchmark: {}", e);
            return rejected(e.to_string());
        }
    };

    match state.store.append(&record).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(ViewerError::InvalidRecord(message)) => rejected(message),
        Err(e) => {
            warn!("Failed to store benchmark: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(e.to_string())),
            )
                .into_response()
        }
    }
}

fn rejected(message: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

async fn view_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let options = PageOptions::default();
    match state.store.load().await {
        Ok(records) => {
            let view = query.to_view(&state.chart);
            let model = compose(&records, &view);
            Html(render_page(&model, &[], &options)).into_response()
        }
        Err(e) => {
            warn!("Failed to load benchmarks for view: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_status_page(
                    &options.title,
                    cvbench_view::shell::FETCH_FAILED_MESSAGE,
                    true,
                )),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn app(data_dir: &Path) -> Router {
        let state = AppState {
            store: Arc::new(RecordStore::new(data_dir)),
            chart: ChartSelection::default(),
        };
        router(state, &data_dir.join("static"))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/benchmarks/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_body(name: &str) -> String {
        json!({
            "algorithm_name": name,
            "dataset_name": "ICDAR2015",
            "benchmark_run_date": "2024-05-01T12:00:00Z",
            "dataset_details": {"type": "OCR", "image_count": 10},
            "speed_metrics": {"units_per_second": 3.5},
            "accuracy_metrics": {"word_error_rate": 0.2}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempdir().unwrap();
        let (status, body) = send(app(dir.path()), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_list_returns_bare_array() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("runs.json"), r#"[{"algorithm_name": "A"}]"#).unwrap();

        let (status, body) = send(app(dir.path()), get("/api/benchmarks")).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!([{"algorithm_name": "A"}]));
    }

    #[tokio::test]
    async fn test_missing_dir_lists_empty() {
        let dir = tempdir().unwrap();
        let (status, body) = send(app(&dir.path().join("absent")), get("/api/benchmarks")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let dir = tempdir().unwrap();
        let (status, body) = send(app(dir.path()), post_json(&valid_body("NewAlgo"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let stored: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stored["algorithm_name"], json!("NewAlgo"));

        let (_, body) = send(app(dir.path()), get("/api/benchmarks")).await;
        let list: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.as_array().map(Vec::len), Some(1));
        assert_eq!(list[0]["speed_metrics"]["units_per_second"], json!(3.5));
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_bodies() {
        let dir = tempdir().unwrap();
        let (status, _) = send(app(dir.path()), post_json("not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let missing_name = json!({
            "algorithm_name": "",
            "dataset_name": "D",
            "benchmark_run_date": "2024-01-01",
            "dataset_details": {"type": "OCR"}
        });
        let (status, body) = send(app(dir.path()), post_json(&missing_name.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], json!(false));
        assert!(!dir.path().join(crate::store::SUBMISSIONS_FILE).exists());
    }

    #[tokio::test]
    async fn test_view_page_renders_filtered_table() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("runs.json"),
            r#"[{"algorithm_name": "Alpha", "dataset_name": "D1"},
                {"algorithm_name": "Beta", "dataset_name": "D2"}]"#,
        )
        .unwrap();

        let (status, body) = send(app(dir.path()), get("/?algorithm=alp")).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Alpha"));
        assert!(!html.contains("<td>Beta</td>"));
    }

    #[tokio::test]
    async fn test_stats_reports_sources() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{").unwrap();
        let (status, body) = send(app(dir.path()), get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["data"]["source"], json!("empty"));
        assert_eq!(value["data"]["files"][0]["status"], json!("skipped"));
    }
}
