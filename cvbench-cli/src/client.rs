//! HTTP client for the dashboard REST API

use async_trait::async_trait;
use cvbench_common::{ClientConfig, Result, ViewerError};
use cvbench_view::{BenchmarkRecord, BenchmarkSource, Record};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Error body returned by the dashboard
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ViewerError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BenchmarkSource for ApiClient {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let url = self.url("/api/benchmarks");
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ViewerError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::FetchFailed(format!("server returned {status}")));
        }
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| ViewerError::FetchFailed(format!("unexpected response body: {e}")))
    }

    async fn submit(&self, record: &BenchmarkRecord) -> Result<()> {
        let url = self.url("/api/benchmarks/add");
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| ViewerError::SubmitFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("server returned {status}"));
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            Err(ViewerError::InvalidRecord(message))
        } else {
            Err(ViewerError::SubmitFailed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvbench_dashboard::{router, AppState, RecordStore};
    use cvbench_view::{ChartSelection, DatasetType};
    use cvbench_view::record::{DatasetDetails, ExecutionEnvironment};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::net::TcpListener;

    async fn spawn_dashboard(data_dir: &Path) -> String {
        let state = AppState {
            store: Arc::new(RecordStore::new(data_dir)),
            chart: ChartSelection::default(),
        };
        let app = router(state, &data_dir.join("static"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_url: String) -> ApiClient {
        ApiClient::new(&ClientConfig {
            api_url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn record(name: &str) -> BenchmarkRecord {
        BenchmarkRecord {
            algorithm_name: name.to_string(),
            algorithm_version: None,
            dataset_name: "ICDAR2015".to_string(),
            benchmark_run_date: "2024-06-01".to_string(),
            dataset_details: DatasetDetails {
                kind: DatasetType::Ocr,
                image_count: Some(20),
                description: None,
            },
            execution_environment: ExecutionEnvironment::default(),
            speed_metrics: [("units_per_second".to_string(), 9.0)].into_iter().collect(),
            accuracy_metrics: Default::default(),
            additional_notes: None,
        }
    }

    #[tokio::test]
    async fn test_submit_then_fetch_round_trip() {
        let dir = tempdir().unwrap();
        let client = client(spawn_dashboard(dir.path()).await);

        assert!(client.fetch().await.unwrap().is_empty());
        client.submit(&record("Tesseract")).await.unwrap();

        let records = client.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["algorithm_name"], "Tesseract");
    }

    #[tokio::test]
    async fn test_rejected_record_maps_to_invalid_record() {
        let dir = tempdir().unwrap();
        let client = client(spawn_dashboard(dir.path()).await);
        let mut bad = record("x");
        bad.algorithm_name.clear();

        let err = client.submit(&bad).await.unwrap_err();
        assert!(matches!(err, ViewerError::InvalidRecord(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fetch_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/")).fetch().await.unwrap_err();
        assert!(matches!(err, ViewerError::FetchFailed(_)));
    }
}
