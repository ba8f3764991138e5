//! Benchmark records stored as JSON files in a data directory
//!
//! Every `*.json` file except the default mock file is user data. A file
//! contributes records only if its top-level value is an array; anything
//! else is skipped with a warning. When no user records result, the default
//! mock file is served instead.

use cvbench_common::{Result, ViewerError};
use cvbench_view::{BenchmarkRecord, Record};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_MOCK_FILE: &str = "default_mock_data.json";
pub const SUBMISSIONS_FILE: &str = "submitted_benchmarks.json";

/// Outcome of reading one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Loaded { name: String, records: usize },
    Skipped { name: String, reason: String },
}

/// Where the served records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    User,
    DefaultMock,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: DataSource,
    pub files: Vec<FileStatus>,
    pub records: Vec<Record>,
}

/// File-backed record store
pub struct RecordStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Records to serve
    pub async fn load(&self) -> Result<Vec<Record>> {
        Ok(self.scan().await?.records)
    }

    /// Read the data directory and report on every file
    pub async fn scan(&self) -> Result<LoadReport> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Data directory not found: {}", self.data_dir.display());
                return Ok(LoadReport {
                    source: DataSource::Empty,
                    files: Vec::new(),
                    records: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && name != DEFAULT_MOCK_FILE {
                names.push(name);
            }
        }
        names.sort();
        debug!("Scanning {} user data files in {}", names.len(), self.data_dir.display());

        let mut files = Vec::with_capacity(names.len());
        let mut records = Vec::new();
        for name in names {
            match read_array(&self.data_dir.join(&name)).await {
                Ok(items) => {
                    info!("Loaded {} records from {}", items.len(), name);
                    files.push(FileStatus::Loaded {
                        name,
                        records: items.len(),
                    });
                    records.extend(items);
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", name, reason);
                    files.push(FileStatus::Skipped { name, reason });
                }
            }
        }

        if !records.is_empty() {
            return Ok(LoadReport {
                source: DataSource::User,
                files,
                records,
            });
        }

        let mock_path = self.data_dir.join(DEFAULT_MOCK_FILE);
        if !tokio::fs::try_exists(&mock_path).await.unwrap_or(false) {
            info!("No user data and no {}; serving an empty list", DEFAULT_MOCK_FILE);
            return Ok(LoadReport {
                source: DataSource::Empty,
                files,
                records,
            });
        }

        match read_array(&mock_path).await {
            Ok(items) => {
                info!("No user data; serving {} records from {}", items.len(), DEFAULT_MOCK_FILE);
                files.push(FileStatus::Loaded {
                    name: DEFAULT_MOCK_FILE.to_string(),
                    records: items.len(),
                });
                Ok(LoadReport {
                    source: DataSource::DefaultMock,
                    files,
                    records: items,
                })
            }
            Err(reason) => {
                warn!("Cannot serve {}: {}", DEFAULT_MOCK_FILE, reason);
                files.push(FileStatus::Skipped {
                    name: DEFAULT_MOCK_FILE.to_string(),
                    reason,
                });
                Ok(LoadReport {
                    source: DataSource::Empty,
                    files,
                    records,
                })
            }
        }
    }

    /// Append a validated record to the submissions file and return it as
    /// stored. Concurrent appends are serialised.
    pub async fn append(&self, record: &BenchmarkRecord) -> Result<Record> {
        record.validate()?;
        let value = record.to_value()?;

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let path = self.data_dir.join(SUBMISSIONS_FILE);
        let mut submissions = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Array(items) => items,
                _ => {
                    return Err(ViewerError::Other(format!(
                        "{} does not contain a JSON array",
                        path.display()
                    )))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        submissions.push(value.clone());

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&submissions)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(
            "Stored benchmark for {} on {} ({} submissions)",
            record.algorithm_name,
            record.dataset_name,
            submissions.len()
        );
        Ok(value)
    }

    /// Create the data directory and seed the default mock file. Returns
    /// whether the mock file was written.
    pub async fn init(&self) -> Result<bool> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let mock_path = self.data_dir.join(DEFAULT_MOCK_FILE);
        if tokio::fs::try_exists(&mock_path).await? {
            return Ok(false);
        }
        let content = serde_json::to_vec_pretty(&Value::Array(sample_records()))?;
        tokio::fs::write(&mock_path, content).await?;
        info!("Seeded {}", mock_path.display());
        Ok(true)
    }
}

async fn read_array(path: &Path) -> std::result::Result<Vec<Value>, String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err("top-level value is not a list".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Demo records for a fresh data directory
pub fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "algorithm_name": "Tesseract",
            "algorithm_version": "5.3.0",
            "dataset_name": "ICDAR2015",
            "benchmark_run_date": "2024-01-15T10:30:00Z",
            "dataset_details": {"type": "OCR", "image_count": 500, "description": "Incidental scene text"},
            "execution_environment": {"cpu": "Intel i7-12700K", "ram_gb": 32.0, "os": "Ubuntu 22.04"},
            "speed_metrics": {
                "processing_time_seconds_total": 120.5,
                "processing_time_seconds_per_unit": 0.241,
                "units_per_second": 4.15
            },
            "accuracy_metrics": {
                "character_error_rate": 0.082,
                "word_error_rate": 0.154,
                "exact_match_accuracy": 71.3
            }
        }),
        json!({
            "algorithm_name": "EasyOCR",
            "algorithm_version": "1.7.1",
            "dataset_name": "ICDAR2015",
            "benchmark_run_date": "2024-02-03T14:00:00Z",
            "dataset_details": {"type": "OCR", "image_count": 500},
            "execution_environment": {"cpu": "Intel i7-12700K", "gpu": "RTX 3080", "ram_gb": 32.0, "os": "Ubuntu 22.04"},
            "speed_metrics": {
                "processing_time_seconds_total": 64.0,
                "processing_time_seconds_per_unit": 0.128,
                "units_per_second": 7.81
            },
            "accuracy_metrics": {
                "character_error_rate": 0.061,
                "word_error_rate": 0.119,
                "exact_match_accuracy": 78.9
            }
        }),
        json!({
            "algorithm_name": "OpenCV findChessboardCorners",
            "algorithm_version": "4.9.0",
            "dataset_name": "Calib-Boards-A",
            "benchmark_run_date": "2024-02-20T09:15:00Z",
            "dataset_details": {"type": "Checkerboard", "image_count": 240},
            "execution_environment": {"cpu": "AMD Ryzen 9 7950X", "ram_gb": 64.0, "os": "Fedora 39"},
            "speed_metrics": {
                "processing_time_seconds_total": 18.2,
                "processing_time_seconds_per_unit": 0.076,
                "units_per_second": 13.2
            },
            "accuracy_metrics": {
                "detection_rate": 96.7,
                "average_corner_distance_error_pixels": 0.41,
                "average_reprojection_error_pixels": 0.28
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn record(name: &str) -> BenchmarkRecord {
        BenchmarkRecord::from_value(json!({
            "algorithm_name": name,
            "dataset_name": "D",
            "benchmark_run_date": "2024-01-01",
            "dataset_details": {"type": "OCR"},
            "speed_metrics": {"units_per_second": 1.0}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_files_are_merged() {
        let dir = tempdir().unwrap();
        write(dir.path(), "data1.json", r#"[{"id": 1}]"#);
        write(dir.path(), "data2.json", r#"[{"id": 2}, {"id": 3}]"#);
        write(dir.path(), DEFAULT_MOCK_FILE, r#"[{"id": 99}]"#);
        write(dir.path(), "notes.txt", "ignored");

        let report = RecordStore::new(dir.path()).scan().await.unwrap();
        assert_eq!(report.source, DataSource::User);
        assert_eq!(report.records, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    }

    #[tokio::test]
    async fn test_malformed_and_non_list_files_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", r#"[{"id": 1}]"#);
        write(dir.path(), "b.json", "{'id': 1}");
        write(dir.path(), "c.json", r#"{"id": 2}"#);

        let report = RecordStore::new(dir.path()).scan().await.unwrap();
        assert_eq!(report.records, vec![json!({"id": 1})]);
        let skipped = report
            .files
            .iter()
            .filter(|f| matches!(f, FileStatus::Skipped { .. }))
            .count();
        assert_eq!(skipped, 2);
    }

    #[tokio::test]
    async fn test_default_mock_fallback() {
        let dir = tempdir().unwrap();
        write(dir.path(), "empty.json", "[]");
        write(dir.path(), DEFAULT_MOCK_FILE, r#"[{"id": 99}]"#);

        let report = RecordStore::new(dir.path()).scan().await.unwrap();
        assert_eq!(report.source, DataSource::DefaultMock);
        assert_eq!(report.records, vec![json!({"id": 99})]);
    }

    #[tokio::test]
    async fn test_invalid_mock_and_missing_dir_yield_empty() {
        let dir = tempdir().unwrap();
        write(dir.path(), DEFAULT_MOCK_FILE, r#"{"not": "a list"}"#);
        let store = RecordStore::new(dir.path());
        assert!(store.load().await.unwrap().is_empty());

        let missing = RecordStore::new(dir.path().join("nope"));
        let report = missing.scan().await.unwrap();
        assert_eq!(report.source, DataSource::Empty);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_append_then_load() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.append(&record("A")).await.unwrap();
        store.append(&record("B")).await.unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["algorithm_name"], json!("B"));
        assert!(!dir.path().join("data").join("submitted_benchmarks.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_append_refuses_to_clobber_non_list() {
        let dir = tempdir().unwrap();
        write(dir.path(), SUBMISSIONS_FILE, r#"{"keep": true}"#);
        let store = RecordStore::new(dir.path());
        assert!(store.append(&record("A")).await.is_err());
        let content = std::fs::read_to_string(dir.path().join(SUBMISSIONS_FILE)).unwrap();
        assert!(content.contains("keep"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RecordStore::new(dir.path()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.append(&record(&format!("algo-{i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.load().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_init_seeds_once() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("fresh"));
        assert!(store.init().await.unwrap());
        assert!(!store.init().await.unwrap());

        let report = store.scan().await.unwrap();
        assert_eq!(report.source, DataSource::DefaultMock);
        for value in report.records {
            BenchmarkRecord::from_value(value).unwrap();
        }
    }
}
