//! Typed benchmark record model
//!
//! The pipeline itself works on dynamic [`Record`](crate::path::Record)
//! values; this model is used where a record is created (the add form) or
//! validated (the submit endpoint).

use cvbench_common::{Result, ViewerError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of dataset a benchmark was run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetType {
    #[serde(rename = "OCR")]
    Ocr,
    Checkerboard,
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetType::Ocr => write!(f, "OCR"),
            DatasetType::Checkerboard => write!(f, "Checkerboard"),
        }
    }
}

impl std::str::FromStr for DatasetType {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ocr" => Ok(DatasetType::Ocr),
            "checkerboard" => Ok(DatasetType::Checkerboard),
            other => Err(ViewerError::InvalidRecord(format!(
                "unknown dataset type '{other}' (expected OCR or Checkerboard)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetails {
    #[serde(rename = "type")]
    pub kind: DatasetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEnvironment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

/// One computed benchmark result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub algorithm_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_version: Option<String>,
    pub dataset_name: String,
    pub benchmark_run_date: String,
    pub dataset_details: DatasetDetails,
    #[serde(default)]
    pub execution_environment: ExecutionEnvironment,
    /// Metric name to value, in insertion order
    #[serde(default)]
    pub speed_metrics: IndexMap<String, f64>,
    #[serde(default)]
    pub accuracy_metrics: IndexMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

impl BenchmarkRecord {
    /// Parse and validate a dynamic record
    pub fn from_value(value: Value) -> Result<Self> {
        let record: Self = serde_json::from_value(value)
            .map_err(|e| ViewerError::InvalidRecord(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Check the fields serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.algorithm_name.trim().is_empty() {
            return Err(ViewerError::InvalidRecord("algorithm_name is required".into()));
        }
        if self.dataset_name.trim().is_empty() {
            return Err(ViewerError::InvalidRecord("dataset_name is required".into()));
        }
        if self.benchmark_run_date.trim().is_empty() {
            return Err(ViewerError::InvalidRecord("benchmark_run_date is required".into()));
        }
        let metrics = self.speed_metrics.iter().chain(self.accuracy_metrics.iter());
        for (name, value) in metrics {
            if !value.is_finite() {
                return Err(ViewerError::InvalidRecord(format!(
                    "metric '{name}' is not a finite number"
                )));
            }
        }
        Ok(())
    }

    /// Convert into the dynamic representation used by the pipeline
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
