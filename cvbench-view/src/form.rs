//! Add-benchmark form model
//!
//! A [`BenchmarkDraft`] holds every field as entered text. Switching the
//! dataset type swaps the metric templates; [`BenchmarkDraft::into_record`]
//! does the numeric conversion and validation.

use crate::record::{BenchmarkRecord, DatasetDetails, DatasetType, ExecutionEnvironment};
use cvbench_common::{Result, ViewerError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const SHARED_SPEED_METRICS: [&str; 3] = [
    "processing_time_seconds_total",
    "processing_time_seconds_per_unit",
    "units_per_second",
];
const OCR_ACCURACY_METRICS: [&str; 3] = [
    "character_error_rate",
    "word_error_rate",
    "exact_match_accuracy",
];
const CHECKERBOARD_ACCURACY_METRICS: [&str; 3] = [
    "detection_rate",
    "average_corner_distance_error_pixels",
    "average_reprojection_error_pixels",
];

pub fn speed_template(_kind: DatasetType) -> &'static [&'static str] {
    &SHARED_SPEED_METRICS
}

pub fn accuracy_template(kind: DatasetType) -> &'static [&'static str] {
    match kind {
        DatasetType::Ocr => &OCR_ACCURACY_METRICS,
        DatasetType::Checkerboard => &CHECKERBOARD_ACCURACY_METRICS,
    }
}

fn blank_metrics(names: &[&str]) -> IndexMap<String, String> {
    names.iter().map(|name| (name.to_string(), String::new())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkDraft {
    pub dataset_type: DatasetType,
    pub algorithm_name: String,
    pub algorithm_version: String,
    pub dataset_name: String,
    pub benchmark_run_date: String,
    pub image_count: String,
    pub description: String,
    pub cpu: String,
    pub gpu: String,
    pub ram_gb: String,
    pub os: String,
    pub speed_metrics: IndexMap<String, String>,
    pub accuracy_metrics: IndexMap<String, String>,
    pub additional_notes: String,
}

impl Default for BenchmarkDraft {
    fn default() -> Self {
        Self::new(DatasetType::Ocr)
    }
}

impl BenchmarkDraft {
    pub fn new(dataset_type: DatasetType) -> Self {
        Self {
            dataset_type,
            algorithm_name: String::new(),
            algorithm_version: String::new(),
            dataset_name: String::new(),
            benchmark_run_date: String::new(),
            image_count: String::new(),
            description: String::new(),
            cpu: String::new(),
            gpu: String::new(),
            ram_gb: String::new(),
            os: String::new(),
            speed_metrics: blank_metrics(speed_template(dataset_type)),
            accuracy_metrics: blank_metrics(accuracy_template(dataset_type)),
            additional_notes: String::new(),
        }
    }

    /// Switch dataset type; metric fields are reset to the new templates
    pub fn set_dataset_type(&mut self, dataset_type: DatasetType) {
        self.dataset_type = dataset_type;
        self.speed_metrics = blank_metrics(speed_template(dataset_type));
        self.accuracy_metrics = blank_metrics(accuracy_template(dataset_type));
    }

    /// Set a field by its dotted form name, e.g. `execution_environment.cpu`
    /// or `accuracy_metrics.word_error_rate`
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let slot = match name {
            "dataset_type" | "dataset_details.type" => {
                let kind = value.parse()?;
                self.set_dataset_type(kind);
                return Ok(());
            }
            "algorithm_name" => &mut self.algorithm_name,
            "algorithm_version" => &mut self.algorithm_version,
            "dataset_name" => &mut self.dataset_name,
            "benchmark_run_date" => &mut self.benchmark_run_date,
            "dataset_details.image_count" => &mut self.image_count,
            "dataset_details.description" => &mut self.description,
            "execution_environment.cpu" => &mut self.cpu,
            "execution_environment.gpu" => &mut self.gpu,
            "execution_environment.ram_gb" => &mut self.ram_gb,
            "execution_environment.os" => &mut self.os,
            "additional_notes" => &mut self.additional_notes,
            other => {
                if let Some(metric) = other.strip_prefix("speed_metrics.") {
                    self.speed_metrics.entry(metric.to_string()).or_default()
                } else if let Some(metric) = other.strip_prefix("accuracy_metrics.") {
                    self.accuracy_metrics.entry(metric.to_string()).or_default()
                } else {
                    return Err(ViewerError::InvalidRecord(format!("unknown form field '{other}'")));
                }
            }
        };
        *slot = value;
        Ok(())
    }

    /// Convert entered text into a validated record. Empty fields are
    /// omitted; a field that is filled in but not a number is an error.
    pub fn into_record(self) -> Result<BenchmarkRecord> {
        let record = BenchmarkRecord {
            algorithm_name: self.algorithm_name.trim().to_string(),
            algorithm_version: non_empty(self.algorithm_version),
            dataset_name: self.dataset_name.trim().to_string(),
            benchmark_run_date: self.benchmark_run_date.trim().to_string(),
            dataset_details: DatasetDetails {
                kind: self.dataset_type,
                image_count: parse_optional("dataset_details.image_count", &self.image_count)?,
                description: non_empty(self.description),
            },
            execution_environment: ExecutionEnvironment {
                cpu: non_empty(self.cpu),
                gpu: non_empty(self.gpu),
                ram_gb: parse_optional("execution_environment.ram_gb", &self.ram_gb)?,
                os: non_empty(self.os),
            },
            speed_metrics: parse_metrics("speed_metrics", &self.speed_metrics)?,
            accuracy_metrics: parse_metrics("accuracy_metrics", &self.accuracy_metrics)?,
            additional_notes: non_empty(self.additional_notes),
        };
        record.validate()?;
        Ok(record)
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_optional<T: std::str::FromStr>(field: &str, text: &str) -> Result<Option<T>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| ViewerError::InvalidRecord(format!("{field}: '{text}' is not a valid number")))
}

fn parse_metrics(container: &str, fields: &IndexMap<String, String>) -> Result<IndexMap<String, f64>> {
    let mut metrics = IndexMap::new();
    for (name, text) in fields {
        if let Some(value) = parse_optional::<f64>(&format!("{container}.{name}"), text)? {
            metrics.insert(name.clone(), value);
        }
    }
    Ok(metrics)
}
