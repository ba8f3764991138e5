//! Table view model: fixed columns, display cells and sort indicators

use crate::path::{display, get_present, Record};
use crate::state::{SortDirection, SortState};
use serde::Serialize;

/// Cell text for a missing or null value
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
}

pub const COLUMNS: [Column; 12] = [
    Column { key: "algorithm_name", header: "Algorithm" },
    Column { key: "algorithm_version", header: "Version" },
    Column { key: "dataset_name", header: "Dataset" },
    Column { key: "benchmark_run_date", header: "Run Date" },
    Column { key: "speed_metrics.processing_time_seconds_total", header: "Total Time (s)" },
    Column { key: "speed_metrics.processing_time_seconds_per_unit", header: "Time/Unit (s)" },
    Column { key: "speed_metrics.units_per_second", header: "Units/s" },
    Column { key: "accuracy_metrics.character_error_rate", header: "CER" },
    Column { key: "accuracy_metrics.word_error_rate", header: "WER" },
    Column { key: "accuracy_metrics.exact_match_accuracy", header: "Exact Match %" },
    Column { key: "accuracy_metrics.detection_rate", header: "Detection Rate %" },
    Column { key: "accuracy_metrics.average_corner_distance_error_pixels", header: "Avg Corner Error (px)" },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub key: &'static str,
    pub text: &'static str,
    /// Set on the column the rows are sorted by
    pub sorted: Option<SortDirection>,
}

impl HeaderCell {
    pub fn indicator(&self) -> &'static str {
        match self.sorted {
            Some(SortDirection::Ascending) => " ▲",
            Some(SortDirection::Descending) => " ▼",
            None => "",
        }
    }

    pub fn label(&self) -> String {
        format!("{}{}", self.text, self.indicator())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn cell(record: &Record, key: &str) -> String {
    get_present(record, key)
        .map(display)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Build the table for already filtered and sorted `records`
pub fn build_table(records: &[&Record], sort: &SortState) -> TableView {
    let headers = COLUMNS
        .iter()
        .map(|column| HeaderCell {
            key: column.key,
            text: column.header,
            sorted: (column.key == sort.key).then_some(sort.direction),
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| COLUMNS.iter().map(|column| cell(record, column.key)).collect())
        .collect();

    TableView { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholders_for_missing_and_null() {
        let record = json!({
            "algorithm_name": "Tesseract",
            "algorithm_version": null,
            "speed_metrics": {"units_per_second": 12.5}
        });
        let table = build_table(&[&record], &SortState::default());
        let row = &table.rows[0];
        assert_eq!(row[0], "Tesseract");
        assert_eq!(row[1], PLACEHOLDER);
        assert_eq!(row[6], "12.5");
        assert_eq!(row[11], PLACEHOLDER);
    }

    #[test]
    fn test_sort_indicator_on_active_column_only() {
        let sort = SortState::ascending("dataset_name").toggled("dataset_name");
        let table = build_table(&[], &sort);
        let labels: Vec<_> = table.headers.iter().map(HeaderCell::label).collect();
        assert_eq!(labels[2], "Dataset ▼");
        assert_eq!(labels[0], "Algorithm");
        assert_eq!(table.headers.iter().filter(|h| h.sorted.is_some()).count(), 1);
        assert!(table.is_empty());
    }
}
