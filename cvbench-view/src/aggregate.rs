//! Grouping records into chart-ready values
//!
//! Two modes feed the two charts:
//! - category mode: one value per distinct category, read from the first
//!   matching record, with 0 standing in for a missing metric;
//! - series mode: one line per distinct series value over a shared x-domain,
//!   with an explicit gap wherever the series has no value.

use crate::engine::compare_text;
use crate::path::{display, get_present, number_at, Record};
use crate::state::RUN_DATE_FIELD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// One bar of the category chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    /// Display label of the category; `None` groups records missing the key
    pub category: Option<String>,
    pub value: f64,
}

impl CategoryValue {
    pub fn label(&self) -> &str {
        self.category.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub metric: String,
    pub category_key: String,
    pub values: Vec<CategoryValue>,
    /// Largest value, never below 0
    pub max_value: f64,
}

impl CategoryAggregate {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How x positions of the line chart are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Chronological positions from parsed run dates
    Time,
    /// Evenly spaced slots in sorted order
    Category,
}

/// A distinct x-axis value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XValue {
    /// Display label; `None` for records missing the x key
    pub label: Option<String>,
    /// Parsed instant when the axis is a time axis
    pub time: Option<DateTime<Utc>>,
    #[serde(skip)]
    key: Option<Value>,
}

impl XValue {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("-")
    }
}

/// One line of the series chart; `None` marks a gap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesAggregate {
    pub metric: String,
    pub x_axis_key: String,
    pub series_key: String,
    pub axis: AxisKind,
    pub x_values: Vec<XValue>,
    pub series: Vec<Series>,
}

impl SeriesAggregate {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() || self.x_values.is_empty()
    }

    /// Largest present point across all series
    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flat_map(|series| series.points.iter().flatten().copied())
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))))
    }
}

fn as_record<R: Borrow<Record>>(record: &R) -> &Record {
    record.borrow()
}

/// Category mode: first-match value per distinct category, sorted by label
pub fn aggregate_categories<R: Borrow<Record>>(
    records: &[R],
    category_key: &str,
    metric: &str,
) -> CategoryAggregate {
    let mut keys: Vec<Option<&Value>> = Vec::new();
    for record in records {
        let key = get_present(as_record(record), category_key);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.sort_by(|a, b| {
        compare_category_labels(a.map(display).as_deref(), b.map(display).as_deref())
    });

    let values: Vec<CategoryValue> = keys
        .into_iter()
        .map(|key| {
            let value = records
                .iter()
                .map(as_record)
                .find(|record| get_present(record, category_key) == key)
                .and_then(|record| number_at(record, metric))
                .filter(|value| value.is_finite())
                .unwrap_or(0.0);
            CategoryValue {
                category: key.map(display),
                value,
            }
        })
        .collect();

    let max_value = values.iter().map(|v| v.value).fold(0.0, f64::max);

    CategoryAggregate {
        metric: metric.to_string(),
        category_key: category_key.to_string(),
        values,
        max_value,
    }
}

/// Series mode: one line per series value across the sorted x-domain
pub fn aggregate_series<R: Borrow<Record>>(
    records: &[R],
    x_axis_key: &str,
    series_key: &str,
    metric: &str,
) -> SeriesAggregate {
    let axis = infer_axis(records, x_axis_key);

    let mut x_values: Vec<XValue> = Vec::new();
    for record in records {
        let key = get_present(as_record(record), x_axis_key);
        if x_values.iter().all(|x| x.key.as_ref() != key) {
            x_values.push(XValue {
                label: key.map(display),
                time: match axis {
                    AxisKind::Time => key.and_then(parse_run_date),
                    AxisKind::Category => None,
                },
                key: key.cloned(),
            });
        }
    }
    match axis {
        AxisKind::Time => x_values.sort_by_key(|x| x.time),
        AxisKind::Category => {
            x_values.sort_by(|a, b| compare_labels(a.label.as_deref(), b.label.as_deref()))
        }
    }

    let mut groups: IndexMap<String, Vec<&Record>> = IndexMap::new();
    for record in records.iter().map(as_record) {
        if let Some(series_value) = get_present(record, series_key) {
            groups.entry(display(series_value)).or_default().push(record);
        }
    }

    let series = groups
        .into_iter()
        .map(|(name, members)| {
            let points = x_values
                .iter()
                .map(|x| {
                    members
                        .iter()
                        .find(|record| get_present(record, x_axis_key) == x.key.as_ref())
                        .and_then(|record| number_at(record, metric))
                        .filter(|value| value.is_finite())
                })
                .collect();
            Series { name, points }
        })
        .collect();

    SeriesAggregate {
        metric: metric.to_string(),
        x_axis_key: x_axis_key.to_string(),
        series_key: series_key.to_string(),
        axis,
        x_values,
        series,
    }
}

/// Time axis only for the run-date key, and only when every record's value
/// parses as a date
pub fn infer_axis<R: Borrow<Record>>(records: &[R], x_axis_key: &str) -> AxisKind {
    let all_dates = records.iter().map(as_record).all(|record| {
        get_present(record, x_axis_key)
            .and_then(parse_run_date)
            .is_some()
    });
    if x_axis_key == RUN_DATE_FIELD && !records.is_empty() && all_dates {
        AxisKind::Time
    } else {
        AxisKind::Category
    }
}

/// Parse an ISO-ish run date.
///
/// Accepts RFC 3339, naive date-times (taken as UTC), plain dates and epoch
/// milliseconds.
pub fn parse_run_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_text(s.trim()),
        Value::Number(n) => n
            .as_f64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis as i64).single()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn missing_last(a: Option<&str>, b: Option<&str>, present: fn(&str, &str) -> Ordering) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => present(a, b),
    }
}

/// Collation order for category x values, missing last
fn compare_labels(a: Option<&str>, b: Option<&str>) -> Ordering {
    missing_last(a, b, compare_text)
}

/// Case-sensitive code-point order for bar categories, missing last
fn compare_category_labels(a: Option<&str>, b: Option<&str>) -> Ordering {
    missing_last(a, b, |a, b| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_first_match_and_sorting() {
        let records = vec![
            json!({"algorithm_name": "Tesseract", "speed_metrics": {"t": 4.0}}),
            json!({"algorithm_name": "EasyOCR", "speed_metrics": {"t": 9.0}}),
            json!({"algorithm_name": "Tesseract", "speed_metrics": {"t": 100.0}}),
        ];
        let agg = aggregate_categories(&records, "algorithm_name", "speed_metrics.t");
        let labels: Vec<_> = agg.values.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["EasyOCR", "Tesseract"]);
        assert_eq!(agg.values[1].value, 4.0);
        assert_eq!(agg.max_value, 9.0);
    }

    #[test]
    fn test_category_order_is_case_sensitive() {
        let records = vec![
            json!({"algorithm_name": "alpha", "speed_metrics": {"t": 1.0}}),
            json!({"speed_metrics": {"t": 3.0}}),
            json!({"algorithm_name": "Beta", "speed_metrics": {"t": 2.0}}),
        ];
        let agg = aggregate_categories(&records, "algorithm_name", "speed_metrics.t");
        let labels: Vec<_> = agg.values.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["Beta", "alpha", "-"]);
        assert_eq!(agg.values[2].value, 3.0);
    }

    #[test]
    fn test_category_missing_metric_defaults_to_zero() {
        let records = vec![
            json!({"algorithm_name": "A", "speed_metrics": {"t": 2.0}}),
            json!({"algorithm_name": "B", "speed_metrics": {}}),
            json!({"algorithm_name": "C", "speed_metrics": {"t": "n/a"}}),
        ];
        let agg = aggregate_categories(&records, "algorithm_name", "speed_metrics.t");
        let values: Vec<_> = agg.values.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![2.0, 0.0, 0.0]);
        assert_eq!(agg.max_value, 2.0);
    }

    #[test]
    fn test_category_zero_participates_in_max() {
        let records = vec![json!({"algorithm_name": "A", "speed_metrics": {}})];
        let agg = aggregate_categories(&records, "algorithm_name", "speed_metrics.t");
        assert_eq!(agg.values[0].value, 0.0);
        assert_eq!(agg.max_value, 0.0);
    }

    #[test]
    fn test_category_missing_key_sorts_last() {
        let records = vec![
            json!({"speed_metrics": {"t": 1.0}}),
            json!({"dataset_name": "B", "speed_metrics": {"t": 2.0}}),
        ];
        let agg = aggregate_categories(&records, "dataset_name", "speed_metrics.t");
        assert_eq!(agg.values[0].category.as_deref(), Some("B"));
        assert_eq!(agg.values[1].category, None);
        assert_eq!(agg.values[1].value, 1.0);
    }

    #[test]
    fn test_series_gap_is_not_zero() {
        let records = vec![
            json!({"algorithm_name": "A", "dataset_name": "D1", "speed_metrics": {"t": 1.0}}),
            json!({"algorithm_name": "A", "dataset_name": "D2", "speed_metrics": {"t": 2.0}}),
            json!({"algorithm_name": "B", "dataset_name": "D2", "speed_metrics": {"t": 3.0}}),
        ];
        let agg = aggregate_series(&records, "dataset_name", "algorithm_name", "speed_metrics.t");
        assert_eq!(agg.axis, AxisKind::Category);
        let labels: Vec<_> = agg.x_values.iter().map(|x| x.label()).collect();
        assert_eq!(labels, vec!["D1", "D2"]);
        assert_eq!(agg.series[0].name, "A");
        assert_eq!(agg.series[0].points, vec![Some(1.0), Some(2.0)]);
        assert_eq!(agg.series[1].name, "B");
        assert_eq!(agg.series[1].points, vec![None, Some(3.0)]);
        assert_eq!(agg.max_value(), Some(3.0));
    }

    #[test]
    fn test_series_time_axis_is_chronological() {
        let records = vec![
            json!({"algorithm_name": "A", "benchmark_run_date": "2023-01-10", "speed_metrics": {"t": 8}}),
            json!({"algorithm_name": "A", "benchmark_run_date": "2023-01-01T08:00:00Z", "speed_metrics": {"t": 10}}),
            json!({"algorithm_name": "B", "benchmark_run_date": "2023-01-05 12:30:00", "speed_metrics": {"t": 12}}),
        ];
        let agg = aggregate_series(&records, "benchmark_run_date", "algorithm_name", "speed_metrics.t");
        assert_eq!(agg.axis, AxisKind::Time);
        let labels: Vec<_> = agg.x_values.iter().map(|x| x.label()).collect();
        assert_eq!(labels, vec!["2023-01-01T08:00:00Z", "2023-01-05 12:30:00", "2023-01-10"]);
        assert_eq!(agg.series[0].points, vec![Some(10.0), None, Some(8.0)]);
        assert_eq!(agg.series[1].points, vec![None, Some(12.0), None]);
    }

    #[test]
    fn test_unparseable_date_falls_back_to_category() {
        let records = vec![
            json!({"algorithm_name": "A", "benchmark_run_date": "2023-01-10"}),
            json!({"algorithm_name": "A", "benchmark_run_date": "last tuesday"}),
        ];
        assert_eq!(infer_axis(&records, "benchmark_run_date"), AxisKind::Category);

        let dated = vec![json!({"dataset_name": "2023-01-10"})];
        assert_eq!(infer_axis(&dated, "dataset_name"), AxisKind::Category);
    }

    #[test]
    fn test_missing_series_value_dropped_and_missing_x_last() {
        let records = vec![
            json!({"dataset_name": "D1", "speed_metrics": {"t": 1.0}}),
            json!({"algorithm_name": "A", "speed_metrics": {"t": 5.0}}),
            json!({"algorithm_name": "A", "dataset_name": "D1", "speed_metrics": {"t": 2.0}}),
        ];
        let agg = aggregate_series(&records, "dataset_name", "algorithm_name", "speed_metrics.t");
        assert_eq!(agg.series.len(), 1);
        assert_eq!(agg.x_values.last().unwrap().label, None);
        assert_eq!(agg.series[0].points, vec![Some(2.0), Some(5.0)]);
    }

    #[test]
    fn test_empty_inputs() {
        let records: Vec<Record> = Vec::new();
        assert!(aggregate_categories(&records, "algorithm_name", "speed_metrics.t").is_empty());
        let series = aggregate_series(&records, "benchmark_run_date", "algorithm_name", "m");
        assert!(series.is_empty());
        assert_eq!(series.axis, AxisKind::Category);
        assert_eq!(series.max_value(), None);
    }

    #[test]
    fn test_parse_run_date_variants() {
        assert!(parse_run_date(&json!("2024-02-29")).is_some());
        assert!(parse_run_date(&json!("2024-02-29T13:45")).is_some());
        assert!(parse_run_date(&json!("2024-02-29T13:45:10.250+02:00")).is_some());
        assert!(parse_run_date(&json!(1_700_000_000_000_i64)).is_some());
        assert!(parse_run_date(&json!("2024-02-30")).is_none());
        assert!(parse_run_date(&json!(true)).is_none());
    }
}
