//! Record filtering and sorting
//!
//! [`apply`] never touches the input slice: it returns a new vector of
//! references into it, filtered by [`FilterState`] and ordered by
//! [`SortState`].

use crate::path::{display, get_present, Record};
use crate::state::{FilterState, SortDirection, SortState, ViewState};
use serde_json::Value;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Filter then sort `records` according to `state`
pub fn apply<'a, R: Borrow<Record>>(records: &'a [R], state: &ViewState) -> Vec<&'a Record> {
    let mut selected = filter(records, &state.filters);
    sort(&mut selected, &state.sort);
    selected
}

/// Keep the records that satisfy every non-empty filter
pub fn filter<'a, R: Borrow<Record>>(records: &'a [R], filters: &FilterState) -> Vec<&'a Record> {
    records
        .iter()
        .map(|record| <R as Borrow<Record>>::borrow(record))
        .filter(|record| matches_filters(record, filters))
        .collect()
}

/// Whether `record` passes `filters`. A filtered field that is missing
/// excludes the record.
pub fn matches_filters(record: &Record, filters: &FilterState) -> bool {
    filters.active().all(|(field, needle)| {
        get_present(record, field)
            .map(|value| display(value).to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    })
}

/// Sort in place by the single key in `sort`
pub fn sort(records: &mut [&Record], sort: &SortState) {
    records.sort_by(|a, b| compare_records(a, b, sort));
}

/// Comparator for two records under `sort`.
///
/// Missing values (absent or null) go last in both directions; only present
/// values are subject to the direction.
pub fn compare_records(a: &Record, b: &Record, sort: &SortState) -> Ordering {
    match (get_present(a, &sort.key), get_present(b, &sort.key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(va), Some(vb)) => {
            let ordering = compare_values(va, vb);
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// Ordering between two present values
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => compare_text(a, b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Collation for user-facing text: case-insensitive first, then lower case
/// ahead of upper case so `"abc"` sorts before `"ABC"`.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SortDirection::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn keys<'a>(records: &[&'a Record], key: &str) -> Vec<Option<&'a Value>> {
        records.iter().map(|r| get_present(*r, key)).collect()
    }

    #[test]
    fn test_sort_direction_toggle() {
        let records = vec![json!({"k": 2}), json!({"k": 1}), json!({"k": 3})];
        let state = ViewState::default().toggled_sort("k");
        assert_eq!(state.sort.direction, Ascending);

        let sorted = apply(&records, &state);
        assert_eq!(keys(&sorted, "k"), vec![Some(&json!(1)), Some(&json!(2)), Some(&json!(3))]);

        let state = state.toggled_sort("k");
        let sorted = apply(&records, &state);
        assert_eq!(keys(&sorted, "k"), vec![Some(&json!(3)), Some(&json!(2)), Some(&json!(1))]);
    }

    #[test]
    fn test_nulls_last_in_both_directions() {
        let records = vec![json!({"k": null}), json!({"k": 1}), json!({}), json!({"k": 0})];
        for direction in [Ascending, Descending] {
            let sort = SortState { key: "k".into(), direction };
            let mut refs: Vec<&Record> = records.iter().collect();
            super::sort(&mut refs, &sort);
            assert!(get_present(refs[0], "k").is_some());
            assert!(get_present(refs[1], "k").is_some());
            assert!(get_present(refs[2], "k").is_none());
            assert!(get_present(refs[3], "k").is_none());
        }
    }

    #[test]
    fn test_string_sort_is_case_insensitive() {
        let records = vec![json!({"n": "beta"}), json!({"n": "Alpha"}), json!({"n": "alpha"})];
        let mut refs: Vec<&Record> = records.iter().collect();
        super::sort(&mut refs, &SortState::ascending("n"));
        let names: Vec<_> = refs.iter().map(|r| display(&r["n"])).collect();
        assert_eq!(names, vec!["alpha", "Alpha", "beta"]);
    }

    #[test]
    fn test_nested_key_sort() {
        let records = vec![
            json!({"speed_metrics": {"units_per_second": 4.5}}),
            json!({"speed_metrics": {"units_per_second": 12.0}}),
            json!({"speed_metrics": {}}),
        ];
        let sort = SortState {
            key: "speed_metrics.units_per_second".into(),
            direction: Descending,
        };
        let mut refs: Vec<&Record> = records.iter().collect();
        super::sort(&mut refs, &sort);
        assert_eq!(refs[0]["speed_metrics"]["units_per_second"], json!(12.0));
        assert_eq!(refs[2]["speed_metrics"], json!({}));
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let records = vec![
            json!({"algorithm_name": "A", "dataset_name": "D1", "speed_metrics": {"t": 10}}),
            json!({"algorithm_name": "B", "dataset_name": "D1", "speed_metrics": {"t": 5}}),
        ];
        let state = ViewState::default().with_filters(FilterState::new("a", ""));
        let result = apply(&records, &state);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["algorithm_name"], json!("A"));
    }

    #[test]
    fn test_filters_are_conjunctive_and_missing_excludes() {
        let records = vec![
            json!({"algorithm_name": "EasyOCR", "dataset_name": "ICDAR"}),
            json!({"algorithm_name": "EasyOCR", "dataset_name": "Synth"}),
            json!({"algorithm_name": "PaddleOCR"}),
        ];
        let filters = FilterState::new("ocr", "icd");
        let result = filter(&records, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["dataset_name"], json!("ICDAR"));

        let only_dataset = FilterState::new("", "s");
        assert_eq!(filter(&records, &only_dataset).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<Record> = Vec::new();
        let state = ViewState::default().with_filters(FilterState::new("x", "y"));
        assert!(apply(&records, &state).is_empty());
    }

    #[test]
    fn test_input_left_untouched() {
        let records = vec![json!({"k": 2}), json!({"k": 1})];
        let before = records.clone();
        let _ = apply(&records, &ViewState::default().toggled_sort("k"));
        assert_eq!(records, before);
    }

    #[test]
    fn test_mixed_kinds_are_ordered_by_kind() {
        assert_eq!(compare_values(&json!(true), &json!(3)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!("3")), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2.5)), Ordering::Equal);
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            names in proptest::collection::vec("[a-dA-D]{0,4}", 0..12),
            needle in "[a-d]{1,2}",
        ) {
            let records: Vec<Record> = names
                .iter()
                .map(|n| json!({"algorithm_name": n, "dataset_name": "set"}))
                .collect();
            let filters = FilterState::new(needle, "");
            let once = filter(&records, &filters);
            let twice = filter(&once, &filters);
            prop_assert_eq!(&once, &twice);
        }
    }
}
