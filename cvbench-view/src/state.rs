//! Immutable view state threaded through the pipeline
//!
//! Every user action produces a fresh [`ViewState`]; the shell keeps the only
//! live copy and swaps it wholesale.

use cvbench_common::ChartConfig;
use serde::{Deserialize, Serialize};

/// Field addressed by the algorithm filter
pub const ALGORITHM_FIELD: &str = "algorithm_name";
/// Field addressed by the dataset filter
pub const DATASET_FIELD: &str = "dataset_name";
/// Field whose values may form a time axis
pub const RUN_DATE_FIELD: &str = "benchmark_run_date";

/// Keys offered for grouping the bar view
pub const CATEGORY_KEYS: [&str; 2] = [ALGORITHM_FIELD, DATASET_FIELD];
/// Keys offered for the x-axis of the line view
pub const X_AXIS_KEYS: [&str; 3] = [RUN_DATE_FIELD, DATASET_FIELD, ALGORITHM_FIELD];
/// Keys offered for splitting the line view into series
pub const SERIES_KEYS: [&str; 3] = [ALGORITHM_FIELD, DATASET_FIELD, "dataset_details.type"];

/// Substring filters, case-insensitive and ANDed across fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub algorithm: String,
    pub dataset: String,
}

impl FilterState {
    pub fn new(algorithm: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            dataset: dataset.into(),
        }
    }

    /// `(field path, needle)` pairs for every non-empty filter
    pub fn active(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (ALGORITHM_FIELD, self.algorithm.as_str()),
            (DATASET_FIELD, self.dataset.as_str()),
        ]
        .into_iter()
        .filter(|(_, needle)| !needle.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ascending"),
            SortDirection::Descending => write!(f, "descending"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Single active sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::ascending(ALGORITHM_FIELD)
    }
}

impl SortState {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Sort requested on `key`: the current key flips direction, a new key
    /// starts ascending.
    pub fn toggled(&self, key: &str) -> Self {
        if self.key == key {
            Self {
                key: self.key.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::ascending(key)
        }
    }
}

/// Metric and axis selection for both charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSelection {
    /// Dot-path into `speed_metrics` or `accuracy_metrics`
    pub metric: Option<String>,
    /// Category key for the bar view
    pub category_key: String,
    /// X-axis key for the line view
    pub x_axis_key: String,
    /// Series key for the line view
    pub series_key: String,
}

impl Default for ChartSelection {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl ChartSelection {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            metric: None,
            category_key: config.category_key.clone(),
            x_axis_key: config.x_axis_key.clone(),
            series_key: config.series_key.clone(),
        }
    }

    pub fn with_metric(&self, metric: impl Into<String>) -> Self {
        Self {
            metric: Some(metric.into()),
            ..self.clone()
        }
    }
}

/// Filters, sort and chart selection for one render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub filters: FilterState,
    pub sort: SortState,
    pub chart: ChartSelection,
}

impl ViewState {
    pub fn with_filters(&self, filters: FilterState) -> Self {
        Self {
            filters,
            ..self.clone()
        }
    }

    /// Apply a header click on `key`
    pub fn toggled_sort(&self, key: &str) -> Self {
        Self {
            sort: self.sort.toggled(key),
            ..self.clone()
        }
    }

    pub fn with_chart(&self, chart: ChartSelection) -> Self {
        Self {
            chart,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_same_key_flips() {
        let sort = SortState::ascending("k");
        let sort = sort.toggled("k");
        assert_eq!(sort.direction, SortDirection::Descending);
        let sort = sort.toggled("k");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_toggle_new_key_resets() {
        let sort = SortState::ascending("k").toggled("k");
        let sort = sort.toggled("dataset_name");
        assert_eq!(sort, SortState::ascending("dataset_name"));
    }

    #[test]
    fn test_active_filters() {
        assert!(FilterState::default().is_empty());
        let filters = FilterState::new("", "icdar");
        let active: Vec<_> = filters.active().collect();
        assert_eq!(active, vec![(DATASET_FIELD, "icdar")]);
    }

    #[test]
    fn test_view_state_is_replaced_not_mutated() {
        let original = ViewState::default();
        let next = original.toggled_sort(ALGORITHM_FIELD);
        assert_eq!(original.sort.direction, SortDirection::Ascending);
        assert_eq!(next.sort.direction, SortDirection::Descending);
        assert_eq!(next.filters, original.filters);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert_eq!("Ascending".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_double_toggle_restores_sort(key in "[a-z_.]{1,12}", descending in proptest::bool::ANY) {
            let sort = SortState {
                key: key.clone(),
                direction: if descending { SortDirection::Descending } else { SortDirection::Ascending },
            };
            proptest::prop_assert_eq!(&sort.toggled(&key).toggled(&key), &sort);
        }
    }
}
