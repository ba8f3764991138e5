//! Numeric metric discovery
//!
//! Available chart metrics are read off a single sample record rather than a
//! union over the whole result set. Records in one set are expected to share
//! their metric shape, so this is cheap and usually right; a key that only a
//! later record carries stays unselectable until that record comes first.

use crate::path::Record;
use crate::state::ChartSelection;
use std::borrow::Borrow;
use tracing::debug;

/// Metric containers scanned, in output order
pub const METRIC_CONTAINERS: [&str; 2] = ["speed_metrics", "accuracy_metrics"];

/// How the metric schema is sampled from a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryPolicy {
    /// Only the first record is inspected
    #[default]
    FirstRecord,
}

impl DiscoveryPolicy {
    /// The record(s) whose keys define the metric list
    pub fn sample<'a, R: Borrow<Record>>(&self, records: &'a [R]) -> Option<&'a Record> {
        match self {
            DiscoveryPolicy::FirstRecord => records.first().map(|r| <R as Borrow<Record>>::borrow(r)),
        }
    }
}

/// `"<container>.<key>"` for every numeric metric of the sample record,
/// speed metrics first, each in the sample's key order
pub fn discover<R: Borrow<Record>>(records: &[R]) -> Vec<String> {
    discover_with(records, DiscoveryPolicy::default())
}

pub fn discover_with<R: Borrow<Record>>(records: &[R], policy: DiscoveryPolicy) -> Vec<String> {
    let Some(sample) = policy.sample(records) else {
        return Vec::new();
    };

    let metrics: Vec<String> = METRIC_CONTAINERS
        .iter()
        .filter_map(|container| {
            sample
                .get(*container)
                .and_then(|value| value.as_object())
                .map(|object| (container, object))
        })
        .flat_map(|(container, object)| {
            object
                .iter()
                .filter(|(_, value)| value.is_number())
                .map(move |(key, _)| format!("{container}.{key}"))
        })
        .collect();

    debug!("Discovered {} numeric metrics from sample record", metrics.len());
    metrics
}

/// Keep the selected metric if it is still available, otherwise fall back to
/// the first discovered metric (or none when nothing was discovered)
pub fn reconcile(selection: &ChartSelection, discovered: &[String]) -> ChartSelection {
    let still_available = selection
        .metric
        .as_ref()
        .is_some_and(|metric| discovered.contains(metric));

    if still_available {
        selection.clone()
    } else {
        ChartSelection {
            metric: discovered.first().cloned(),
            ..selection.clone()
        }
    }
}
