//! Anomaly extraction: which entities sit far from their peers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::score::{population_stats, z_score};

/// One flagged entity on one metric. `index` refers to the position of
/// the entity in the input slice; results are ephemeral per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub index: usize,
    pub metric: String,
    pub z_score: f64,
    pub threshold: f64,
}

/// One scored metric over a record type: a label plus a field accessor.
pub struct MetricSpec<T> {
    pub name: &'static str,
    pub extract: fn(&T) -> f64,
}

/// Flag items whose |z-score| on `extract` meets `threshold`, sorted by
/// descending |z| (strongest signal first, stable ties).
///
/// Returns an empty vec for fewer than two items or a zero-variance
/// population — degeneracy is a defined no-anomaly result, not an error.
pub fn detect_anomalies<T>(
    items: &[T],
    extract: impl Fn(&T) -> f64,
    metric: &str,
    threshold: f64,
) -> Vec<Anomaly> {
    let values: Vec<f64> = items.iter().map(&extract).collect();
    let (mean, std_dev) = population_stats(&values);
    if std_dev == 0.0 {
        return Vec::new();
    }

    let mut anomalies: Vec<Anomaly> = values
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z = z_score(value, mean, std_dev);
            (z.abs() >= threshold).then(|| Anomaly {
                index,
                metric: metric.to_string(),
                z_score: z,
                threshold,
            })
        })
        .collect();

    // sort_by is stable, so equal |z| keeps input order.
    anomalies.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    anomalies
}

/// Run [`detect_anomalies`] once per metric, then group by originating
/// item so a caller can see how many metrics flagged each entity and
/// collapse a multi-dimensional anomaly into a single report entry.
pub fn detect_multi_metric_anomalies<T>(
    items: &[T],
    metrics: &[MetricSpec<T>],
    threshold: f64,
) -> BTreeMap<usize, Vec<Anomaly>> {
    let mut grouped: BTreeMap<usize, Vec<Anomaly>> = BTreeMap::new();
    for spec in metrics {
        for anomaly in detect_anomalies(items, spec.extract, spec.name, threshold) {
            grouped.entry(anomaly.index).or_default().push(anomaly);
        }
    }
    grouped
}
