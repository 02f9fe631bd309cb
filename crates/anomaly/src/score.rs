//! Z-score computation over an in-run population.

/// Number of standard deviations `value` lies from `mean`.
///
/// Returns 0.0 when `std_dev` is zero: a uniform population has no
/// anomalies, not a divide-by-zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Population mean and population (not sample) standard deviation.
///
/// Returns (0, 0) for fewer than two values — a standard deviation
/// over one point is not meaningful.
pub(crate) fn population_stats(values: &[f64]) -> (f64, f64) {
    if values.len() < 2 {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Compute z-scores for one metric across `items` and write each back
/// via `write`. Every item is written (0.0 for degenerate populations);
/// order is preserved, nothing is filtered.
pub fn enrich_with_z_scores<T>(
    items: &mut [T],
    extract: impl Fn(&T) -> f64,
    mut write: impl FnMut(&mut T, f64),
) {
    let values: Vec<f64> = items.iter().map(&extract).collect();
    let (mean, std_dev) = population_stats(&values);
    for (item, value) in items.iter_mut().zip(values) {
        write(item, z_score(value, mean, std_dev));
    }
}
