//! Robust statistics and adaptive thresholds for onset detection
//!
//! The ODF aggregates per-band flux with a median rather than a mean so a
//! genuine onset only has to raise energy in a majority of bands, and a spike
//! in a single band cannot fake one.

/// Median of `values` (mean of the two middle values for even lengths)
///
/// Returns 0 for an empty slice. NaNs sort as equal and are not filtered.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len().is_multiple_of(2) {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) * 0.5
    } else {
        sorted[sorted.len() / 2]
    }
}

/// Arithmetic mean, 0 for an empty iterator
pub fn mean<'a>(values: impl IntoIterator<Item = &'a f32>) -> f32 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0f32, 0usize), |(s, n), &v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Adaptive threshold: `max(static_threshold, mean(history) · multiplier)`
pub fn adaptive_threshold<'a>(
    history: impl IntoIterator<Item = &'a f32>,
    static_threshold: f32,
    multiplier: f32,
) -> f32 {
    static_threshold.max(mean(history) * multiplier)
}
