use super::snapshot::whole_ms;

const PERCENT_DIVISOR: usize = 100;
pub const PERCENTILE_P95: usize = 95;
pub const PERCENTILE_P99: usize = 99;

/// Sorts samples ascending in place.
pub fn sort_samples(samples: &mut [f64]) {
    samples.sort_unstable_by(f64::total_cmp);
}

/// Percentile of an ascending sample list at index `floor(len * pct / 100)`,
/// clamped to the last sample. Empty input yields 0.
#[must_use]
pub fn percentile(sorted: &[f64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = sorted
        .len()
        .saturating_mul(pct)
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0)
        .min(sorted.len().saturating_sub(1));
    sorted.get(index).copied().map_or(0, whole_ms)
}

/// `(p95, p99)` in whole milliseconds over an unsorted sample list.
#[must_use]
pub fn compute_percentiles(samples: &[f64]) -> (u64, u64) {
    if samples.is_empty() {
        return (0, 0);
    }
    let mut sorted = samples.to_vec();
    sort_samples(&mut sorted);
    (
        percentile(&sorted, PERCENTILE_P95),
        percentile(&sorted, PERCENTILE_P99),
    )
}
