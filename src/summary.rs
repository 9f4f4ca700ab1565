//! The finalized, immutable statistical profile handed to downstream
//! consumers (chart selection, narrative generation, CLI output).

use std::collections::BTreeMap;

use serde::Serialize;

/// Reportable per-column numeric statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub count: u64,
    pub missing: u64,
}

/// Single data product of an ingestion run. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: u64,
    pub cols: u64,
    pub numeric_stats: BTreeMap<String, NumericSummary>,
    /// Per column: top value/count pairs, at most 50, descending by count.
    pub categorical_stats: BTreeMap<String, Vec<(String, u64)>>,
    pub missing_values: BTreeMap<String, u64>,
    pub total_missing: u64,
    /// `"<min> to <max>"` over the daily histogram, or `"N/A"`.
    pub date_range: String,
    /// ISO day → record count, ascending by day. Empty when no time axis
    /// resolved or fewer than two distinct days were aggregated.
    pub trend_sorted: BTreeMap<String, u64>,
}

impl DatasetSummary {
    pub fn has_trend(&self) -> bool {
        self.trend_sorted.len() >= 2
    }
}

/// Summary math shared by the finalizer and its tests: population variance
/// from raw two-moment state, clamped at zero so floating-point round-off
/// cannot produce a negative variance.
pub fn moments_to_mean_std(sum: f64, sum_squares: f64, count: u64) -> (f64, f64) {
    if count == 0 {
        return (0.0, 0.0);
    }
    let n = count as f64;
    let mean = sum / n;
    let variance = ((sum_squares - sum * sum / n) / n).max(0.0);
    (mean, variance.sqrt())
}
