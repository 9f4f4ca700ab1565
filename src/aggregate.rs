//! Running per-column accumulators: numeric two-moment state, bounded
//! categorical frequency tables, and the daily trend histogram.
//!
//! Each accumulator folds one chunk-local aggregate at a time and is never
//! rolled back. The categorical table is a heavy-hitters approximation:
//! each chunk contributes only its local top 50 values, and the global
//! table is pruned back to its top 50 whenever it grows past 100 distinct
//! keys. Exact global top-k is not guaranteed; a value that is moderately
//! frequent in every chunk but never locally top-50 can be undercounted
//! or dropped entirely.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use itertools::Itertools;

use crate::data::Cell;

/// In-flight distinct-key ceiling for a categorical table.
pub const TABLE_BOUND: usize = 100;
/// Keys retained per table after a prune, and reported at finalize.
pub const TABLE_KEEP: usize = 50;

/// Two-moment numeric state. Deliberately the naive sum / sum-of-squares
/// scheme rather than Welford's update, to match how the summary's
/// variance is defined downstream.
#[derive(Debug, Clone, Default)]
pub struct NumericAccumulator {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub sum_squares: f64,
    pub count: u64,
    pub missing: u64,
}

impl NumericAccumulator {
    /// Folds one chunk's worth of cells. Chunk-local moments are computed
    /// first and then merged, so per-chunk work stays a single pass.
    pub fn observe_chunk<'a>(&mut self, cells: impl Iterator<Item = Option<&'a Cell>>) {
        let mut chunk_min: Option<f64> = None;
        let mut chunk_max: Option<f64> = None;
        let mut chunk_sum = 0.0;
        let mut chunk_sum_squares = 0.0;
        let mut chunk_count = 0u64;
        let mut chunk_missing = 0u64;
        for cell in cells {
            match cell.and_then(Cell::as_f64) {
                Some(value) => {
                    chunk_count += 1;
                    chunk_sum += value;
                    chunk_sum_squares += value * value;
                    chunk_min = Some(chunk_min.map_or(value, |m| m.min(value)));
                    chunk_max = Some(chunk_max.map_or(value, |m| m.max(value)));
                }
                None => chunk_missing += 1,
            }
        }
        self.count += chunk_count;
        self.missing += chunk_missing;
        self.sum += chunk_sum;
        self.sum_squares += chunk_sum_squares;
        if let Some(value) = chunk_min {
            self.min = Some(self.min.map_or(value, |m| m.min(value)));
        }
        if let Some(value) = chunk_max {
            self.max = Some(self.max.map_or(value, |m| m.max(value)));
        }
    }
}

/// Bounded approximate frequency table for one categorical column.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
    pub missing: u64,
}

impl FrequencyTable {
    /// Counts one chunk's values locally, keeps the chunk-local top 50,
    /// merges into the running table, and prunes the running table back
    /// to its top 50 if it exceeds the 100-key bound.
    pub fn observe_chunk<'a>(&mut self, cells: impl Iterator<Item = Option<&'a Cell>>) {
        let mut local: HashMap<String, u64> = HashMap::new();
        for cell in cells {
            match cell {
                Some(value) => *local.entry(value.as_display()).or_insert(0) += 1,
                None => self.missing += 1,
            }
        }
        for (value, count) in top_entries(&local, TABLE_KEEP) {
            *self.counts.entry(value).or_insert(0) += count;
        }
        if self.counts.len() > TABLE_BOUND {
            self.counts = top_entries(&self.counts, TABLE_KEEP).into_iter().collect();
        }
    }

    pub fn distinct_tracked(&self) -> usize {
        self.counts.len()
    }

    /// Total frequency mass currently tracked; used to pick the
    /// best-populated categorical column for charting.
    pub fn tracked_mass(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Top values, descending by count with a lexicographic tiebreak.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        top_entries(&self.counts, n)
    }
}

fn top_entries(counts: &HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    counts
        .iter()
        .map(|(value, count)| (value.clone(), *count))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(n)
        .collect()
}

/// Daily record-volume histogram over the designated time axis.
#[derive(Debug, Clone, Default)]
pub struct TrendHistogram {
    days: BTreeMap<NaiveDate, u64>,
}

impl TrendHistogram {
    /// Non-parseable values are dropped, not counted as errors.
    pub fn observe_chunk<'a>(&mut self, cells: impl Iterator<Item = Option<&'a Cell>>) {
        for cell in cells.flatten() {
            if let Some(day) = cell.as_day() {
                *self.days.entry(day).or_insert(0) += 1;
            }
        }
    }

    pub fn distinct_days(&self) -> usize {
        self.days.len()
    }

    pub fn days(&self) -> &BTreeMap<NaiveDate, u64> {
        &self.days
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.days.keys().next()?;
        let last = self.days.keys().next_back()?;
        Some((*first, *last))
    }
}
