//! The streaming profiler: owns one run's accumulator set, drives
//! classification on the first chunk, folds every chunk in arrival order,
//! and converts the raw state into a [`DatasetSummary`] exactly once at
//! the end of ingestion.
//!
//! Each run owns its own `Profiler`; there is no shared state across runs.
//! A read failure on any chunk aborts the run with no partial summary.

use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    aggregate::{FrequencyTable, NumericAccumulator, TABLE_KEEP, TrendHistogram},
    chunk::{Chunk, ChunkSource},
    classify::{Classification, ColumnRole, classify},
    summary::{DatasetSummary, NumericSummary, moments_to_mean_std},
};

/// Advisory progress observer; invoked with the cumulative processed-row
/// count after each chunk. Not part of the correctness contract.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64);

pub struct Profiler {
    classification: Classification,
    numeric: HashMap<usize, NumericAccumulator>,
    categorical: HashMap<usize, FrequencyTable>,
    trend: TrendHistogram,
    rows: u64,
}

impl Profiler {
    /// Initializes accumulators from a fixed classification. A fresh file
    /// gets a fresh `Profiler`; accumulators are never reused or reset.
    pub fn new(classification: Classification) -> Self {
        let mut numeric = HashMap::new();
        let mut categorical = HashMap::new();
        for (idx, role) in classification.roles.iter().enumerate() {
            match role {
                ColumnRole::Numeric => {
                    numeric.insert(idx, NumericAccumulator::default());
                }
                ColumnRole::Categorical => {
                    categorical.insert(idx, FrequencyTable::default());
                }
                ColumnRole::Temporal => {}
            }
        }
        Self {
            classification,
            numeric,
            categorical,
            trend: TrendHistogram::default(),
            rows: 0,
        }
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn rows_processed(&self) -> u64 {
        self.rows
    }

    /// Folds one chunk into the running state. Strictly sequential; chunks
    /// arrive in file order and are never reprocessed.
    pub fn ingest_chunk(&mut self, chunk: &Chunk) {
        self.rows += chunk.len() as u64;
        for (idx, acc) in self.numeric.iter_mut() {
            acc.observe_chunk(chunk.rows.iter().map(|row| {
                row.get(*idx).and_then(|c| c.as_ref())
            }));
        }
        for (idx, table) in self.categorical.iter_mut() {
            table.observe_chunk(chunk.rows.iter().map(|row| {
                row.get(*idx).and_then(|c| c.as_ref())
            }));
        }
        if let Some(idx) = self.classification.date_col {
            self.trend.observe_chunk(
                chunk
                    .rows
                    .iter()
                    .map(|row| row.get(idx).and_then(|c| c.as_ref())),
            );
        }
    }

    /// Converts raw accumulator state into the reportable summary.
    /// Non-consuming and idempotent: two calls yield identical summaries.
    pub fn finalize(&self) -> DatasetSummary {
        let mut numeric_stats = BTreeMap::new();
        let mut categorical_stats = BTreeMap::new();
        let mut missing_values = BTreeMap::new();

        for (idx, acc) in &self.numeric {
            let name = self.classification.headers[*idx].clone();
            let (mean, std) = moments_to_mean_std(acc.sum, acc.sum_squares, acc.count);
            numeric_stats.insert(
                name.clone(),
                NumericSummary {
                    min: acc.min.unwrap_or(0.0),
                    max: acc.max.unwrap_or(0.0),
                    mean,
                    std,
                    count: acc.count,
                    missing: acc.missing,
                },
            );
            missing_values.insert(name, acc.missing);
        }
        for (idx, table) in &self.categorical {
            let name = self.classification.headers[*idx].clone();
            categorical_stats.insert(name.clone(), table.top(TABLE_KEEP));
            missing_values.insert(name, table.missing);
        }

        let total_missing = missing_values.values().sum();
        let date_range = match self.trend.bounds() {
            Some((min, max)) => format!("{min} to {max}"),
            None => "N/A".to_string(),
        };
        // Single-day histograms produce no usable trend line.
        let trend_sorted = if self.trend.distinct_days() >= 2 {
            self.trend
                .days()
                .iter()
                .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), *count))
                .collect()
        } else {
            BTreeMap::new()
        };

        DatasetSummary {
            rows: self.rows,
            cols: self.classification.cols() as u64,
            numeric_stats,
            categorical_stats,
            missing_values,
            total_missing,
            date_range,
            trend_sorted,
        }
    }
}

/// Drives a full run over a chunk source: classify on the first chunk,
/// aggregate every chunk, finalize at end of stream.
pub fn profile_source<R: Read>(
    source: &mut ChunkSource<R>,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<DatasetSummary> {
    let first = source
        .next_chunk()?
        .ok_or_else(|| anyhow!("Input contains no data rows"))?;
    let native_types = source
        .native_types()
        .expect("native types fixed by first chunk");
    let classification = classify(source.headers(), native_types, &first);
    debug!(
        "Classified {} column(s); time axis: {}",
        classification.cols(),
        classification
            .date_col
            .map(|idx| classification.headers[idx].clone())
            .unwrap_or_else(|| "none".to_string())
    );

    let mut profiler = Profiler::new(classification);
    profiler.ingest_chunk(&first);
    if let Some(report) = progress.as_mut() {
        report(profiler.rows_processed());
    }
    while let Some(chunk) = source.next_chunk()? {
        profiler.ingest_chunk(&chunk);
        if let Some(report) = progress.as_mut() {
            report(profiler.rows_processed());
        }
    }
    info!("Profiled {} row(s)", profiler.rows_processed());
    Ok(profiler.finalize())
}

/// Convenience driver for file (or stdin `-`) inputs.
pub fn profile_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    chunk_rows: usize,
    row_limit: Option<usize>,
) -> Result<DatasetSummary> {
    let mut source = ChunkSource::from_path(path, delimiter, encoding, chunk_rows, row_limit)?;
    profile_source(&mut source, None).with_context(|| format!("Profiling {path:?}"))
}
