//! Schema classification: assigns every column exactly one role from the
//! first chunk, permanently for the run.
//!
//! Decision table, applied in order per column:
//! 1. native int/float storage → `Numeric`
//! 2. native date/datetime storage → temporal candidate
//! 3. header contains a case-insensitive "date" or "time" substring AND the
//!    first 100 non-null sampled values all parse as dates → temporal candidate
//! 4. everything else → `Categorical`
//!
//! Only the first temporal candidate in file order becomes the designated
//! time axis; later candidates demote to `Categorical`. A failed date
//! sample falls through to `Categorical` silently.

use serde::Serialize;

use crate::{chunk::Chunk, data::NativeType};

const DATE_SAMPLE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Temporal,
}

/// Fixed role assignment for one ingestion run.
#[derive(Debug, Clone)]
pub struct Classification {
    pub headers: Vec<String>,
    pub roles: Vec<ColumnRole>,
    /// Index of the designated time axis, if one resolved.
    pub date_col: Option<usize>,
}

impl Classification {
    pub fn cols(&self) -> usize {
        self.headers.len()
    }
}

pub fn classify(headers: &[String], native_types: &[NativeType], first: &Chunk) -> Classification {
    let mut roles = Vec::with_capacity(headers.len());
    let mut date_col = None;
    for (idx, (header, native)) in headers.iter().zip(native_types.iter()).enumerate() {
        let role = if native.is_numeric() {
            ColumnRole::Numeric
        } else if is_temporal_candidate(header, *native, first, idx) {
            if date_col.is_none() {
                date_col = Some(idx);
                ColumnRole::Temporal
            } else {
                // Only one time axis per run; later candidates count as plain categories.
                ColumnRole::Categorical
            }
        } else {
            ColumnRole::Categorical
        };
        roles.push(role);
    }
    Classification {
        headers: headers.to_vec(),
        roles,
        date_col,
    }
}

fn is_temporal_candidate(header: &str, native: NativeType, first: &Chunk, idx: usize) -> bool {
    if native.is_temporal() {
        return true;
    }
    let lowered = header.to_ascii_lowercase();
    if !lowered.contains("date") && !lowered.contains("time") {
        return false;
    }
    date_sample_parses(first, idx)
}

/// Sample-based heuristic: the first 100 non-null values must all read as
/// dates. Not validated against the full column.
fn date_sample_parses(first: &Chunk, idx: usize) -> bool {
    let mut sampled = 0usize;
    for row in &first.rows {
        let Some(cell) = row.get(idx).and_then(|c| c.as_ref()) else {
            continue;
        };
        if cell.as_day().is_none() {
            return false;
        }
        sampled += 1;
        if sampled >= DATE_SAMPLE_SIZE {
            break;
        }
    }
    sampled > 0
}
