use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Typed cell produced by the chunk source. Missing cells are represented
/// as `None` at the row level, never as a `Cell` variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

/// Native storage type of a column, fixed from the first chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeType {
    Int,
    Float,
    Date,
    DateTime,
    Text,
}

impl NativeType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, NativeType::Int | NativeType::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, NativeType::Date | NativeType::DateTime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NativeType::Int => "int",
            NativeType::Float => "float",
            NativeType::Date => "date",
            NativeType::DateTime => "datetime",
            NativeType::Text => "text",
        }
    }
}

impl Cell {
    /// Numeric coercion for the aggregation path. Temporal and text cells
    /// do not coerce; their columns never reach the numeric accumulator.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Floors the cell to day granularity for trend aggregation.
    /// Text cells are parsed best-effort; failures yield `None`.
    pub fn as_day(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_date(s)
                .or_else(|_| parse_datetime(s).map(|dt| dt.date()))
                .ok(),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses a raw field against a fixed native type. Empty input and
/// coercion failures both surface as `None`; a cell that stops matching
/// its column's type mid-file is a missing value, not a schema violation.
/// Literal `NaN`/`inf` tokens parse as f64 but would poison the running
/// moments, so non-finite floats degrade to missing as well. A datetime
/// column accepts bare dates, floored to midnight.
pub fn coerce_cell(value: &str, ty: NativeType) -> Option<Cell> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match ty {
        NativeType::Int => trimmed.parse::<i64>().ok().map(Cell::Int),
        NativeType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Cell::Float),
        NativeType::Date => parse_date(trimmed).ok().map(Cell::Date),
        NativeType::DateTime => parse_datetime(trimmed)
            .ok()
            .or_else(|| {
                parse_date(trimmed)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(Cell::DateTime),
        NativeType::Text => Some(Cell::Text(trimmed.to_string())),
    }
}
