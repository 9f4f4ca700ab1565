//! Chunk source: turns a delimited byte stream into fixed-size batches of
//! typed rows.
//!
//! Native column types are inferred once, from the first batch, and stay
//! fixed for the run. Later batches coerce each field against the fixed
//! type; a field that no longer matches becomes a missing cell rather than
//! an error. Read and decode failures are fatal to the whole run.

use std::{collections::HashSet, io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{
    data::{Cell, NativeType, coerce_cell, parse_date, parse_datetime},
    io_utils,
};

pub const DEFAULT_CHUNK_ROWS: usize = 10_000;

/// One rectangular batch of typed rows, processed atomically downstream.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct ChunkSource<R: Read> {
    reader: csv::Reader<R>,
    encoding: &'static Encoding,
    headers: Vec<String>,
    native_types: Option<Vec<NativeType>>,
    chunk_rows: usize,
    row_limit: Option<usize>,
    rows_read: usize,
    done: bool,
}

impl ChunkSource<Box<dyn Read>> {
    pub fn from_path(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
        chunk_rows: usize,
        row_limit: Option<usize>,
    ) -> Result<Self> {
        let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        Self::new(reader, encoding, chunk_rows, row_limit)
            .with_context(|| format!("Reading headers from {path:?}"))
    }
}

impl<R: Read> ChunkSource<R> {
    pub fn new(
        mut reader: csv::Reader<R>,
        encoding: &'static Encoding,
        chunk_rows: usize,
        row_limit: Option<usize>,
    ) -> Result<Self> {
        let headers = dedupe_headers(io_utils::reader_headers(&mut reader, encoding)?);
        Ok(Self {
            reader,
            encoding,
            headers,
            native_types: None,
            chunk_rows: chunk_rows.max(1),
            row_limit,
            rows_read: 0,
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Fixed native types; `None` until the first chunk has been read.
    pub fn native_types(&self) -> Option<&[NativeType]> {
        self.native_types.as_deref()
    }

    /// Yields the next batch of up to `chunk_rows` typed rows, or `None`
    /// at end of stream. The first call also fixes the native types.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.done {
            return Ok(None);
        }
        let raw = self.read_raw_batch()?;
        if raw.is_empty() {
            self.done = true;
            return Ok(None);
        }
        if self.native_types.is_none() {
            self.native_types = Some(infer_native_types(self.headers.len(), &raw));
        }
        let types = self
            .native_types
            .as_ref()
            .expect("native types fixed above");
        let rows = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(types.iter())
                    .map(|(field, ty)| field.and_then(|value| coerce_cell(&value, *ty)))
                    .collect()
            })
            .collect();
        Ok(Some(Chunk { rows }))
    }

    fn read_raw_batch(&mut self) -> Result<Vec<Vec<Option<String>>>> {
        let width = self.headers.len();
        let mut batch = Vec::new();
        let mut record = csv::ByteRecord::new();
        while batch.len() < self.chunk_rows {
            if let Some(limit) = self.row_limit
                && self.rows_read >= limit
            {
                self.done = true;
                break;
            }
            let more = self
                .reader
                .read_byte_record(&mut record)
                .with_context(|| format!("Reading row {}", self.rows_read + 2))?;
            if !more {
                self.done = true;
                break;
            }
            let mut row: Vec<Option<String>> = Vec::with_capacity(width);
            for field in record.iter().take(width) {
                let decoded = io_utils::decode_bytes(field, self.encoding)
                    .with_context(|| format!("Decoding row {}", self.rows_read + 2))?;
                let trimmed = decoded.trim();
                if trimmed.is_empty() {
                    row.push(None);
                } else {
                    row.push(Some(trimmed.to_string()));
                }
            }
            // Ragged short rows pad out as missing cells.
            while row.len() < width {
                row.push(None);
            }
            batch.push(row);
            self.rows_read += 1;
        }
        Ok(batch)
    }
}

/// Repeated header names get a positional suffix ("v", "v.1", "v.2") so
/// per-column statistics keyed by name cannot collapse into one entry.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        if used.insert(header.clone()) {
            out.push(header);
            continue;
        }
        let mut suffix = 1usize;
        let mut candidate = format!("{header}.{suffix}");
        while !used.insert(candidate.clone()) {
            suffix += 1;
            candidate = format!("{header}.{suffix}");
        }
        out.push(candidate);
    }
    out
}

/// Candidate tally for one column during first-chunk type inference.
#[derive(Debug, Clone, Default)]
struct TypeScan {
    non_empty: usize,
    int_matches: usize,
    float_matches: usize,
    date_matches: usize,
    datetime_matches: usize,
}

impl TypeScan {
    fn update(&mut self, value: &str) {
        self.non_empty += 1;
        if value.parse::<i64>().is_ok() {
            self.int_matches += 1;
            self.float_matches += 1;
            return;
        }
        // Non-finite tokens ("NaN", "inf") still vote the column numeric;
        // coercion later turns them into missing cells, so the column reads
        // as float-with-nulls rather than text.
        if value.parse::<f64>().is_ok() {
            self.float_matches += 1;
            return;
        }
        if parse_date(value).is_ok() {
            self.date_matches += 1;
        } else if parse_datetime(value).is_ok() {
            self.datetime_matches += 1;
        }
    }

    /// Strict vote: every non-empty sample must match for a non-text type
    /// to win. A column with no observed values stays text.
    fn decide(&self) -> NativeType {
        if self.non_empty == 0 {
            return NativeType::Text;
        }
        if self.int_matches == self.non_empty {
            NativeType::Int
        } else if self.float_matches == self.non_empty {
            NativeType::Float
        } else if self.date_matches == self.non_empty {
            NativeType::Date
        } else if self.date_matches + self.datetime_matches == self.non_empty {
            NativeType::DateTime
        } else {
            NativeType::Text
        }
    }
}

fn infer_native_types(width: usize, batch: &[Vec<Option<String>>]) -> Vec<NativeType> {
    let mut scans = vec![TypeScan::default(); width];
    for row in batch {
        for (idx, field) in row.iter().enumerate().take(width) {
            if let Some(value) = field {
                scans[idx].update(value);
            }
        }
    }
    scans.iter().map(TypeScan::decide).collect()
}
