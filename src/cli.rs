use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chunk::DEFAULT_CHUNK_ROWS;

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile CSV files in a single streaming pass", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile a CSV file and emit its dataset summary
    Profile(ProfileArgs),
    /// Profile a CSV file and emit chart specifications as JSON
    Chart(ChartArgs),
    /// Profile a CSV file and produce a narrative report
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Input CSV file to profile ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Rows per chunk held in memory at a time
    #[arg(long = "chunk-rows", default_value_t = DEFAULT_CHUNK_ROWS)]
    pub chunk_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Maximum rows to ingest (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// Render the summary as elastic tables instead of JSON
    #[arg(long = "table")]
    pub table: bool,
    /// Write JSON output to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// Write JSON output to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// API key for the hosted narrative model (falls back to the
    /// CSV_INSIGHT_API_KEY environment variable, then to the template)
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
    /// Hosted model identifier
    #[arg(long, default_value = crate::narrative::DEFAULT_MODEL)]
    pub model: String,
    /// Base URL of the hosted chat-completions endpoint
    #[arg(long = "base-url", default_value = crate::narrative::DEFAULT_BASE_URL)]
    pub base_url: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_named_and_literal_forms() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
