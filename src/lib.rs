pub mod aggregate;
pub mod chart;
pub mod chunk;
pub mod classify;
pub mod cli;
pub mod data;
pub mod io_utils;
pub mod narrative;
pub mod profile;
pub mod summary;
pub mod table;

use std::{
    env,
    fs::File,
    io::Write,
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{ChartArgs, Cli, Commands, IngestArgs, ProfileArgs, ReportArgs},
    narrative::NarrativeGenerator,
    summary::DatasetSummary,
};

pub const API_KEY_ENV: &str = "CSV_INSIGHT_API_KEY";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insight", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Chart(args) => handle_chart(&args),
        Commands::Report(args) => handle_report(&args),
    }
}

fn ingest(args: &IngestArgs) -> Result<DatasetSummary> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let row_limit = (args.limit > 0).then_some(args.limit);
    info!(
        "Profiling '{}' in chunks of {} row(s)",
        args.input.display(),
        args.chunk_rows
    );
    profile::profile_path(&args.input, delimiter, encoding, args.chunk_rows, row_limit)
}

fn handle_profile(args: &ProfileArgs) -> Result<()> {
    let summary = ingest(&args.ingest)?;
    if args.table {
        print_summary_tables(&summary);
        return Ok(());
    }
    let json = serde_json::to_string_pretty(&summary).context("Serializing summary")?;
    emit(&json, args.output.as_deref())
}

fn handle_chart(args: &ChartArgs) -> Result<()> {
    let summary = ingest(&args.ingest)?;
    let charts = chart::select_charts(&summary);
    let json = serde_json::to_string_pretty(&charts).context("Serializing chart specs")?;
    emit(&json, args.output.as_deref())
}

fn handle_report(args: &ReportArgs) -> Result<()> {
    let summary = ingest(&args.ingest)?;
    let credential = args
        .api_key
        .clone()
        .or_else(|| env::var(API_KEY_ENV).ok());
    let generator =
        NarrativeGenerator::from_credential(credential.as_deref(), &args.model, &args.base_url);
    println!("{}", generator.generate(&summary));
    Ok(())
}

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
            writeln!(file, "{json}").with_context(|| format!("Writing to {path:?}"))?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary_tables(summary: &DatasetSummary) {
    let overview_headers = vec![
        "rows".to_string(),
        "cols".to_string(),
        "total_missing".to_string(),
        "date_range".to_string(),
    ];
    let overview_rows = vec![vec![
        summary.rows.to_string(),
        summary.cols.to_string(),
        summary.total_missing.to_string(),
        summary.date_range.clone(),
    ]];
    table::print_table(&overview_headers, &overview_rows);

    if !summary.numeric_stats.is_empty() {
        println!();
        let headers = vec![
            "column".to_string(),
            "count".to_string(),
            "min".to_string(),
            "max".to_string(),
            "mean".to_string(),
            "std".to_string(),
            "missing".to_string(),
        ];
        let rows = summary
            .numeric_stats
            .iter()
            .map(|(name, stats)| {
                vec![
                    name.clone(),
                    stats.count.to_string(),
                    format_metric(stats.min),
                    format_metric(stats.max),
                    format_metric(stats.mean),
                    format_metric(stats.std),
                    stats.missing.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }

    if !summary.categorical_stats.is_empty() {
        println!();
        let headers = vec![
            "column".to_string(),
            "value".to_string(),
            "count".to_string(),
        ];
        let rows = summary
            .categorical_stats
            .iter()
            .flat_map(|(name, table)| {
                table
                    .iter()
                    .map(|(value, count)| vec![name.clone(), value.clone(), count.to_string()])
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
}

fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
