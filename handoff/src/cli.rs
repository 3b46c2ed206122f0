///
/// This module implements the CLI interface for handoff's two binaries:
/// argument parsing, config resolution and the user-visible output.
///
/// All core logic (channel, pipeline, aggregation) lives in the [`handoff-core`] crate.
/// This module is strictly CLI glue.
///
/// ## Features
/// - [`PipelineCli`] / [`run_pipeline`]: the `producer-consumer` demo
/// - [`ReportCli`] / [`run_report`]: the `usage-report` job
/// - Both `run_*` functions write to a caller-supplied writer so tests can capture stdout.
///
/// ## Precedence
/// Command-line flags override the YAML file, which overrides built-in defaults.
/// For the report, `HANDOFF_CSV_PATH` sits between the file and the flags.
///
/// [`handoff-core`]: ../../handoff-core/
use crate::load_config::{apply_env_overrides, load_config, CliConfig};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use handoff_core::config::PipelineConfig;
use handoff_core::contract::{generate_report, CsvFileSource};
use handoff_core::pipeline::Pipeline;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Channel capacity used by the demo when neither the flag nor the config sets one.
pub const DEMO_CAPACITY: usize = 5;
pub const DEMO_COUNT: u64 = 10;

/// Runs the producer/consumer demo: squares `0..count` through a bounded channel.
#[derive(Parser, Debug)]
#[clap(
    name = "producer-consumer",
    version,
    about = "Square a sequence of numbers through a bounded producer/consumer channel"
)]
pub struct PipelineCli {
    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Channel capacity
    #[clap(long)]
    pub capacity: Option<usize>,
    /// Number of source items (the source is 0..count)
    #[clap(long, default_value_t = DEMO_COUNT)]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Prints revenue, token and latency reports for the usage dataset.
#[derive(Parser, Debug)]
#[clap(
    name = "usage-report",
    version,
    about = "Aggregate AI feature usage transactions from a CSV file"
)]
pub struct ReportCli {
    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// CSV file to read
    #[clap(long)]
    pub csv: Option<PathBuf>,
    /// Number of features in the revenue ranking
    #[clap(long)]
    pub top: Option<usize>,
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Install the fmt subscriber on stderr, filtered by `RUST_LOG`.
///
/// stdout is reserved for the reports.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(path: Option<&PathBuf>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = CliConfig::default();
            apply_env_overrides(&mut config.report);
            Ok(config)
        }
    }
}

/// Entrypoint of the `producer-consumer` binary.
pub fn run_pipeline<W: Write>(cli: PipelineCli, out: &mut W) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = resolve_config(cli.config.as_ref())?;
    let capacity = cli
        .capacity
        .or(config.pipeline.map(|p| p.capacity))
        .unwrap_or(DEMO_CAPACITY);
    let pipeline_config = PipelineConfig { capacity };
    pipeline_config.trace_loaded();

    let source: Vec<u64> = (0..cli.count).collect();
    tracing::info!(command = "producer-consumer", items = source.len(), "Starting pipeline");
    let destination = Pipeline::new(source.clone(), pipeline_config)
        .try_run_with(|x: u64| {
            x.checked_mul(x)
                .ok_or_else(|| format!("square of {x} overflows u64"))
        })
        .context("Producer/consumer pipeline failed")?;

    writeln!(out, "Source items: {:?}", source)?;
    writeln!(out, "Destination items: {:?}", destination)?;
    tracing::info!(command = "producer-consumer", "Pipeline complete");
    Ok(())
}

/// Entrypoint of the `usage-report` binary.
pub fn run_report<W: Write>(cli: ReportCli, out: &mut W) -> Result<()> {
    tracing::info!("trace_initialised");

    let mut report_config = resolve_config(cli.config.as_ref())?.report;
    if let Some(csv) = cli.csv {
        report_config.csv_path = csv;
    }
    if let Some(top) = cli.top {
        report_config.top_n = top;
    }
    report_config.trace_loaded();

    let source = CsvFileSource::from_config(&report_config);
    let report = generate_report(&source, report_config.top_n).with_context(|| {
        format!(
            "Failed to build usage report from {}",
            report_config.csv_path.display()
        )
    })?;

    match cli.format {
        OutputFormat::Text => write!(out, "{report}")?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
    }
    tracing::info!(command = "usage-report", format = ?cli.format, "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_demo_prints_source_and_squares() {
        let cli = PipelineCli {
            config: None,
            capacity: None,
            count: 10,
        };
        let mut out = Vec::new();
        run_pipeline(cli, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Source items: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]\n\
             Destination items: [0, 1, 4, 9, 16, 25, 36, 49, 64, 81]\n"
        );
    }

    #[test]
    fn pipeline_demo_rejects_zero_capacity() {
        let cli = PipelineCli {
            config: None,
            capacity: Some(0),
            count: 3,
        };
        let err = run_pipeline(cli, &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("capacity must be at least 1"));
    }

    #[test]
    fn pipeline_demo_with_empty_source() {
        let cli = PipelineCli {
            config: None,
            capacity: Some(1),
            count: 0,
        };
        let mut out = Vec::new();
        run_pipeline(cli, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Source items: []\nDestination items: []\n"
        );
    }

    #[test]
    fn parses_report_flags() {
        let cli = ReportCli::parse_from(["usage-report", "--top", "3", "--format", "json"]);
        assert_eq!(cli.top, Some(3));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.csv.is_none());
    }
}
