//! # contract: where usage records come from
//!
//! The report job never opens files itself; it asks a [`RecordSource`] for
//! rows. [`CsvFileSource`] is the production implementation, and the trait
//! is annotated for `mockall` so tests can hand the report fixed rows or a
//! failing source.
//!
//! ## Adding New Sources
//! - Implement [`RecordSource`] for the source.
//! - Map source-specific failures onto [`UsageError`].

use mockall::automock;
use std::path::PathBuf;
use tracing::{error, info};

use crate::analysis::UsageReport;
use crate::config::ReportConfig;
use crate::usage::{read_usage_csv, UsageError, UsageRecord};

/// Trait for loading the full set of usage records for one report.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RecordSource {
    fn load(&self) -> Result<Vec<UsageRecord>, UsageError>;
}

/// Reads records from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.csv_path.clone())
    }
}

impl RecordSource for CsvFileSource {
    fn load(&self) -> Result<Vec<UsageRecord>, UsageError> {
        read_usage_csv(&self.path)
    }
}

/// Load all records from `source` and aggregate them into a [`UsageReport`].
pub fn generate_report<S>(source: &S, top_n: usize) -> Result<UsageReport, UsageError>
where
    S: RecordSource + ?Sized,
{
    info!(top_n, "[REPORT] Loading usage records");
    let records = source.load().inspect_err(|e| {
        error!(error = %e, "[REPORT][ERROR] Failed to load usage records");
    })?;
    let report = UsageReport::from_records(&records, top_n);
    info!(
        rows = records.len(),
        total_revenue = report.total_revenue,
        "[REPORT] Aggregation complete"
    );
    Ok(report)
}
