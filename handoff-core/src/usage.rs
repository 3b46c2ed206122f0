//! Usage records: one row of the AI feature usage dataset per monetised transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub transaction_id: String,
    /// `%Y-%m-%d`
    pub date: NaiveDate,
    pub user_segment: String,
    pub feature_name: String,
    pub quantity: u32,
    pub unit_price_usd: f64,
    pub session_revenue_usd: f64,
    pub tokens_used: u64,
    pub response_time_ms: u64,
    pub feedback_score: u8,
    pub country: String,
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("failed to open usage CSV {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed usage CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Read every row of the CSV file at `path`.
pub fn read_usage_csv<P: AsRef<Path>>(path: P) -> Result<Vec<UsageRecord>, UsageError> {
    let path = path.as_ref();
    info!(csv_path = %path.display(), "Reading usage CSV");
    let file = File::open(path).map_err(|source| {
        error!(error = ?source, csv_path = %path.display(), "Failed to open usage CSV");
        UsageError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    parse_usage_csv(file)
}

/// Parse usage rows from any reader. The first line must be the header.
pub fn parse_usage_csv<R: Read>(reader: R) -> Result<Vec<UsageRecord>, UsageError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.deserialize::<UsageRecord>() {
        let record = row.map_err(|e| {
            error!(error = %e, "Failed to parse usage row");
            UsageError::Csv(e)
        })?;
        debug!(transaction_id = %record.transaction_id, "Parsed usage row");
        records.push(record);
    }

    info!(rows = records.len(), "Loaded usage records");
    Ok(records)
}
