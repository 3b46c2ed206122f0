use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_CSV_PATH: &str = "data/sample_sales.csv";
pub const DEFAULT_TOP_N: usize = 2;

/// Settings for one producer/consumer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum number of messages buffered between producer and consumer.
    pub capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(capacity = self.capacity, "Loaded PipelineConfig");
    }
}

/// Settings for the usage report job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// CSV file to read, relative to the invocation directory unless absolute.
    pub csv_path: PathBuf,
    /// How many features the revenue ranking keeps.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ReportConfig {
    pub fn trace_loaded(&self) {
        info!(
            csv_path = %self.csv_path.display(),
            top_n = self.top_n,
            "Loaded ReportConfig"
        );
        debug!(?self, "ReportConfig loaded (full debug)");
    }
}
