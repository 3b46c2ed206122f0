/// `load_config` module: loads the optional YAML config file shared by both binaries.
///
/// This is the only place where user-supplied YAML is parsed and mapped onto
/// the strongly-typed `handoff-core` config structs.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`] (`pipeline:` and `report:` sections, both optional)
/// - Reject unknown keys so typos surface as errors instead of silently using defaults
/// - Apply the `HANDOFF_CSV_PATH` environment override to the report section
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted schema:
///
/// ```yaml
/// pipeline:
///   capacity: 5
/// report:
///   csv_path: data/sample_sales.csv
///   top_n: 2
/// ```
use anyhow::Result;
use handoff_core::config::{PipelineConfig, ReportConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable overriding `report.csv_path`.
pub const CSV_PATH_ENV: &str = "HANDOFF_CSV_PATH";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// `None` when the file has no `pipeline:` section, so the binary's own default applies.
    pub pipeline: Option<PipelineConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    apply_env_overrides(&mut config.report);
    Ok(config)
}

/// Overrides `report.csv_path` from [`CSV_PATH_ENV`] when it is set and non-empty.
pub fn apply_env_overrides(report: &mut ReportConfig) {
    if let Ok(raw) = env::var(CSV_PATH_ENV) {
        if !raw.is_empty() {
            info!(env = CSV_PATH_ENV, csv_path = %raw, "Overriding CSV path from environment");
            report.csv_path = PathBuf::from(raw);
        }
    }
}
