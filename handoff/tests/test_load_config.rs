use handoff::load_config::{apply_env_overrides, load_config, CSV_PATH_ENV};
use handoff_core::config::{ReportConfig, DEFAULT_CAPACITY, DEFAULT_TOP_N};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

/// This test ensures both sections of a full config are mapped onto the core config types.
#[test]
#[serial]
fn test_load_config_success_pipeline_and_report() {
    env::remove_var(CSV_PATH_ENV);
    let config_file = config_file(
        r#"
pipeline:
  capacity: 7
report:
  csv_path: ./tmp/usage.csv
  top_n: 4
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.pipeline.map(|p| p.capacity), Some(7));
    assert_eq!(config.report.csv_path, PathBuf::from("./tmp/usage.csv"));
    assert_eq!(config.report.top_n, 4);
}

/// Omitted sections and keys fall back to defaults.
#[test]
#[serial]
fn test_load_config_defaults_for_missing_sections() {
    env::remove_var(CSV_PATH_ENV);
    let config = load_config(config_file("report:\n  top_n: 3\n").path())
        .expect("Config with only a report section should load");
    assert!(config.pipeline.is_none());
    assert_eq!(config.report.top_n, 3);
    assert_eq!(config.report.csv_path, ReportConfig::default().csv_path);

    let config = load_config(config_file("pipeline: {}\n").path())
        .expect("Empty pipeline section should load");
    assert_eq!(config.pipeline.map(|p| p.capacity), Some(DEFAULT_CAPACITY));
    assert_eq!(config.report.top_n, DEFAULT_TOP_N);
}

/// The environment variable wins over the file.
#[test]
#[serial]
fn test_load_config_env_overrides_csv_path() {
    env::set_var(CSV_PATH_ENV, "/data/from-env.csv");
    let config = load_config(config_file("report:\n  csv_path: from-file.csv\n").path())
        .expect("Config should load");
    env::remove_var(CSV_PATH_ENV);
    assert_eq!(config.report.csv_path, PathBuf::from("/data/from-env.csv"));
}

#[test]
#[serial]
fn test_empty_env_override_is_ignored() {
    env::set_var(CSV_PATH_ENV, "");
    let mut report = ReportConfig::default();
    apply_env_overrides(&mut report);
    env::remove_var(CSV_PATH_ENV);
    assert_eq!(report, ReportConfig::default());
}

#[test]
#[serial]
fn test_load_config_errors_on_unknown_keys() {
    let err = load_config(config_file("pipeline:\n  capacityy: 3\n").path()).unwrap_err();
    assert!(err.to_string().contains("parse"), "got: {err}");
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let err = load_config(config_file("not-yaml: [:::").path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    let err = load_config("does/not/exist.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
