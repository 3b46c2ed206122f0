use anyhow::Result;
use clap::Parser;
use handoff::cli::{init_tracing, run_report, ReportCli};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = ReportCli::parse();
    let result = run_report(cli, &mut std::io::stdout().lock());
    if let Err(e) = &result {
        tracing::error!(error = %e, "CLI exited with error");
    }
    result
}
