use anyhow::Result;
use clap::Parser;
use handoff::cli::{init_tracing, run_pipeline, PipelineCli};

fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    init_tracing();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = PipelineCli::parse();
    tracing::info!("CLI arguments parsed, invoking run_pipeline");
    let result = run_pipeline(cli, &mut std::io::stdout().lock());
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
