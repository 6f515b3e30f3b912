//! Write the default pipeline configuration as JSON
//!
//! The output is a starting point for tuning: edit the thresholds and pass
//! the file to `process_windows --config`.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use window_sources::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "write_default_config",
    about = "Writes the default detection and classification configuration"
)]
struct Args {
    /// Output JSON path
    #[arg(default_value = "window_sources.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    PipelineConfig::default().save_to_file(&args.output)?;
    info!("Wrote default configuration to {}", args.output.display());
    Ok(())
}
