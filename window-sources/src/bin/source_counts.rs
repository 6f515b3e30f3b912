//! Tally source types in a directory of source files
//!
//! Reads every `Source_*` record file under a directory and prints the
//! number of sources of each type, optionally per file or as a
//! tab-separated dump of every record.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use window_sources::io::{self, SOURCE_FILE_PREFIX};
use window_sources::report::TypeCounts;

#[derive(Parser, Debug)]
#[command(
    name = "source_counts",
    about = "Counts classified sources per type in Source_* files"
)]
struct Args {
    /// Directory searched recursively for Source_* files
    input: PathBuf,

    /// Print counts for each file as well as the totals
    #[arg(long)]
    per_file: bool,

    /// Print every source record as a tab-separated line
    #[arg(long)]
    text: bool,

    /// Print the totals as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Skip unreadable files instead of failing
    #[arg(long)]
    skip_bad: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let files = io::list_files(&args.input, SOURCE_FILE_PREFIX)?;
    info!("Found {} source files in {}", files.len(), args.input.display());

    let mut totals = TypeCounts::new();
    for path in &files {
        let records = match io::read_sources(path) {
            Ok(records) => records,
            Err(e) if args.skip_bad => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        let mut counts = TypeCounts::new();
        for record in &records {
            counts.record(record.source_type);
            if args.text {
                println!("{}\t{}", path.display(), record);
            }
        }

        if args.per_file {
            println!("# {}", path.display());
            print!("{counts}");
        }
        totals.merge(&counts);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        if args.per_file {
            println!("# total");
        }
        print!("{totals}");
        println!("TOTAL\t{}", totals.total());
    }

    Ok(())
}
