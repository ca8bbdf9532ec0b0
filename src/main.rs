mod classify;
mod collector;
mod config;
mod latency;
mod merge;
mod scan;
mod table;

use clap::{Parser, Subcommand};
use classify::RegexClassifier;
use config::ReportConfig;
use merge::MergeOutcome;
use std::path::PathBuf;

/// Extract GC pause metrics from collector logs and merge them with
/// latency benchmark results into one comparison table.
#[derive(Parser, Debug)]
#[command(name = "gc-pause-report", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file path (missing file means defaults)
    #[arg(short, long, global = true, default_value = "gc-report.toml")]
    config: PathBuf,

    /// Extra logging (per-file skip reasons, row classification)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan GC logs and write the per-file GC summary
    Scan {
        /// Directory to scan recursively (default: configured root)
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,
    },
    /// Merge latency results and the GC summary into the final report
    Merge,
    /// Scan, then merge, over the same root
    Run {
        /// Artifact root (default: configured root)
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn run_scan(config: &ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    let summary = scan::scan(config, &RegexClassifier::new())?;
    tracing::info!(
        rows = summary.rows.len(),
        skipped = summary.skipped,
        "GC log scan complete"
    );
    println!("GC report -> {}", summary.report.display());
    Ok(())
}

fn run_merge(config: &ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    match merge::merge(config)? {
        MergeOutcome::NothingToMerge => {
            println!(
                "No g1/zgc/shen data found. Run the latency benchmark and the GC log scan first."
            );
        }
        MergeOutcome::Written { path, rows } => {
            println!("Consolidated report written to: {}", path.display());
            for row in &rows {
                println!(" - {}", row.digest());
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    tracing::debug!(?cli, "parsed CLI arguments");

    let config = match config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Scan { root } => {
            let config = match root {
                Some(r) => config.with_root(r),
                None => config,
            };
            run_scan(&config)
        }
        Command::Merge => run_merge(&config),
        Command::Run { root } => {
            let config = match root {
                Some(r) => config.with_root(r),
                None => config,
            };
            run_scan(&config).and_then(|()| run_merge(&config))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
