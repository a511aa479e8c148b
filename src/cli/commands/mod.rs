//! Command implementations for the partner ETL CLI
//!
//! Each command lives in its own module:
//! - `process`: hand one file to its handler
//! - `scan`: walk every client inbox once, concurrently
//! - `check`: validate and describe the configuration

pub mod check;
pub mod process;
pub mod scan;
pub mod shared;

pub use shared::RunSummary;

use crate::cli::args::{Args, Commands};
use anyhow::{Result, bail};
use shared::{load_configuration, setup_logging};
use tokio::sync::watch;
use tracing::info;

/// Main command runner
///
/// `shutdown` flips to `true` when the user asks to stop; only `scan` has
/// work to leave unstarted.
pub async fn run(args: Args, shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
    setup_logging(&args);

    let Some(command) = args.command.clone() else {
        bail!("No command given, see --help");
    };
    let config = load_configuration(&args)?;
    info!("Starting partner ETL");

    match command {
        Commands::Process(process_args) => process::run_process(process_args, config).await,
        Commands::Scan(scan_args) => scan::run_scan(scan_args, config, args.quiet, shutdown).await,
        Commands::Check => check::run_check(config).await,
    }
}
