//! Command-line argument definitions for the partner ETL
//!
//! The interface is built with the clap derive API. Options shared by every
//! subcommand (`--config`, `--verbose`, `--quiet`) are global.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the partner file ETL
///
/// Validates trading-partner flat files, maps their rows into entities and
/// files every input away into a dated processed or errors archive.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "partner-etl",
    version,
    about = "Validate, map and archive trading-partner flat files",
    long_about = "Batch ingestion of flat files dropped by trading partners. Each file is matched \
                  to exactly one handler by client, subdirectory and file name, checked line by \
                  line against its file type, saved as a whole or not at all, and finally moved \
                  into a dated processed or errors archive."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the TOML configuration file
    ///
    /// Defaults to <config dir>/partner-etl/config.toml.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to the TOML configuration file"
    )]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors, hide progress bars
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Handle a single file
    Process(ProcessArgs),
    /// Walk every client inbox once and handle what is found
    Scan(ScanArgs),
    /// Load and validate the configuration, then print what it declares
    Check,
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// File to handle
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Client the file belongs to
    #[arg(long = "client", value_name = "CLIENT")]
    pub client: String,

    /// Root the handler subdirectory is measured from
    ///
    /// Defaults to the client inbox, <inbound>/<CLIENT>/<inbox>.
    #[arg(long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// File type hint passed along with the request
    #[arg(long = "file-type", value_name = "CODE")]
    pub file_type_hint: Option<String>,
}

/// Arguments for the scan command
#[derive(Debug, Clone, Default, Parser)]
pub struct ScanArgs {
    /// Inbound root holding one directory per client
    #[arg(short = 'i', long = "inbound", value_name = "DIR")]
    pub inbound: Option<PathBuf>,

    /// Only scan these clients (repeatable)
    #[arg(long = "client", value_name = "CLIENT")]
    pub clients: Vec<String>,

    /// Maximum number of files handled at the same time
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub max_concurrent_files: Option<usize>,

    /// Show which handler would take each file without touching anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl Args {
    /// Tracing level selected by `--verbose` / `--quiet`
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
