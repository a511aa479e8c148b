//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading, dispatcher wiring and the run
//! summary printed at the end of every command.

use crate::cli::args::Args;
use crate::config::EtlConfig;
use crate::handler::{
    Dispatcher, HandleReport, JsonLinesStatusRecorder, Outcome, SystemClock, build_dispatcher,
};
use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-run counters reported once all files are handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files seen, matched or not
    pub files_seen: usize,
    pub files_processed: usize,
    /// Files rejected by a structural or field error
    pub files_rejected: usize,
    /// Files that failed with an unexpected error
    pub files_failed: usize,
    /// Files renamed in place because relocation failed
    pub files_quarantined: usize,
    /// Files no handler accepted
    pub files_unmatched: usize,
    pub records_saved: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, report: &HandleReport) {
        self.files_seen += 1;
        match &report.outcome {
            Outcome::Processed { records } => {
                self.files_processed += 1;
                self.records_saved += records;
            }
            Outcome::Structural { .. } => self.files_rejected += 1,
            Outcome::Exceptional { .. } => self.files_failed += 1,
        }
        if report.relocation.is_fatal() {
            self.files_quarantined += 1;
        }
    }

    pub fn record_unmatched(&mut self) {
        self.files_seen += 1;
        self.files_unmatched += 1;
    }

    /// True when every file seen was processed and archived
    pub fn is_clean(&self) -> bool {
        self.files_processed == self.files_seen && self.files_quarantined == 0
    }

    pub fn print(&self) {
        println!("\n{}", "Run Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            self.elapsed.as_millis().to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Files seen:".bright_cyan(),
            self.files_seen.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            self.files_processed.to_string().bright_white().bold()
        );
        println!(
            "  {} {}",
            "Records saved:".bright_cyan(),
            self.records_saved.to_string().bright_white().bold()
        );
        if self.files_rejected > 0 {
            println!(
                "  {} {}",
                "Files rejected:".bright_yellow(),
                self.files_rejected.to_string().bright_yellow().bold()
            );
        }
        if self.files_failed > 0 {
            println!(
                "  {} {}",
                "Files failed:".bright_red(),
                self.files_failed.to_string().bright_red().bold()
            );
        }
        if self.files_quarantined > 0 {
            println!(
                "  {} {}",
                "Renamed in place:".bright_red(),
                self.files_quarantined.to_string().bright_red().bold()
            );
        }
        if self.files_unmatched > 0 {
            println!(
                "  {} {}",
                "Without handler:".bright_yellow(),
                self.files_unmatched.to_string().bright_yellow()
            );
        }
    }
}

/// One coloured line describing what happened to a file
pub fn describe_report(report: &HandleReport) -> String {
    let outcome = match &report.outcome {
        Outcome::Processed { records } => format!("{} ({} records)", "processed".green(), records),
        Outcome::Structural { errors } => format!("{} ({} errors)", "rejected".yellow(), errors.len()),
        Outcome::Exceptional { kind, .. } => format!("{} ({})", "failed".red(), kind),
    };
    let destination = report.relocation.final_path(&report.path);
    let fatal = if report.relocation.is_fatal() {
        format!(" {}", "[renamed in place]".red().bold())
    } else {
        String::new()
    };

    format!(
        "{} {} -> {}{} via {}",
        report.path.display(),
        outcome,
        destination.display(),
        fatal,
        report.handler.bright_white()
    )
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` wins over the level chosen with `--verbose` / `--quiet`.
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("partner_etl={}", log_level)));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init();

    if initialized.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Where the configuration is read from: `--config`, else the user config dir
pub fn configuration_path(args: &Args) -> Result<PathBuf> {
    match &args.config_file {
        Some(path) => Ok(path.clone()),
        None => EtlConfig::default_path()
            .context("Could not determine the user configuration directory, use --config"),
    }
}

/// Load configuration with the layered approach: file, then `ETL_*` environment
///
/// Command-specific flags are applied by each command on top of this.
pub fn load_configuration(args: &Args) -> Result<EtlConfig> {
    let path = configuration_path(args)?;
    if !path.exists() {
        bail!(
            "Configuration file not found: {} (create it or pass --config)",
            path.display()
        );
    }

    let config = EtlConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        .with_env_overrides()
        .context("Invalid ETL_* environment override")?;

    debug!("Loaded configuration: {:?}", config.directories);
    Ok(config)
}

/// Validate `config` and wire its handlers to the on-disk status journal
pub fn create_dispatcher(config: &EtlConfig) -> Result<Arc<Dispatcher>> {
    let status = Arc::new(JsonLinesStatusRecorder::new(config.status_journal_path()));
    let dispatcher = build_dispatcher(config, status, Arc::new(SystemClock))
        .context("Failed to build handlers from configuration")?;
    Ok(Arc::new(dispatcher))
}

/// Progress bar for `total` files; hidden in quiet mode
pub fn create_progress_bar(total: u64, message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} ETA: {eta}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}
