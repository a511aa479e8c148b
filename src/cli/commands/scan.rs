//! Scan command: walk every client inbox once and handle what is found
//!
//! Requests are built from `<inbound>/<CLIENT>/<inbox>/**`, the relative
//! subdirectory being the path between the inbox and the file. Files are
//! dispatched on blocking worker threads, at most `max_concurrent_files` at a
//! time. Once a shutdown is requested no new file is started; files already
//! in flight finish and are relocated normally.

use super::shared::{RunSummary, create_dispatcher, create_progress_bar, describe_report};
use crate::cli::args::ScanArgs;
use crate::config::EtlConfig;
use crate::constants::FATAL_SUFFIX;
use crate::error::EtlError;
use crate::handler::HandleReport;
use crate::models::FileRequest;
use anyhow::{Context, Result};
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, watch};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Every candidate file below the client inboxes, sorted by path
///
/// Files already renamed in place after a fatal relocation are skipped.
pub fn discover_requests(config: &EtlConfig, clients: &[String]) -> Result<Vec<FileRequest>> {
    let inbound = &config.directories.inbound;
    let mut requests = Vec::new();

    let client_dirs = WalkDir::new(inbound)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_type().is_dir());

    for entry in client_dirs {
        let entry = entry.with_context(|| format!("Failed to list {}", inbound.display()))?;
        let client = entry.file_name().to_string_lossy().into_owned();
        if !clients.is_empty() && !clients.contains(&client) {
            continue;
        }

        let inbox = config.client_inbox(&client);
        if !inbox.is_dir() {
            continue;
        }

        for file in WalkDir::new(&inbox).sort_by_file_name() {
            let file = file.with_context(|| format!("Failed to walk {}", inbox.display()))?;
            if !file.file_type().is_file() || is_quarantined(file.path()) {
                continue;
            }
            requests.push(FileRequest::new(file.path(), &inbox, &client));
        }
    }

    debug!("Discovered {} file(s) under {}", requests.len(), inbound.display());
    Ok(requests)
}

fn is_quarantined(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FATAL_SUFFIX)
}

/// Apply scan flags on top of the loaded configuration
pub fn apply_overrides(config: EtlConfig, args: &ScanArgs) -> EtlConfig {
    let config = match &args.inbound {
        Some(inbound) => config.with_inbound_dir(inbound),
        None => config,
    };
    match args.max_concurrent_files {
        Some(max_files) => config.with_max_concurrent_files(max_files),
        None => config,
    }
}

pub async fn run_scan(
    args: ScanArgs,
    config: EtlConfig,
    quiet: bool,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let config = apply_overrides(config, &args);
    let dispatcher = create_dispatcher(&config)?;

    let requests = discover_requests(&config, &args.clients)?;
    info!(
        "Found {} file(s) for {} handler(s)",
        requests.len(),
        dispatcher.handlers().len()
    );

    if args.dry_run {
        for request in &requests {
            match dispatcher.find(request) {
                Ok(handler) => println!("{} -> {}", request.path().display(), handler.name()),
                Err(e) => println!("{} -> {}", request.path().display(), e),
            }
        }
        return Ok(RunSummary::default());
    }

    let total = requests.len();
    let pb = create_progress_bar(total as u64, "files", quiet);
    let semaphore = Arc::new(Semaphore::new(config.performance.max_concurrent_files));
    let mut in_flight = FuturesUnordered::new();
    let mut summary = RunSummary::default();
    let mut started = 0;

    for request in requests {
        let permit = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break,
            permit = semaphore.clone().acquire_owned() => permit.context("Worker pool closed")?,
        };

        let dispatcher = dispatcher.clone();
        in_flight.push(task::spawn_blocking(move || {
            let _permit = permit;
            dispatcher.dispatch(&request)
        }));
        started += 1;

        // Drain whatever already finished so the bar keeps moving
        while let Some(Some(result)) = in_flight.next().now_or_never() {
            tally(result, &mut summary, &pb, quiet)?;
        }
    }

    while let Some(result) = in_flight.next().await {
        tally(result, &mut summary, &pb, quiet)?;
    }

    pb.finish_with_message("done");
    if started < total {
        warn!(
            "Scan interrupted, {} file(s) left for the next run",
            total - started
        );
    }

    summary.elapsed = start_time.elapsed();
    if !quiet {
        summary.print();
    }
    Ok(summary)
}

/// Resolves once a stop is requested; never if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn tally(
    result: std::result::Result<crate::error::Result<HandleReport>, task::JoinError>,
    summary: &mut RunSummary,
    pb: &ProgressBar,
    quiet: bool,
) -> Result<()> {
    match result.context("File handling task panicked")? {
        Ok(report) => {
            if !quiet {
                pb.suspend(|| println!("{}", describe_report(&report)));
            }
            summary.record(&report);
        }
        Err(EtlError::NoHandler { .. }) | Err(EtlError::AmbiguousHandler { .. }) => {
            summary.record_unmatched();
        }
        Err(e) => return Err(e.into()),
    }
    pb.inc(1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::{create_test_config, write_inbox_file};
    use tempfile::TempDir;

    fn scan_args() -> ScanArgs {
        ScanArgs::default()
    }

    #[test]
    fn test_discovery_walks_client_inboxes_only() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(dir.path());
        write_inbox_file(dir.path(), "SALIDAS", "b.csv", "x");
        write_inbox_file(dir.path(), "SALIDAS/2024", "a.csv", "x");
        write_inbox_file(dir.path(), "", "20240315-0905-AlreadyExists-c.csv.error", "x");
        std::fs::create_dir_all(dir.path().join("HEINZ/processed")).unwrap();
        std::fs::write(dir.path().join("HEINZ/processed/old.csv"), "x").unwrap();
        std::fs::create_dir_all(dir.path().join("ACME/inbox")).unwrap();
        std::fs::write(dir.path().join("ACME/inbox/acme.csv"), "x").unwrap();

        let requests = discover_requests(&config, &[]).unwrap();
        let found: Vec<(String, String)> = requests
            .iter()
            .map(|r| (r.client().to_string(), r.subdirectory().display().to_string()))
            .collect();

        assert_eq!(
            found,
            vec![
                ("ACME".to_string(), String::new()),
                ("HEINZ".to_string(), "SALIDAS/2024".to_string()),
                ("HEINZ".to_string(), "SALIDAS".to_string()),
            ]
        );

        let heinz_only = discover_requests(&config, &["HEINZ".to_string()]).unwrap();
        assert_eq!(heinz_only.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_handles_every_file() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(dir.path());
        let good = write_inbox_file(dir.path(), "SALIDAS", "good.csv", "A;P1;1;W1\nA;P2;3;W1\n");
        let bad = write_inbox_file(dir.path(), "SALIDAS", "bad.csv", "A;P1;1\n");
        let stray = write_inbox_file(dir.path(), "SALIDAS", "notes.pdf", "x");
        let (_tx, rx) = watch::channel(false);

        let summary = run_scan(scan_args(), config, true, rx).await.unwrap();

        assert_eq!(summary.files_seen, 3);
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.records_saved, 2);
        assert_eq!(summary.files_rejected, 1);
        assert_eq!(summary.files_unmatched, 1);
        assert!(!good.exists());
        assert!(!bad.exists());
        assert!(stray.exists());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(dir.path());
        let file = write_inbox_file(dir.path(), "SALIDAS", "good.csv", "A;P1;1;W1\n");
        let (_tx, rx) = watch::channel(false);
        let args = ScanArgs {
            dry_run: true,
            ..ScanArgs::default()
        };

        let summary = run_scan(args, config, true, rx).await.unwrap();

        assert_eq!(summary.files_seen, 0);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_shutdown_before_start_leaves_files_in_place() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(dir.path());
        let file = write_inbox_file(dir.path(), "SALIDAS", "good.csv", "A;P1;1;W1\n");
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let summary = run_scan(scan_args(), config, true, rx).await.unwrap();

        assert_eq!(summary.files_seen, 0);
        assert!(file.exists());
    }

    #[test]
    fn test_flags_override_configuration() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(dir.path());
        let args = ScanArgs {
            inbound: Some("/elsewhere".into()),
            max_concurrent_files: Some(3),
            ..ScanArgs::default()
        };

        let config = apply_overrides(config, &args);
        assert_eq!(config.directories.inbound, std::path::PathBuf::from("/elsewhere"));
        assert_eq!(config.performance.max_concurrent_files, 3);
    }
}
