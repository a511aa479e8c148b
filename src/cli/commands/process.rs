//! Process command: hand a single file to its handler

use super::shared::{RunSummary, create_dispatcher, describe_report};
use crate::cli::args::ProcessArgs;
use crate::config::EtlConfig;
use crate::models::FileRequest;
use anyhow::{Context, Result, ensure};
use std::time::Instant;
use tokio::task;
use tracing::debug;

/// Build the request for `args.file` and dispatch it
///
/// A file no handler accepts is an error and stays where it is. Files that
/// were handled, successfully or not, are reported in the summary.
pub async fn run_process(args: ProcessArgs, config: EtlConfig) -> Result<RunSummary> {
    let start_time = Instant::now();
    let dispatcher = create_dispatcher(&config)?;

    let request = build_request(&args, &config)?;
    debug!(
        "Request for {} (client {}, subdirectory '{}')",
        request.path().display(),
        request.client(),
        request.subdirectory().display()
    );

    let report = task::spawn_blocking(move || dispatcher.dispatch(&request))
        .await
        .context("File handling task panicked")??;

    println!("{}", describe_report(&report));

    let mut summary = RunSummary::default();
    summary.record(&report);
    summary.elapsed = start_time.elapsed();
    Ok(summary)
}

fn build_request(args: &ProcessArgs, config: &EtlConfig) -> Result<FileRequest> {
    ensure!(args.file.is_file(), "Not a file: {}", args.file.display());

    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config.client_inbox(&args.client));
    ensure!(
        args.file.starts_with(&root),
        "{} is not below {}",
        args.file.display(),
        root.display()
    );

    let request = FileRequest::new(&args.file, root, &args.client);
    Ok(match &args.file_type_hint {
        Some(hint) => request.with_file_type_hint(hint),
        None => request,
    })
}
