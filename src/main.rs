use clap::{CommandFactory, Parser};
use partner_etl::cli::{args::Args, commands};
use std::process;
use tokio::sync::watch;

fn main() {
    let args = Args::parse();

    // Without a subcommand, show help instead of failing
    if args.command.is_none() {
        let _ = Args::command().print_help();
        println!();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // First Ctrl+C stops scheduling new files, in-flight ones finish
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, finishing files in progress...");
                let _ = shutdown_tx.send(true);
                // Keep the sender alive so receivers never see a closed channel
                std::future::pending::<()>().await;
            }
        });

        commands::run(args, shutdown_rx).await
    });

    match result {
        Ok(summary) if summary.is_clean() => process::exit(0),
        Ok(_) => process::exit(2),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
