//! Check command: validate the configuration and show what it declares

use super::shared::{RunSummary, create_dispatcher};
use crate::config::EtlConfig;
use crate::schema::{FileType, Layout};
use anyhow::Result;
use colored::*;
use std::path::Path;
use tracing::info;

pub async fn run_check(config: EtlConfig) -> Result<RunSummary> {
    // Building the dispatcher runs every validation a real run would
    let dispatcher = create_dispatcher(&config)?;
    info!(
        "Configuration is valid: {} file type(s), {} handler(s)",
        config.file_types.len(),
        dispatcher.handlers().len()
    );

    println!("{}", "Directories".bright_green().bold());
    for line in describe_directories(&config) {
        println!("  {}", line);
    }
    println!("\n{}", "File types".bright_green().bold());
    for file_type in &config.file_types {
        println!("  {}", describe_file_type(file_type));
    }
    println!("\n{}", "Handlers".bright_green().bold());
    for line in describe_handlers(&config) {
        println!("  {}", line);
    }

    Ok(RunSummary::default())
}

fn describe_directories(config: &EtlConfig) -> Vec<String> {
    let dirs = &config.directories;
    vec![
        format!("{} {}", "inbound:".bright_cyan(), dirs.inbound.display()),
        format!("{} <client>/{}", "inbox:".bright_cyan(), dirs.inbox),
        format!("{} {}", "processed:".bright_cyan(), describe_archive(&dirs.processed)),
        format!("{} {}", "errors:".bright_cyan(), describe_archive(&dirs.errors)),
        format!("{} {}", "outputs:".bright_cyan(), config.outputs_dir().display()),
        format!(
            "{} {}",
            "max concurrent files:".bright_cyan(),
            config.performance.max_concurrent_files
        ),
    ]
}

/// Absolute archives are flagged: a move onto another mount is fatal
fn describe_archive(dir: &Path) -> String {
    if dir.is_absolute() {
        format!("{} (must share the inbound filesystem)", dir.display())
    } else {
        format!("<client>/{}", dir.display())
    }
}

pub fn describe_file_type(file_type: &FileType) -> String {
    let layout = match &file_type.layout {
        Layout::Delimited { delimiter, .. } => format!("delimited '{}'", delimiter),
        Layout::FixedWidth => format!("fixed width {}", file_type.total_width()),
    };
    let key = if file_type.natural_key.is_empty() {
        String::new()
    } else {
        format!(", key ({})", file_type.natural_key.join(", "))
    };

    format!(
        "{} {} field(s), {}{}",
        file_type.code.bright_white().bold(),
        file_type.fields.len(),
        layout,
        key
    )
}

fn describe_handlers(config: &EtlConfig) -> Vec<String> {
    config
        .handlers
        .iter()
        .map(|handler| {
            format!(
                "{} {}/{}/{} ~ {} -> {} ({:?})",
                handler.name.bright_white().bold(),
                handler.client,
                config.directories.inbox,
                handler.subdirectory.display(),
                handler.file_pattern,
                handler.file_type,
                handler.entity
            )
        })
        .collect()
}
