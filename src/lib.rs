//! Partner ETL Library
//!
//! Batch ingestion of flat files dropped by trading partners into per-client
//! inboxes. Every file is claimed by exactly one handler, pushed through a
//! pipeline of validation stages and either saved as a whole or rejected as a
//! whole, then moved into a dated processed or errors archive.
//!
//! This library provides tools for:
//! - Declaring file types (delimited or fixed width) with typed, bounded fields
//! - Splitting, structural checks, per-field checker chains and cross-field rules
//! - Duplicate detection on natural keys
//! - Mapping validated rows into entities and saving them all-or-nothing
//! - Handler dispatch by client, subdirectory and file name pattern
//! - Archive routing with an in-place `.error` rename when relocation fails

pub mod catalog;
pub mod checkers;
pub mod config;
pub mod constants;
pub mod entities;
pub mod error;
pub mod handler;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod repository;
pub mod schema;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::EtlConfig;
pub use error::{EtlError, FieldError, Result};
pub use handler::{Dispatcher, HandleReport, Handler, Outcome, Relocation, build_dispatcher};
pub use models::{FileBatch, FileRecord, FileRequest};
pub use schema::{DataType, FieldDefinition, FileType};
