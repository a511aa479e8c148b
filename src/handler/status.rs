//! File status reporting
//!
//! Every handled file is marked exactly once, before it is relocated: valid,
//! invalid by structure (with the aggregated per-record report), or invalid by
//! exception.

use crate::error::{EtlError, Result};
use crate::models::FileRequest;
use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

pub trait StatusRecorder: Send + Sync {
    fn mark_valid(&self, request: &FileRequest, records: usize) -> Result<()>;

    fn mark_invalid_by_structure(&self, request: &FileRequest, errors: &[String]) -> Result<()>;

    fn mark_invalid_by_exception(&self, request: &FileRequest, kind: &str, message: &str)
    -> Result<()>;
}

/// Reports status through the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatusRecorder;

impl StatusRecorder for TracingStatusRecorder {
    fn mark_valid(&self, request: &FileRequest, records: usize) -> Result<()> {
        info!(
            "{} [{}]: valid, {} record(s) saved",
            request.path().display(),
            request.client(),
            records
        );
        Ok(())
    }

    fn mark_invalid_by_structure(&self, request: &FileRequest, errors: &[String]) -> Result<()> {
        warn!(
            "{} [{}]: invalid structure, {} error(s)",
            request.path().display(),
            request.client(),
            errors.len()
        );
        for error in errors {
            warn!("  {}", error);
        }
        Ok(())
    }

    fn mark_invalid_by_exception(
        &self,
        request: &FileRequest,
        kind: &str,
        message: &str,
    ) -> Result<()> {
        warn!(
            "{} [{}]: failed with {}: {}",
            request.path().display(),
            request.client(),
            kind,
            message
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Valid,
    InvalidStructure,
    InvalidException,
}

/// One line of the status journal
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub timestamp: String,
    pub client: String,
    pub path: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl StatusEntry {
    fn new(request: &FileRequest, status: FileStatus) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            client: request.client().to_string(),
            path: request.path().to_path_buf(),
            status,
            records: None,
            error_kind: None,
            errors: Vec::new(),
        }
    }
}

/// Appends one JSON line per file to a journal, and logs like [`TracingStatusRecorder`]
#[derive(Debug)]
pub struct JsonLinesStatusRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesStatusRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &StatusEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| EtlError::persistence(1, format!("status serialization failed: {}", e)))?;
        line.push('\n');

        let _guard = self
            .lock
            .lock()
            .map_err(|_| EtlError::persistence(1, "status journal lock poisoned"))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl StatusRecorder for JsonLinesStatusRecorder {
    fn mark_valid(&self, request: &FileRequest, records: usize) -> Result<()> {
        TracingStatusRecorder.mark_valid(request, records)?;
        let mut entry = StatusEntry::new(request, FileStatus::Valid);
        entry.records = Some(records);
        self.append(&entry)
    }

    fn mark_invalid_by_structure(&self, request: &FileRequest, errors: &[String]) -> Result<()> {
        TracingStatusRecorder.mark_invalid_by_structure(request, errors)?;
        let mut entry = StatusEntry::new(request, FileStatus::InvalidStructure);
        entry.errors = errors.to_vec();
        self.append(&entry)
    }

    fn mark_invalid_by_exception(
        &self,
        request: &FileRequest,
        kind: &str,
        message: &str,
    ) -> Result<()> {
        TracingStatusRecorder.mark_invalid_by_exception(request, kind, message)?;
        let mut entry = StatusEntry::new(request, FileStatus::InvalidException);
        entry.error_kind = Some(kind.to_string());
        entry.errors = vec![message.to_string()];
        self.append(&entry)
    }
}
