//! Core data structures for file ingestion.
//!
//! Defines the inbound [`FileRequest`], the per-row [`FileRecord`] with its
//! status lifecycle, the per-file [`FileBatch`] threaded through the pipeline,
//! and the typed [`FieldValue`] produced by field checking.

use crate::schema::FileType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One inbound file, as announced by the collaborator that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    path: PathBuf,
    root: PathBuf,
    client: String,
    subdirectory: PathBuf,
    file_type_hint: Option<String>,
}

impl FileRequest {
    /// Create a request for `path` found under the client inbox `root`.
    ///
    /// The relative subdirectory is the part of the file's parent below `root`;
    /// files outside `root` get an empty subdirectory.
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>, client: impl Into<String>) -> Self {
        let path = path.into();
        let root = root.into();
        let subdirectory = path
            .parent()
            .and_then(|parent| parent.strip_prefix(&root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            path,
            root,
            client: client.into(),
            subdirectory,
            file_type_hint: None,
        }
    }

    /// Attach a file type hint inferred by the collaborator (usually the extension)
    pub fn with_file_type_hint(mut self, hint: impl Into<String>) -> Self {
        self.file_type_hint = Some(hint.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn subdirectory(&self) -> &Path {
        &self.subdirectory
    }

    pub fn file_type_hint(&self) -> Option<&str> {
        self.file_type_hint.as_deref()
    }

    /// Bare file name, empty when the path has none
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lifecycle of a record through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Pending,
    Valid,
    Error,
}

/// Typed value produced by a field's checker chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Decimal(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Date(v) => write!(f, "{}", v),
            FieldValue::Time(v) => write!(f, "{}", v),
            FieldValue::DateTime(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// One logical row of a source file
#[derive(Debug, Clone)]
pub struct FileRecord<T> {
    /// 1-based line position in the source file
    pub line_number: usize,

    /// Raw line text, never modified after splitting
    pub line: String,

    /// Raw field values after splitting (and case normalization)
    pub fields: Vec<String>,

    /// Parsed values, filled by field checking; `None` for blank optional fields
    pub values: Vec<Option<FieldValue>>,

    /// Mapped entity, present once mapping succeeded
    pub entity: Option<T>,

    status: RecordStatus,
    errors: Vec<String>,
}

impl<T> FileRecord<T> {
    /// Create a pending record for a raw line
    pub fn new(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.into(),
            fields: Vec::new(),
            values: Vec::new(),
            entity: None,
            status: RecordStatus::Pending,
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_error(&self) -> bool {
        self.status == RecordStatus::Error
    }

    /// Append an error and move the record to `Error` for good
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RecordStatus::Error;
        self.errors.push(message.into());
    }

    /// Promote to `Valid`; an `Error` record stays `Error`
    pub fn mark_valid(&mut self) {
        if self.status != RecordStatus::Error {
            self.status = RecordStatus::Valid;
        }
    }

    /// Raw value of a field by position
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Parsed value of a field by position
    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index).and_then(Option::as_ref)
    }
}

/// In-memory representation of one source file, owned by one handler run
#[derive(Debug, Clone)]
pub struct FileBatch<T> {
    pub path: PathBuf,
    pub file_type: Arc<FileType>,

    /// Raw text returned by the reader
    pub data: String,

    pub records: Vec<FileRecord<T>>,

    structural_errors: Vec<String>,
}

impl<T> FileBatch<T> {
    /// Create a batch holding the extracted text and no records yet
    pub fn new(path: impl Into<PathBuf>, file_type: Arc<FileType>, data: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type,
            data: data.into(),
            records: Vec::new(),
            structural_errors: Vec::new(),
        }
    }

    /// Record a file-level failure that belongs to no single record
    pub fn add_structural_error(&mut self, message: impl Into<String>) {
        self.structural_errors.push(message.into());
    }

    pub fn structural_errors(&self) -> &[String] {
        &self.structural_errors
    }

    /// True iff any record is `Error`
    pub fn has_structural_error(&self) -> bool {
        self.records.iter().any(FileRecord::is_error)
    }

    /// True if any record is `Error` or a file-level error was raised
    pub fn has_error(&self) -> bool {
        !self.structural_errors.is_empty() || self.has_structural_error()
    }

    pub fn valid_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status() == RecordStatus::Valid)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_error()).count()
    }

    /// Human-readable report: file-level errors first, then one line per record error
    pub fn error_report(&self) -> Vec<String> {
        let mut report = self.structural_errors.clone();
        for record in self.records.iter().filter(|r| r.is_error()) {
            for error in record.errors() {
                report.push(format!("line {}: {}", record.line_number, error));
            }
        }
        report
    }

    /// Consume the batch, keeping the mapped entities in record order
    pub fn into_entities(self) -> Vec<T> {
        self.records.into_iter().filter_map(|r| r.entity).collect()
    }
}
