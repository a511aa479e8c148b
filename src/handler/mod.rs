//! File handlers
//!
//! A handler claims inbound files by client, relative subdirectory and file
//! name pattern, then runs the extract, transform and load sequence:
//!
//! 1. Look up the file type in the catalog
//! 2. Extract the text with its [`Reader`]
//! 3. Run the [`Pipeline`]; any record or batch error is a structural failure
//! 4. Save every entity through the [`Repository`] in one operation
//! 5. Record the file status
//! 6. Relocate the file to the processed or errors archive
//!
//! Steps 1-4 are classified into an [`Outcome`]; steps 5 and 6 always run.

pub mod backup;
pub mod builder;
pub mod dispatch;
pub mod status;

#[cfg(test)]
mod tests;

pub use backup::{ArchiveTarget, Archiver, Clock, FixedClock, Relocation, SystemClock};
pub use builder::build_dispatcher;
pub use dispatch::Dispatcher;
pub use status::{JsonLinesStatusRecorder, StatusRecorder, TracingStatusRecorder};

use crate::catalog::FileTypeCatalog;
use crate::error::{EtlError, Result};
use crate::models::{FileBatch, FileRequest};
use crate::pipeline::Pipeline;
use crate::reader::Reader;
use crate::repository::Repository;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Client, subdirectory and file name conditions a request must all meet
#[derive(Debug, Clone)]
pub struct HandlerPredicate {
    client: String,
    subdirectory: PathBuf,
    file_pattern: Regex,
}

impl HandlerPredicate {
    /// `file_pattern` must match the whole file name
    pub fn new(
        client: impl Into<String>,
        subdirectory: impl Into<PathBuf>,
        file_pattern: &str,
    ) -> Result<Self> {
        let anchored = format!("^(?:{})$", file_pattern);
        let file_pattern = Regex::new(&anchored).map_err(|e| {
            EtlError::configuration(format!("invalid file pattern '{}': {}", file_pattern, e))
        })?;

        Ok(Self {
            client: client.into(),
            subdirectory: subdirectory.into(),
            file_pattern,
        })
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn subdirectory(&self) -> &Path {
        &self.subdirectory
    }

    /// Pattern as configured, without anchors
    pub fn pattern(&self) -> &str {
        let anchored = self.file_pattern.as_str();
        anchored
            .strip_prefix("^(?:")
            .and_then(|p| p.strip_suffix(")$"))
            .unwrap_or(anchored)
    }

    pub fn matches(&self, request: &FileRequest) -> bool {
        self.client == request.client()
            && self.subdirectory == request.subdirectory()
            && self.file_pattern.is_match(&request.file_name())
    }

    /// Identity used to reject overlapping handler declarations
    pub fn key(&self) -> (String, PathBuf, String) {
        (
            self.client.clone(),
            self.subdirectory.clone(),
            self.pattern().to_string(),
        )
    }
}

/// Classified result of extract, transform and load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Processed { records: usize },
    Structural { errors: Vec<String> },
    Exceptional { kind: String, message: String },
}

impl Outcome {
    pub fn from_result(result: Result<usize>) -> Self {
        match result {
            Ok(records) => Outcome::Processed { records },
            Err(EtlError::Structural { errors }) => Outcome::Structural { errors },
            Err(e) => Outcome::Exceptional {
                kind: e.kind_name(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Processed { .. })
    }

    pub fn target(&self) -> ArchiveTarget {
        if self.is_processed() {
            ArchiveTarget::Processed
        } else {
            ArchiveTarget::Errors
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Processed { .. } => "processed",
            Outcome::Structural { .. } => "structural",
            Outcome::Exceptional { .. } => "exceptional",
        }
    }
}

/// Everything that happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleReport {
    pub path: PathBuf,
    pub handler: String,
    pub outcome: Outcome,
    pub relocation: Relocation,
}

pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn predicate(&self) -> &HandlerPredicate;

    fn can_handle(&self, request: &FileRequest) -> bool {
        self.predicate().matches(request)
    }

    /// Process the file and relocate it; never leaves it unaccounted for
    fn handle(&self, request: &FileRequest) -> HandleReport;
}

/// Handler for one file type producing entities of type `T`
pub struct FileHandler<T> {
    name: String,
    predicate: HandlerPredicate,
    file_type_code: String,
    catalog: Arc<dyn FileTypeCatalog>,
    reader: Arc<dyn Reader>,
    pipeline: Pipeline<T>,
    repository: Arc<dyn Repository<T>>,
    status: Arc<dyn StatusRecorder>,
    archiver: Arc<Archiver>,
}

impl<T: 'static> FileHandler<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        predicate: HandlerPredicate,
        file_type_code: impl Into<String>,
        catalog: Arc<dyn FileTypeCatalog>,
        reader: Arc<dyn Reader>,
        pipeline: Pipeline<T>,
        repository: Arc<dyn Repository<T>>,
        status: Arc<dyn StatusRecorder>,
        archiver: Arc<Archiver>,
    ) -> Self {
        Self {
            name: name.into(),
            predicate,
            file_type_code: file_type_code.into(),
            catalog,
            reader,
            pipeline,
            repository,
            status,
            archiver,
        }
    }

    pub fn file_type_code(&self) -> &str {
        &self.file_type_code
    }

    /// Extract, transform and load; the number of saved entities on success
    pub fn process(&self, request: &FileRequest) -> Result<usize> {
        let file_type = self
            .catalog
            .find_file_type_by_code(&self.file_type_code)
            .ok_or_else(|| EtlError::UnknownFileType {
                code: self.file_type_code.clone(),
            })?;

        let data = self.reader.read(request.path())?;
        let batch = FileBatch::new(request.path(), file_type, data);
        let batch = self.pipeline.run(batch)?;

        if batch.has_error() {
            return Err(EtlError::Structural {
                errors: batch.error_report(),
            });
        }

        debug!(
            "{}: {} valid record(s) in {}",
            self.name,
            batch.valid_count(),
            request.path().display()
        );
        let entities = batch.into_entities();
        self.repository.save_all_from(request.path(), entities)
    }

    fn record_status(&self, request: &FileRequest, outcome: &Outcome) {
        let result = match outcome {
            Outcome::Processed { records } => self.status.mark_valid(request, *records),
            Outcome::Structural { errors } => self.status.mark_invalid_by_structure(request, errors),
            Outcome::Exceptional { kind, message } => {
                self.status.mark_invalid_by_exception(request, kind, message)
            }
        };
        if let Err(e) = result {
            error!(
                "Could not record status of {}: {}",
                request.path().display(),
                e
            );
        }
    }
}

impl<T: 'static> Handler for FileHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&self) -> &HandlerPredicate {
        &self.predicate
    }

    fn handle(&self, request: &FileRequest) -> HandleReport {
        info!("{}: handling {}", self.name, request.path().display());

        let outcome = Outcome::from_result(self.process(request));
        self.record_status(request, &outcome);
        let relocation = self.archiver.archive(request, outcome.target());

        HandleReport {
            path: request.path().to_path_buf(),
            handler: self.name.clone(),
            outcome,
            relocation,
        }
    }
}
