//! Error handling for file ingestion.
//!
//! [`EtlError`] covers everything that aborts or reroutes a whole file;
//! [`FieldError`] is the record-level failure produced by the checker chain
//! and aggregated into a record's error list instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("File type '{code}' is not registered in the catalog")]
    UnknownFileType { code: String },

    #[error("Structural validation failed with {} error(s)", .errors.len())]
    Structural { errors: Vec<String> },

    #[error("Mapping failed at line {line}: {reason}")]
    Mapping { line: usize, reason: String },

    #[error("Persistence failed for {count} record(s): {reason}")]
    Persistence { count: usize, reason: String },

    #[error("No handler accepts {path}")]
    NoHandler { path: PathBuf },

    #[error("Handlers {handlers:?} all accept {path}; predicates must be mutually exclusive")]
    AmbiguousHandler {
        path: PathBuf,
        handlers: Vec<String>,
    },

    #[error("Failed to archive {path} to {destination}: {source}")]
    Relocation {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EtlError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a mapping error for the record at `line`
    pub fn mapping(line: usize, reason: impl Into<String>) -> Self {
        Self::Mapping {
            line,
            reason: reason.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(count: usize, reason: impl Into<String>) -> Self {
        Self::Persistence {
            count,
            reason: reason.into(),
        }
    }

    /// Stable class name used in status reports and fatal `.error` file names.
    ///
    /// I/O failures report the underlying [`std::io::ErrorKind`], so a relocation
    /// that hits an existing destination yields `AlreadyExists`.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Io(e) => format!("{:?}", e.kind()),
            Self::Relocation { source, .. } => format!("{:?}", source.kind()),
            Self::Read { .. } => "Read".to_string(),
            Self::UnknownFileType { .. } => "UnknownFileType".to_string(),
            Self::Structural { .. } => "Structural".to_string(),
            Self::Mapping { .. } => "Mapping".to_string(),
            Self::Persistence { .. } => "Persistence".to_string(),
            Self::NoHandler { .. } => "NoHandler".to_string(),
            Self::AmbiguousHandler { .. } => "AmbiguousHandler".to_string(),
            Self::Configuration { .. } => "Configuration".to_string(),
        }
    }
}

/// Field-level validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field {field} is required")]
    Required { field: String },

    #[error("field {field}: '{value}' is not a valid value, valid examples: {examples}")]
    Parse {
        field: String,
        value: String,
        examples: String,
    },

    #[error("field {field}: '{value}' violates {bound}")]
    Constraint {
        field: String,
        value: String,
        bound: String,
    },
}

impl FieldError {
    /// Error code carried into record error messages
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required { .. } => "REQUIRED_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Constraint { .. } => "CONSTRAINT_ERROR",
        }
    }

    /// `CODE: message` form appended to a record's error list
    pub fn to_message(&self) -> String {
        format!("{}: {}", self.code(), self)
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
