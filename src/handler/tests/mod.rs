//! Tests for handlers, dispatch and relocation
//!
//! Every test works inside its own temporary `<root>/HEINZ/inbox` tree with a
//! clock fixed at 2024-03-15 09:05.

pub mod backup_tests;

use super::{Archiver, FileHandler, FixedClock, HandlerPredicate, StatusRecorder};
use crate::catalog::InMemoryCatalog;
use crate::checkers::CheckerRegistry;
use crate::entities::{MappedRow, RowMapper};
use crate::error::Result;
use crate::models::FileRequest;
use crate::pipeline::Pipeline;
use crate::reader::TextFileReader;
use crate::repository::InMemoryRepository;
use crate::schema::{DataType, FieldDefinition, FileType};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const CLIENT: &str = "HEINZ";
pub const FILE_TYPE: &str = "HEINZ_ORDERS";

pub fn test_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 5, 0)
        .unwrap()
}

/// ORDER;PRODUCT;QTY;WAREHOUSE keyed on ORDER + PRODUCT
pub fn create_test_file_type() -> FileType {
    FileType::delimited(
        FILE_TYPE,
        ';',
        vec![
            FieldDefinition::new("ORDER", DataType::Text).required(),
            FieldDefinition::new("PRODUCT", DataType::Text).required(),
            FieldDefinition::new("QTY", DataType::Integer)
                .required()
                .with_min(1.0),
            FieldDefinition::new("WAREHOUSE", DataType::Text),
        ],
    )
    .with_natural_key(&["ORDER", "PRODUCT"])
}

/// Temporary inbound tree for one client
pub struct TestInbox {
    pub dir: TempDir,
}

impl TestInbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(CLIENT).join("inbox")).unwrap();
        Self { dir }
    }

    pub fn inbox(&self) -> PathBuf {
        self.dir.path().join(CLIENT).join("inbox")
    }

    pub fn client_dir(&self) -> PathBuf {
        self.dir.path().join(CLIENT)
    }

    /// Write `content` to `<inbox>/<subdirectory>/<name>` and build its request
    pub fn drop_file(&self, subdirectory: &str, name: &str, content: &str) -> FileRequest {
        let dir = self.inbox().join(subdirectory);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        FileRequest::new(path, self.inbox(), CLIENT)
    }

    /// Expected archive path for a file handled at [`test_instant`]
    pub fn archived(&self, archive: &str, subdirectory: &str, name: &str) -> PathBuf {
        self.client_dir()
            .join(archive)
            .join(subdirectory)
            .join("202403")
            .join("20240315")
            .join(format!("20240315-0905-{}", name))
    }
}

/// Status recorder remembering each call as a short label
#[derive(Default)]
pub struct RecordingStatus {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl StatusRecorder for RecordingStatus {
    fn mark_valid(&self, _request: &FileRequest, records: usize) -> Result<()> {
        self.calls.lock().unwrap().push(format!("valid:{}", records));
        Ok(())
    }

    fn mark_invalid_by_structure(&self, _request: &FileRequest, errors: &[String]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("structure:{}", errors.len()));
        Ok(())
    }

    fn mark_invalid_by_exception(
        &self,
        _request: &FileRequest,
        kind: &str,
        _message: &str,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(format!("exception:{}", kind));
        Ok(())
    }
}

pub fn create_test_archiver() -> Arc<Archiver> {
    Arc::new(Archiver::new("processed", "errors").with_clock(Arc::new(FixedClock(test_instant()))))
}

/// Collaborators of a test handler, kept for assertions
pub struct TestHandler {
    pub handler: FileHandler<MappedRow>,
    pub repository: Arc<InMemoryRepository<MappedRow>>,
    pub status: Arc<RecordingStatus>,
}

pub fn create_test_handler(
    name: &str,
    subdirectory: &str,
    file_pattern: &str,
    file_type_code: &str,
    repository: InMemoryRepository<MappedRow>,
) -> TestHandler {
    let catalog = InMemoryCatalog::from_file_types(vec![create_test_file_type()]).unwrap();
    let repository = Arc::new(repository);
    let status = Arc::new(RecordingStatus::default());

    let handler = FileHandler::new(
        name,
        HandlerPredicate::new(CLIENT, Path::new(subdirectory), file_pattern).unwrap(),
        file_type_code,
        Arc::new(catalog),
        Arc::new(TextFileReader::new()),
        Pipeline::standard(Arc::new(CheckerRegistry::standard()), Arc::new(RowMapper)),
        repository.clone(),
        status.clone(),
        create_test_archiver(),
    );

    TestHandler {
        handler,
        repository,
        status,
    }
}

/// Handler for `<inbox>/SALIDAS/*.csv` saving into memory
pub fn create_default_handler() -> TestHandler {
    create_test_handler(
        "heinz-orders",
        "SALIDAS",
        r"(?i).*\.csv",
        FILE_TYPE,
        InMemoryRepository::new(),
    )
}
