//! Tests for the batch pipeline and its stages
//!
//! Fixtures build small file types and batches; stage tests run one stage at a
//! time, pipeline tests run the full standard sequence.

pub mod field_check_tests;

use crate::checkers::{CheckContext, CheckerRegistry};
use crate::entities::{MappedRow, RowMapper};
use crate::models::FileBatch;
use crate::schema::{DataType, FieldDefinition, FileType};
use chrono::NaiveDate;
use std::sync::Arc;

use super::Pipeline;

/// Four-column order file: ORDER;PRODUCT;QTY;WAREHOUSE
pub fn create_test_file_type() -> FileType {
    FileType::delimited(
        "TEST_ORDERS",
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
}

/// Batch over `data` with no stage applied yet
pub fn create_test_batch(file_type: FileType, data: &str) -> FileBatch<MappedRow> {
    FileBatch::new("/inbox/test.csv", Arc::new(file_type), data)
}

/// Fixed check context: 2024-03-15 10:00
pub fn create_test_context() -> CheckContext {
    CheckContext::at(
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    )
}

/// Standard pipeline mapping to [`MappedRow`]
pub fn create_test_pipeline() -> Pipeline<MappedRow> {
    Pipeline::standard(Arc::new(CheckerRegistry::standard()), Arc::new(RowMapper))
}

/// Run split, structure and field stages only
pub fn split_and_check(batch: FileBatch<MappedRow>) -> FileBatch<MappedRow> {
    use super::{field_check, splitters, structural};

    let batch = splitters::split_lines(batch);
    let batch = splitters::split_fields(batch).unwrap();
    let batch = structural::check_empty_file(batch);
    let batch = structural::check_column_count(batch);
    let batch = structural::normalize_case(batch);
    field_check::check_fields(
        batch,
        &CheckerRegistry::standard(),
        &create_test_context(),
    )
}
