//! Per-field checking stage

use super::*;
use crate::models::{FieldValue, RecordStatus};
use chrono::{NaiveDate, NaiveTime};

fn all_types() -> FileType {
    FileType::delimited(
        "ALL_TYPES",
        '|',
        vec![
            FieldDefinition::new("INT", DataType::Integer).required(),
            FieldDefinition::new("DEC", DataType::Decimal).required(),
            FieldDefinition::new("TXT", DataType::Text).required().with_max(5.0),
            FieldDefinition::new("DATE", DataType::Date).required(),
            FieldDefinition::new("TIME", DataType::Time).required(),
            FieldDefinition::new("STAMP", DataType::DateTime).required(),
            FieldDefinition::new("FLAG", DataType::Boolean).required(),
            FieldDefinition::new("CUTOFF", DataType::BoundedTime)
                .required()
                .with_max(60.0),
        ],
    )
}

#[test]
fn test_valid_row_for_every_type() {
    let batch = create_test_batch(
        all_types(),
        "42|3,5|abc|2024-03-01|08:15|2024-03-01 08:15:00|S|10:30\n",
    );
    let batch = split_and_check(batch);
    let record = &batch.records[0];

    assert_eq!(record.status(), RecordStatus::Valid, "{:?}", record.errors());
    assert_eq!(record.value(0), Some(&FieldValue::Integer(42)));
    assert_eq!(record.value(1), Some(&FieldValue::Decimal(3.5)));
    assert_eq!(record.value(2), Some(&FieldValue::Text("abc".to_string())));
    assert_eq!(
        record.value(3),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
    );
    assert_eq!(
        record.value(4),
        Some(&FieldValue::Time(NaiveTime::from_hms_opt(8, 15, 0).unwrap()))
    );
    assert_eq!(record.value(6), Some(&FieldValue::Boolean(true)));
}

#[test]
fn test_required_integer_rejects_text() {
    let batch = create_test_batch(create_test_file_type(), "A;P1;abc;W\n");
    let batch = split_and_check(batch);
    let record = &batch.records[0];

    assert!(record.is_error());
    assert_eq!(record.errors().len(), 1);
    assert!(record.errors()[0].starts_with("PARSE_ERROR"));
    assert!(record.errors()[0].contains("QTY"));
}

#[test]
fn test_errors_are_aggregated_per_record() {
    let batch = create_test_batch(create_test_file_type(), ";P1;0;W\n");
    let batch = split_and_check(batch);
    let errors = batch.records[0].errors();

    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("REQUIRED_ERROR"));
    assert!(errors[1].starts_with("CONSTRAINT_ERROR"));
}

#[test]
fn test_blank_optional_field_is_none() {
    let batch = create_test_batch(create_test_file_type(), "A;P1;3;\n");
    let batch = split_and_check(batch);
    let record = &batch.records[0];

    assert_eq!(record.status(), RecordStatus::Valid);
    assert_eq!(record.values.len(), 4);
    assert_eq!(record.value(3), None);
}

#[test]
fn test_bounded_time_beyond_window_fails() {
    let batch = create_test_batch(
        all_types(),
        "42|3,5|abc|2024-03-01|08:15|2024-03-01 08:15:00|S|11:30\n",
    );
    let batch = split_and_check(batch);
    let record = &batch.records[0];

    assert!(record.is_error());
    assert!(record.errors()[0].contains("CUTOFF"));
    assert!(record.errors()[0].starts_with("CONSTRAINT_ERROR"));
}

#[test]
fn test_huge_bounded_time_window_is_refused_and_never_panics() {
    let file_type = FileType::delimited(
        "CUTOFFS",
        ';',
        vec![
            FieldDefinition::new("CUTOFF", DataType::BoundedTime)
                .required()
                .with_max(1e12),
        ],
    );
    assert!(file_type.validate().is_err());

    let batch = split_and_check(create_test_batch(file_type, "10:00\n23:59\n"));
    assert_eq!(batch.error_count(), 0);
    assert_eq!(batch.records[1].status(), RecordStatus::Valid);
}
