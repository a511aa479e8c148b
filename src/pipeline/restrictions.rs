//! Cross-field business rules

use crate::models::{FileBatch, FileRecord, RecordStatus};
use crate::schema::{FieldRule, FileType};

/// Apply the file type's rules to every record still `Valid`
pub fn apply_rules<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    let file_type = batch.file_type.clone();
    if file_type.rules.is_empty() {
        return batch;
    }

    for record in batch
        .records
        .iter_mut()
        .filter(|r| r.status() == RecordStatus::Valid)
    {
        for rule in &file_type.rules {
            if let Some(violation) = evaluate(rule, &file_type, record) {
                record.fail(format!("RULE_ERROR: {}", violation));
            }
        }
    }

    batch
}

fn field_value<'a, T>(file_type: &FileType, record: &'a FileRecord<T>, name: &str) -> &'a str {
    file_type
        .field_index(name)
        .and_then(|index| record.field(index))
        .unwrap_or("")
}

/// Describe the violation of `rule`, or `None` when the record satisfies it.
/// Blank values only ever fail `required_with`.
fn evaluate<T>(rule: &FieldRule, file_type: &FileType, record: &FileRecord<T>) -> Option<String> {
    match rule {
        FieldRule::OneOf { field, values } => {
            let value = field_value(file_type, record, field);
            if value.is_empty() || values.iter().any(|v| v == value) {
                None
            } else {
                Some(format!(
                    "field {}: '{}' is not one of [{}]",
                    field,
                    value,
                    values.join(", ")
                ))
            }
        }
        FieldRule::OneOfWhen {
            field,
            when_field,
            codes,
        } => {
            let value = field_value(file_type, record, field);
            let when = field_value(file_type, record, when_field);
            let allowed = codes.get(when).map(Vec::as_slice).unwrap_or(&[]);
            if value.is_empty() || allowed.iter().any(|v| v == value) {
                None
            } else {
                Some(format!(
                    "field {}: '{}' is not valid when {} is '{}' (valid: [{}])",
                    field,
                    value,
                    when_field,
                    when,
                    allowed.join(", ")
                ))
            }
        }
        FieldRule::NotEqual { field, other } => {
            let value = field_value(file_type, record, field);
            let other_value = field_value(file_type, record, other);
            if !value.is_empty() && value == other_value {
                Some(format!(
                    "fields {} and {} must differ, both are '{}'",
                    field, other, value
                ))
            } else {
                None
            }
        }
        FieldRule::RequiredWith { field, other } => {
            let value = field_value(file_type, record, field);
            let other_value = field_value(file_type, record, other);
            if value.is_empty() && !other_value.is_empty() {
                Some(format!("field {} is required when {} is present", field, other))
            } else {
                None
            }
        }
    }
}
