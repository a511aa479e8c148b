//! Record shape checks and case normalization

use crate::models::FileBatch;

/// A file without records gets a single batch-level error
pub fn check_empty_file<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    if batch.records.is_empty() {
        batch.add_structural_error("EMPTY_FILE_ERROR: file has no records");
    }
    batch
}

/// Records whose field count differs from the declared column count become `Error`
pub fn check_column_count<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    let expected = batch.file_type.column_count();
    for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
        let found = record.fields.len();
        if found != expected {
            record.fail(format!(
                "COLUMN_COUNT_ERROR: expected {} columns, found {}",
                expected, found
            ));
        }
    }
    batch
}

/// Uppercase the configured fields; the raw line is left untouched
pub fn normalize_case<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    let indices: Vec<usize> = batch
        .file_type
        .uppercase
        .iter()
        .filter_map(|name| batch.file_type.field_index(name))
        .collect();
    if indices.is_empty() {
        return batch;
    }

    for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
        for &index in &indices {
            if let Some(value) = record.fields.get_mut(index) {
                *value = value.to_uppercase();
            }
        }
    }
    batch
}
