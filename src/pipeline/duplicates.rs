//! Duplicate detection by natural key
//!
//! Records are grouped by the values of the file type's natural-key fields.
//! The first occurrence of a key keeps its status; every later occurrence
//! becomes `Error` and names the line it duplicates. Rows without the declared
//! column count neither claim a key nor get flagged.

use crate::models::FileBatch;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

pub fn detect_duplicates<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    let file_type = batch.file_type.clone();
    if file_type.natural_key.is_empty() {
        return batch;
    }

    let indices: Vec<usize> = file_type
        .natural_key
        .iter()
        .filter_map(|name| file_type.field_index(name))
        .collect();

    let expected = file_type.column_count();
    let mut first_seen: HashMap<Vec<String>, usize> = HashMap::new();
    for record in batch.records.iter_mut() {
        // Split failures and miscounted rows have no trustworthy key
        if record.fields.len() != expected {
            continue;
        }
        let key: Option<Vec<String>> = indices
            .iter()
            .map(|&i| record.field(i).map(str::to_string))
            .collect();
        let Some(key) = key else {
            continue;
        };

        match first_seen.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(record.line_number);
            }
            Entry::Occupied(entry) => {
                record.fail(format!(
                    "DUPLICATE_ERROR: duplicates line {} on key ({})",
                    entry.get(),
                    entry.key().join(", ")
                ));
            }
        }
    }

    batch
}
