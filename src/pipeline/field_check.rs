//! Per-field checking through the checker registry

use crate::checkers::{CheckContext, CheckerRegistry};
use crate::models::FileBatch;

/// Run every field of every non-`Error` record through its checker chain.
///
/// Failures are aggregated per record, never short-circuited. A record with no
/// failure becomes `Valid` and keeps its parsed values.
pub fn check_fields<T>(
    mut batch: FileBatch<T>,
    registry: &CheckerRegistry,
    context: &CheckContext,
) -> FileBatch<T> {
    let file_type = batch.file_type.clone();

    for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
        let mut values = Vec::with_capacity(file_type.fields.len());
        let mut failures = Vec::new();

        for (definition, raw) in file_type.fields.iter().zip(record.fields.iter()) {
            match registry.check(definition, raw, context) {
                Ok(value) => values.push(value),
                Err(e) => {
                    values.push(None);
                    failures.push(e.to_message());
                }
            }
        }

        record.values = values;
        if failures.is_empty() {
            record.mark_valid();
        } else {
            for failure in failures {
                record.fail(failure);
            }
        }
    }

    batch
}
