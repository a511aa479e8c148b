//! Batch transformation pipeline
//!
//! A [`Pipeline`] is an ordered list of named stages. Each stage takes the
//! batch by value and hands it back, possibly with new records, field values,
//! record errors or batch-level errors. A stage returning `Err` aborts the run;
//! that is reserved for defects (bad configuration, mapping failures), while
//! bad input is always recorded on the batch itself.
//!
//! ## Standard stage order
//!
//! 1. `split_lines` - raw text to numbered records
//! 2. `split_fields` - records to raw fields (delimited or fixed width)
//! 3. `empty_file` - zero records is a batch-level error
//! 4. `column_count` - field count must match the file type
//! 5. `uppercase` - case normalization of configured fields
//! 6. `check_fields` - per-field checker chains
//! 7. `rules` - cross-field rules on valid records
//! 8. `duplicates` - natural key uniqueness
//! 9. `map_entities` - valid rows to typed entities

pub mod duplicates;
pub mod field_check;
pub mod mapper;
pub mod restrictions;
pub mod splitters;
pub mod structural;

#[cfg(test)]
mod tests;

pub use mapper::{EntityMapper, RecordView};

use crate::checkers::{CheckContext, CheckerRegistry};
use crate::error::Result;
use crate::models::FileBatch;
use std::sync::Arc;
use tracing::debug;

/// Boxed stage function
pub type StageFn<T> = Box<dyn Fn(FileBatch<T>) -> Result<FileBatch<T>> + Send + Sync>;

struct Stage<T> {
    name: String,
    run: StageFn<T>,
}

/// Ordered, named batch stages
pub struct Pipeline<T> {
    stages: Vec<Stage<T>>,
}

impl<T: 'static> Pipeline<T> {
    /// Pipeline with no stages
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Standard stage sequence ending with `mapper`
    pub fn standard(registry: Arc<CheckerRegistry>, mapper: Arc<dyn EntityMapper<T>>) -> Self {
        Self::new()
            .with_stage("split_lines", |batch| Ok(splitters::split_lines(batch)))
            .with_stage("split_fields", splitters::split_fields)
            .with_stage("empty_file", |batch| Ok(structural::check_empty_file(batch)))
            .with_stage("column_count", |batch| {
                Ok(structural::check_column_count(batch))
            })
            .with_stage("uppercase", |batch| Ok(structural::normalize_case(batch)))
            .with_stage("check_fields", move |batch| {
                Ok(field_check::check_fields(
                    batch,
                    &registry,
                    &CheckContext::now(),
                ))
            })
            .with_stage("rules", |batch| Ok(restrictions::apply_rules(batch)))
            .with_stage("duplicates", |batch| {
                Ok(duplicates::detect_duplicates(batch))
            })
            .with_stage("map_entities", move |batch| {
                mapper::map_entities(batch, mapper.as_ref())
            })
    }

    /// Append a stage
    pub fn with_stage<F>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: Fn(FileBatch<T>) -> Result<FileBatch<T>> + Send + Sync + 'static,
    {
        self.stages.push(Stage {
            name: name.into(),
            run: Box::new(run),
        });
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Apply every stage in order
    pub fn run(&self, mut batch: FileBatch<T>) -> Result<FileBatch<T>> {
        for stage in &self.stages {
            batch = (stage.run)(batch)?;
            debug!(
                "Stage {} on {}: {} record(s), {} in error",
                stage.name,
                batch.path.display(),
                batch.records.len(),
                batch.error_count()
            );
        }
        Ok(batch)
    }
}

impl<T: 'static> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}
