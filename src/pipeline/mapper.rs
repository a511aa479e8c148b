//! Mapping of checked records to typed entities

use crate::error::{EtlError, Result};
use crate::models::{FieldValue, FileBatch};
use crate::schema::FileType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Converts one checked record into an entity.
///
/// A mapping failure means the configuration and the mapper disagree, so it
/// aborts the whole file instead of being recorded on the record.
pub trait EntityMapper<T>: Send + Sync {
    fn map(&self, record: &RecordView<'_>) -> Result<T>;
}

/// Read-only, name-based access to a checked record
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    file_type: &'a FileType,
    line_number: usize,
    line: &'a str,
    fields: &'a [String],
    values: &'a [Option<FieldValue>],
}

impl<'a> RecordView<'a> {
    pub fn new(
        file_type: &'a FileType,
        line_number: usize,
        line: &'a str,
        fields: &'a [String],
        values: &'a [Option<FieldValue>],
    ) -> Self {
        Self {
            file_type,
            line_number,
            line,
            fields,
            values,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn file_type(&self) -> &'a FileType {
        self.file_type
    }

    /// Field names paired with their parsed values, in declared order
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, Option<&'a FieldValue>)> + 'a {
        let values = self.values;
        self.file_type
            .fields
            .iter()
            .enumerate()
            .map(move |(i, f)| (f.name.as_str(), values.get(i).and_then(Option::as_ref)))
    }

    /// Raw (normalized) text of a field
    pub fn raw(&self, name: &str) -> Option<&'a str> {
        let index = self.file_type.field_index(name)?;
        self.fields.get(index).map(String::as_str)
    }

    /// Parsed value of a field; `None` when blank or unknown
    pub fn value(&self, name: &str) -> Option<&'a FieldValue> {
        let index = self.file_type.field_index(name)?;
        self.values.get(index).and_then(Option::as_ref)
    }

    fn require(&self, name: &str) -> Result<&'a FieldValue> {
        if self.file_type.field_index(name).is_none() {
            return Err(EtlError::mapping(
                self.line_number,
                format!("file type '{}' has no field {}", self.file_type.code, name),
            ));
        }
        self.value(name).ok_or_else(|| {
            EtlError::mapping(self.line_number, format!("field {} has no value", name))
        })
    }

    fn mismatch(&self, name: &str, expected: &str, found: &FieldValue) -> EtlError {
        EtlError::mapping(
            self.line_number,
            format!("field {} is not {} (found '{}')", name, expected, found),
        )
    }

    pub fn text(&self, name: &str) -> Result<String> {
        match self.require(name)? {
            FieldValue::Text(v) => Ok(v.clone()),
            other => Ok(other.to_string()),
        }
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.value(name).map(FieldValue::to_string)
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            FieldValue::Integer(v) => Ok(*v),
            other => Err(self.mismatch(name, "an integer", other)),
        }
    }

    pub fn decimal(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            FieldValue::Decimal(v) => Ok(*v),
            FieldValue::Integer(v) => Ok(*v as f64),
            other => Err(self.mismatch(name, "a decimal", other)),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate> {
        match self.require(name)? {
            FieldValue::Date(v) => Ok(*v),
            FieldValue::DateTime(v) => Ok(v.date()),
            other => Err(self.mismatch(name, "a date", other)),
        }
    }

    pub fn time(&self, name: &str) -> Result<NaiveTime> {
        match self.require(name)? {
            FieldValue::Time(v) => Ok(*v),
            other => Err(self.mismatch(name, "a time", other)),
        }
    }

    pub fn datetime(&self, name: &str) -> Result<NaiveDateTime> {
        match self.require(name)? {
            FieldValue::DateTime(v) => Ok(*v),
            other => Err(self.mismatch(name, "a date and time", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            FieldValue::Boolean(v) => Ok(*v),
            other => Err(self.mismatch(name, "a boolean", other)),
        }
    }
}

/// Map every non-`Error` record; the first mapping failure aborts
pub fn map_entities<T>(mut batch: FileBatch<T>, mapper: &dyn EntityMapper<T>) -> Result<FileBatch<T>> {
    let file_type = batch.file_type.clone();

    for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
        let view = RecordView::new(
            &file_type,
            record.line_number,
            &record.line,
            &record.fields,
            &record.values,
        );
        let entity = mapper.map(&view)?;
        record.entity = Some(entity);
    }

    Ok(batch)
}
