//! Line and field splitting

use crate::error::{EtlError, Result};
use crate::models::{FileBatch, FileRecord};
use crate::schema::{FileType, Layout};

/// Cut the raw text into one pending record per non-blank line.
///
/// Records keep their 1-based position in the file; the first `skip_lines`
/// physical lines are dropped.
pub fn split_lines<T>(mut batch: FileBatch<T>) -> FileBatch<T> {
    let skip = batch.file_type.skip_lines;
    let records: Vec<FileRecord<T>> = batch
        .data
        .lines()
        .enumerate()
        .skip(skip)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| FileRecord::new(index + 1, line))
        .collect();

    batch.records = records;
    batch
}

/// Split every record's line into trimmed fields according to the layout.
///
/// Malformed lines become `Error` records; only an unusable layout aborts.
pub fn split_fields<T>(mut batch: FileBatch<T>) -> Result<FileBatch<T>> {
    let file_type = batch.file_type.clone();

    match file_type.layout {
        Layout::Delimited { delimiter, quote } => {
            let delimiter = ascii_byte(delimiter, "delimiter", &file_type)?;
            let quote = ascii_byte(quote, "quote", &file_type)?;
            for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
                match split_delimited(&record.line, delimiter, quote) {
                    Ok(fields) => record.fields = fields,
                    Err(message) => record.fail(format!("SPLIT_ERROR: {}", message)),
                }
            }
        }
        Layout::FixedWidth => {
            let widths: Vec<usize> = file_type
                .fields
                .iter()
                .map(|f| f.width.unwrap_or(0))
                .collect();
            for record in batch.records.iter_mut().filter(|r| !r.is_error()) {
                match split_fixed(&record.line, &widths) {
                    Ok(fields) => record.fields = fields,
                    Err(message) => record.fail(format!("SPLIT_ERROR: {}", message)),
                }
            }
        }
    }

    Ok(batch)
}

fn ascii_byte(c: char, what: &str, file_type: &FileType) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(EtlError::configuration(format!(
            "file type '{}': {} '{}' must be an ASCII character",
            file_type.code, what, c
        )))
    }
}

fn split_delimited(line: &str, delimiter: u8, quote: u8) -> std::result::Result<Vec<String>, String> {
    // Escaped quotes come in pairs, so an odd count means one was never closed
    if line.bytes().filter(|b| *b == quote).count() % 2 != 0 {
        return Err(format!("unterminated quote in line '{}'", line));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(quote)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(|f| f.trim().to_string()).collect()),
        Some(Err(e)) => Err(format!("malformed line: {}", e)),
        None => Ok(Vec::new()),
    }
}

fn split_fixed(line: &str, widths: &[usize]) -> std::result::Result<Vec<String>, String> {
    let chars: Vec<char> = line.chars().collect();
    let required: usize = widths.iter().sum();
    if chars.len() < required {
        return Err(format!(
            "line has {} characters, fixed layout requires {}",
            chars.len(),
            required
        ));
    }

    let mut fields = Vec::with_capacity(widths.len());
    let mut start = 0;
    for width in widths {
        let value: String = chars[start..start + width].iter().collect();
        fields.push(value.trim().to_string());
        start += width;
    }
    Ok(fields)
}
