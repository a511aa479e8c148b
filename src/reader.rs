//! Text extraction from inbound files
//!
//! Partner files arrive in whatever encoding the sender's system produced.
//! [`TextFileReader`] honours a byte order mark when present, otherwise tries
//! strict UTF-8 and falls back to Windows-1252, the usual encoding of
//! spreadsheet exports. The decoded text never contains U+FEFF or U+FFFD.

use crate::constants::{BYTE_ORDER_MARK, REPLACEMENT_CHARACTER};
use crate::error::{EtlError, Result};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::path::Path;
use tracing::debug;

/// Extracts the full text of a file
pub trait Reader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String>;
}

/// Reader for delimited and fixed-width text files
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileReader;

impl TextFileReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode raw bytes, returning the text and the encoding name used
    pub fn decode(bytes: &[u8]) -> (String, &'static str) {
        let (text, encoding) = if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
            let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
            (decoded.into_owned(), encoding.name())
        } else {
            match std::str::from_utf8(bytes) {
                Ok(s) => (s.to_string(), "UTF-8"),
                Err(_) => {
                    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                    (decoded.into_owned(), WINDOWS_1252.name())
                }
            }
        };

        (strip_markers(&text), encoding)
    }
}

impl Reader for TextFileReader {
    fn read(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| EtlError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (text, encoding) = Self::decode(&bytes);
        debug!(
            "Read {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            encoding
        );
        Ok(text)
    }
}

fn strip_markers(text: &str) -> String {
    text.chars()
        .filter(|c| *c != BYTE_ORDER_MARK && *c != REPLACEMENT_CHARACTER)
        .collect()
}
