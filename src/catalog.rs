//! File type catalog lookup

use crate::error::{EtlError, Result};
use crate::schema::FileType;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of file type metadata by catalog code
pub trait FileTypeCatalog: Send + Sync {
    fn find_file_type_by_code(&self, code: &str) -> Option<Arc<FileType>>;
}

/// Catalog held in memory, built once from configuration
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    file_types: HashMap<String, Arc<FileType>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from validated file types; codes must be unique
    pub fn from_file_types(file_types: impl IntoIterator<Item = FileType>) -> Result<Self> {
        let mut catalog = Self::new();
        for file_type in file_types {
            file_type.validate()?;
            if catalog.file_types.contains_key(&file_type.code) {
                return Err(EtlError::configuration(format!(
                    "duplicate file type code '{}'",
                    file_type.code
                )));
            }
            catalog.insert(file_type);
        }
        Ok(catalog)
    }

    /// Register or replace a file type
    pub fn insert(&mut self, file_type: FileType) {
        self.file_types
            .insert(file_type.code.clone(), Arc::new(file_type));
    }

    /// Registered codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.file_types.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.file_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_types.is_empty()
    }
}

impl FileTypeCatalog for InMemoryCatalog {
    fn find_file_type_by_code(&self, code: &str) -> Option<Arc<FileType>> {
        self.file_types.get(code).cloned()
    }
}
