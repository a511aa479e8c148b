//! Persistence of mapped entities
//!
//! A repository saves every entity of one file in a single all-or-nothing
//! operation. Two implementations are provided: [`InMemoryRepository`] for
//! embedding and tests, and [`JsonLinesRepository`] which writes one JSON lines
//! file per source file and only makes it visible once fully written.

use crate::constants::OUTPUT_TIMESTAMP_FORMAT;
use crate::error::{EtlError, Result};
use chrono::Local;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Transactional sink for the entities of one file
pub trait Repository<T>: Send + Sync {
    /// Save all entities or none of them, returning the number saved
    fn save_all(&self, entities: Vec<T>) -> Result<usize>;

    /// Save entities extracted from `source`; defaults to [`Repository::save_all`]
    fn save_all_from(&self, source: &Path, entities: Vec<T>) -> Result<usize> {
        let _ = source;
        self.save_all(entities)
    }
}

/// Keeps every saved batch in memory
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    batches: Mutex<Vec<Vec<T>>>,
    failure: Option<String>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Repository whose every save fails with `reason`, saving nothing
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Number of successful saves
    pub fn batch_count(&self) -> usize {
        self.batches.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl<T: Clone> InMemoryRepository<T> {
    /// Every saved entity, in save order
    pub fn saved(&self) -> Vec<T> {
        self.batches
            .lock()
            .map(|b| b.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Repository<T> for InMemoryRepository<T> {
    fn save_all(&self, entities: Vec<T>) -> Result<usize> {
        let count = entities.len();
        if let Some(reason) = &self.failure {
            return Err(EtlError::persistence(count, reason.clone()));
        }

        let mut batches = self
            .batches
            .lock()
            .map_err(|_| EtlError::persistence(count, "repository lock poisoned"))?;
        batches.push(entities);
        Ok(count)
    }
}

/// Writes `<dir>/<yyyyMMdd-HHmmss>-<source stem>-<n>.jsonl`, one entity per line
#[derive(Debug)]
pub struct JsonLinesRepository {
    directory: PathBuf,
    sequence: AtomicUsize,
}

impl JsonLinesRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            sequence: AtomicUsize::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn write<T: Serialize>(&self, stem: &str, entities: &[T]) -> Result<PathBuf> {
        let count = entities.len();
        let persistence = |reason: String| EtlError::persistence(count, reason);

        std::fs::create_dir_all(&self.directory).map_err(|e| {
            persistence(format!(
                "cannot create {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let temp = tempfile::NamedTempFile::new_in(&self.directory)
            .map_err(|e| persistence(format!("cannot create temporary file: {}", e)))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for entity in entities {
                serde_json::to_writer(&mut writer, entity)
                    .map_err(|e| persistence(format!("serialization failed: {}", e)))?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| persistence(e.to_string()))?;
            }
            writer.flush().map_err(|e| persistence(e.to_string()))?;
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name = format!(
            "{}-{}-{}.jsonl",
            Local::now().format(OUTPUT_TIMESTAMP_FORMAT),
            stem,
            n
        );
        let destination = self.directory.join(file_name);
        temp.persist_noclobber(&destination)
            .map_err(|e| persistence(format!("cannot persist {}: {}", destination.display(), e.error)))?;

        Ok(destination)
    }
}

impl<T: Serialize> Repository<T> for JsonLinesRepository {
    fn save_all(&self, entities: Vec<T>) -> Result<usize> {
        self.save_all_from(Path::new("batch"), entities)
    }

    fn save_all_from(&self, source: &Path, entities: Vec<T>) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch".to_string());
        let destination = self.write(&stem, &entities)?;

        debug!(
            "Saved {} record(s) to {}",
            entities.len(),
            destination.display()
        );
        Ok(entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Item {
        code: String,
        quantity: i64,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                code: "A".to_string(),
                quantity: 1,
            },
            Item {
                code: "B".to_string(),
                quantity: 2,
            },
        ]
    }

    #[test]
    fn test_in_memory_saves_batches() {
        let repository = InMemoryRepository::new();
        assert_eq!(repository.save_all(items()).unwrap(), 2);
        assert_eq!(repository.save_all(vec![]).unwrap(), 0);

        assert_eq!(repository.batch_count(), 2);
        assert_eq!(repository.saved(), items());
    }

    #[test]
    fn test_failing_repository_saves_nothing() {
        let repository = InMemoryRepository::failing("disk full");
        let err = repository.save_all(items()).unwrap_err();

        assert!(matches!(err, EtlError::Persistence { count: 2, .. }));
        assert!(repository.saved().is_empty());
    }

    #[test]
    fn test_json_lines_writes_one_file_per_save() {
        let dir = TempDir::new().unwrap();
        let repository = JsonLinesRepository::new(dir.path().join("ORDERS"));

        let saved = repository
            .save_all_from(Path::new("/inbox/pedidos.csv"), items())
            .unwrap();
        assert_eq!(saved, 2);

        let files: Vec<_> = std::fs::read_dir(repository.directory())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);

        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-pedidos-1.jsonl"), "{}", name);

        let content = std::fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"code":"A","quantity":1}"#, r#"{"code":"B","quantity":2}"#]);
    }

    #[test]
    fn test_json_lines_skips_empty_save() {
        let dir = TempDir::new().unwrap();
        let repository = JsonLinesRepository::new(dir.path().join("out"));

        let saved = Repository::<Item>::save_all(&repository, vec![]).unwrap();
        assert_eq!(saved, 0);
        assert!(!repository.directory().exists());
    }
}
