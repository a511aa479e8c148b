//! Configuration loading and validation.
//!
//! One [`EtlConfig`] is read at startup from TOML, layered with environment
//! overrides and CLI flags, validated, and then shared read-only. It declares
//! the directory layout, the concurrency limit, the file type catalog and the
//! handler list.
//!
//! ```toml
//! [directories]
//! inbound = "/srv/etl/inbound"
//!
//! [[file_types]]
//! code = "HEINZ_SALIDAS"
//! layout = { kind = "delimited", delimiter = ";" }
//! fields = [
//!     { name = "ORDER_NUMBER", type = "text", required = true },
//!     { name = "QUANTITY", type = "integer", required = true, min = 1 },
//! ]
//!
//! [[handlers]]
//! name = "heinz-salidas"
//! client = "HEINZ"
//! subdirectory = "SALIDAS"
//! file_type = "HEINZ_SALIDAS"
//! ```

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ERRORS_DIR, DEFAULT_INBOX_DIR,
    DEFAULT_OUTPUTS_DIR, DEFAULT_PROCESSED_DIR, STATUS_JOURNAL_FILE, env,
};
use crate::entities::outbound_fields;
use crate::error::{EtlError, Result};
use crate::handler::HandlerPredicate;
use crate::schema::FileType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default handler file name pattern: text exports, any case
pub const DEFAULT_FILE_PATTERN: &str = r"(?i).*\.(txt|rpt|csv)";

/// Directory layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Root holding one directory per client
    pub inbound: PathBuf,

    /// Inbox directory name under each client
    pub inbox: String,

    /// Processed archive, relative to each client directory unless absolute.
    /// Files are moved, not copied, so it must be on the inbox's filesystem.
    pub processed: PathBuf,

    /// Errors archive, same rules as `processed`
    pub errors: PathBuf,

    /// Repository output and status journal, relative to `inbound` unless absolute
    pub outputs: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            inbound: PathBuf::from("inbound"),
            inbox: DEFAULT_INBOX_DIR.to_string(),
            processed: PathBuf::from(DEFAULT_PROCESSED_DIR),
            errors: PathBuf::from(DEFAULT_ERRORS_DIR),
            outputs: PathBuf::from(DEFAULT_OUTPUTS_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Files handled concurrently by `scan`
    pub max_concurrent_files: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: num_cpus::get(),
        }
    }
}

/// Entity produced by a handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Row,
    OutboundLine,
}

/// Text extraction used by a handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderKind {
    #[default]
    Text,
}

/// One `[[handlers]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub name: String,
    pub client: String,

    /// Subdirectory below the client inbox, empty for the inbox itself
    #[serde(default)]
    pub subdirectory: PathBuf,

    /// Regex the whole file name must match
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,

    /// Catalog code of the file type
    pub file_type: String,

    #[serde(default)]
    pub entity: EntityKind,

    #[serde(default)]
    pub reader: ReaderKind,
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

impl HandlerConfig {
    pub fn new(
        name: impl Into<String>,
        client: impl Into<String>,
        subdirectory: impl Into<PathBuf>,
        file_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client: client.into(),
            subdirectory: subdirectory.into(),
            file_pattern: default_file_pattern(),
            file_type: file_type.into(),
            entity: EntityKind::default(),
            reader: ReaderKind::default(),
        }
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    pub fn with_entity(mut self, entity: EntityKind) -> Self {
        self.entity = entity;
        self
    }

    /// Compiled predicate for this handler
    pub fn predicate(&self) -> Result<HandlerPredicate> {
        HandlerPredicate::new(&self.client, &self.subdirectory, &self.file_pattern)
    }
}

/// Complete ETL configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub directories: DirectoryConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub file_types: Vec<FileType>,

    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

impl EtlConfig {
    /// `<user config dir>/partner-etl/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EtlError::configuration(format!("invalid configuration: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            "Loaded {} file type(s) and {} handler(s) from {}",
            config.file_types.len(),
            config.handlers.len(),
            path.display()
        );
        Ok(config)
    }

    /// Apply `ETL_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `ETL_*` overrides read through `lookup`
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(env::INBOUND_DIR) {
            self.directories.inbound = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::PROCESSED_DIR) {
            self.directories.processed = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::ERRORS_DIR) {
            self.directories.errors = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::OUTPUTS_DIR) {
            self.directories.outputs = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::MAX_CONCURRENT_FILES) {
            self.performance.max_concurrent_files = value.trim().parse().map_err(|_| {
                EtlError::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    env::MAX_CONCURRENT_FILES,
                    value
                ))
            })?;
        }
        Ok(self)
    }

    /// Override the inbound root
    pub fn with_inbound_dir(mut self, inbound: impl Into<PathBuf>) -> Self {
        self.directories.inbound = inbound.into();
        self
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.performance.max_concurrent_files = max_files;
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_types.push(file_type);
        self
    }

    pub fn with_handler(mut self, handler: HandlerConfig) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn file_type(&self, code: &str) -> Option<&FileType> {
        self.file_types.iter().find(|ft| ft.code == code)
    }

    /// Inbox of one client: `<inbound>/<client>/<inbox>`
    pub fn client_inbox(&self, client: &str) -> PathBuf {
        self.directories
            .inbound
            .join(client)
            .join(&self.directories.inbox)
    }

    /// Resolved outputs directory
    pub fn outputs_dir(&self) -> PathBuf {
        if self.directories.outputs.is_absolute() {
            self.directories.outputs.clone()
        } else {
            self.directories.inbound.join(&self.directories.outputs)
        }
    }

    pub fn status_journal_path(&self) -> PathBuf {
        self.outputs_dir().join(STATUS_JOURNAL_FILE)
    }

    /// Check the whole configuration before anything is built from it
    pub fn validate(&self) -> Result<()> {
        if self.performance.max_concurrent_files == 0 {
            return Err(EtlError::configuration(
                "performance.max_concurrent_files must be at least 1",
            ));
        }
        if self.directories.inbox.trim().is_empty() {
            return Err(EtlError::configuration("directories.inbox cannot be empty"));
        }

        let mut codes = HashSet::new();
        for file_type in &self.file_types {
            file_type.validate()?;
            if !codes.insert(file_type.code.as_str()) {
                return Err(EtlError::configuration(format!(
                    "duplicate file type code '{}'",
                    file_type.code
                )));
            }
        }

        let mut names = HashSet::new();
        let mut predicates = HashSet::new();
        for handler in &self.handlers {
            if handler.name.trim().is_empty() || handler.client.trim().is_empty() {
                return Err(EtlError::configuration(
                    "every handler needs a name and a client",
                ));
            }
            if !names.insert(handler.name.as_str()) {
                return Err(EtlError::configuration(format!(
                    "duplicate handler name '{}'",
                    handler.name
                )));
            }

            let predicate = handler.predicate()?;
            if !predicates.insert(predicate.key()) {
                return Err(EtlError::configuration(format!(
                    "handler '{}' repeats the client, subdirectory and file pattern of another handler",
                    handler.name
                )));
            }

            let file_type = self.file_type(&handler.file_type).ok_or_else(|| {
                EtlError::configuration(format!(
                    "handler '{}' refers to unknown file type '{}'",
                    handler.name, handler.file_type
                ))
            })?;

            if handler.entity == EntityKind::OutboundLine {
                if let Some(missing) = outbound_fields::ALL
                    .iter()
                    .find(|name| file_type.field_index(name).is_none())
                {
                    return Err(EtlError::configuration(format!(
                        "handler '{}' maps outbound lines but file type '{}' has no field {}",
                        handler.name, file_type.code, missing
                    )));
                }
            }
        }

        Ok(())
    }
}
