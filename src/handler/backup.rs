//! Post-processing relocation of source files
//!
//! After a file is handled it is moved into a dated archive tree:
//!
//! ```text
//! <inbox parent>/<processed|errors>/<subdirectory>/<YYYYMM>/<YYYYMMDD>/<yyyyMMdd-HHmm>-<file name>
//! ```
//!
//! Any failure while relocating is fatal for that file: it is renamed beside
//! itself to `<yyyyMMdd-HHmm>-<ErrorKind>-<file name>.error` so it is never
//! picked up again. If even that rename fails the file is left untouched and
//! the failure is logged.

use crate::constants::{
    ARCHIVE_DAY_FORMAT, ARCHIVE_MONTH_FORMAT, ARCHIVE_TIMESTAMP_FORMAT, FATAL_SUFFIX,
};
use crate::error::{EtlError, Result};
use crate::models::FileRequest;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Source of the relocation timestamp
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock stopped at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Which archive a file is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveTarget {
    Processed,
    Errors,
}

impl fmt::Display for ArchiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveTarget::Processed => write!(f, "processed"),
            ArchiveTarget::Errors => write!(f, "errors"),
        }
    }
}

/// Where a file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// Moved into the processed or errors archive
    Archived {
        target: ArchiveTarget,
        destination: PathBuf,
    },
    /// Relocation failed; renamed in place with an `.error` suffix
    Quarantined { path: PathBuf, cause: String },
    /// Relocation and the in-place rename both failed; file untouched
    Stranded { cause: String },
}

impl Relocation {
    /// Final location of the file
    pub fn final_path<'a>(&'a self, original: &'a Path) -> &'a Path {
        match self {
            Relocation::Archived { destination, .. } => destination,
            Relocation::Quarantined { path, .. } => path,
            Relocation::Stranded { .. } => original,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Relocation::Archived { .. })
    }
}

/// Moves handled files into the processed or errors archive
pub struct Archiver {
    processed_dir: PathBuf,
    errors_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl Archiver {
    /// Archive directories are resolved against the inbox's parent unless absolute
    pub fn new(processed_dir: impl Into<PathBuf>, errors_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            errors_dir: errors_dir.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn archive_root(&self, request: &FileRequest, target: ArchiveTarget) -> PathBuf {
        let dir = match target {
            ArchiveTarget::Processed => &self.processed_dir,
            ArchiveTarget::Errors => &self.errors_dir,
        };
        if dir.is_absolute() {
            return dir.clone();
        }
        let base = request.root().parent().unwrap_or_else(|| request.root());
        base.join(dir)
    }

    /// Archive path for `request` at instant `now`
    pub fn destination(
        &self,
        request: &FileRequest,
        target: ArchiveTarget,
        now: NaiveDateTime,
    ) -> PathBuf {
        self.archive_root(request, target)
            .join(request.subdirectory())
            .join(now.format(ARCHIVE_MONTH_FORMAT).to_string())
            .join(now.format(ARCHIVE_DAY_FORMAT).to_string())
            .join(format!(
                "{}-{}",
                now.format(ARCHIVE_TIMESTAMP_FORMAT),
                request.file_name()
            ))
    }

    /// Create the dated directories and move the file; never overwrites
    ///
    /// The move links the destination first, so an archive entry that already
    /// exists fails with `AlreadyExists` instead of being replaced. Archive
    /// directories must sit on the same filesystem as the inbox.
    pub fn relocate(&self, request: &FileRequest, target: ArchiveTarget) -> Result<PathBuf> {
        let destination = self.destination(request, target, self.clock.now());
        let relocation_error = |source: std::io::Error| EtlError::Relocation {
            path: request.path().to_path_buf(),
            destination: destination.clone(),
            source,
        };

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(relocation_error)?;
        }
        std::fs::hard_link(request.path(), &destination).map_err(relocation_error)?;
        if let Err(e) = std::fs::remove_file(request.path()) {
            let _ = std::fs::remove_file(&destination);
            return Err(relocation_error(e));
        }

        Ok(destination)
    }

    /// Relocate, falling back to the in-place `.error` rename on any failure
    pub fn archive(&self, request: &FileRequest, target: ArchiveTarget) -> Relocation {
        match self.relocate(request, target) {
            Ok(destination) => {
                info!(
                    "Moved {} to {} archive: {}",
                    request.path().display(),
                    target,
                    destination.display()
                );
                Relocation::Archived {
                    target,
                    destination,
                }
            }
            Err(e) => {
                error!(
                    "Fatal: could not move {} to {} archive: {}",
                    request.path().display(),
                    target,
                    e
                );
                self.quarantine(request, &e)
            }
        }
    }

    /// `<yyyyMMdd-HHmm>-<ErrorKind>-<file name>.error` beside the original
    pub fn quarantine_path(&self, request: &FileRequest, cause: &EtlError) -> PathBuf {
        let name = format!(
            "{}-{}-{}.{}",
            self.clock.now().format(ARCHIVE_TIMESTAMP_FORMAT),
            cause.kind_name(),
            request.file_name(),
            FATAL_SUFFIX
        );
        request.path().with_file_name(name)
    }

    fn quarantine(&self, request: &FileRequest, cause: &EtlError) -> Relocation {
        let path = self.quarantine_path(request, cause);
        // rename replaces an existing target on every supported platform
        match std::fs::rename(request.path(), &path) {
            Ok(()) => {
                error!(
                    "Renamed {} in place to {}",
                    request.path().display(),
                    path.display()
                );
                Relocation::Quarantined {
                    path,
                    cause: cause.to_string(),
                }
            }
            Err(e) => {
                error!(
                    "Fatal: could not rename {} to {}: {}; file left in place",
                    request.path().display(),
                    path.display(),
                    e
                );
                Relocation::Stranded {
                    cause: format!("{}; in-place rename failed: {}", cause, e),
                }
            }
        }
    }
}
