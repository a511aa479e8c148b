//! Application constants for partner file ingestion
//!
//! Archive naming formats, default directory names, default parse formats
//! and environment variable names used throughout the crate.

// =============================================================================
// Archive Layout
// =============================================================================

/// Timestamp prefix for archived and quarantined files (`yyyyMMdd-HHmm`)
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Month bucket directory (`YYYYMM`)
pub const ARCHIVE_MONTH_FORMAT: &str = "%Y%m";

/// Day bucket directory (`YYYYMMDD`)
pub const ARCHIVE_DAY_FORMAT: &str = "%Y%m%d";

/// Suffix appended to a file renamed in place after a fatal relocation failure
pub const FATAL_SUFFIX: &str = "error";

/// Timestamp used in repository output file names
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// =============================================================================
// Directory Defaults
// =============================================================================

pub const DEFAULT_INBOX_DIR: &str = "inbox";
pub const DEFAULT_PROCESSED_DIR: &str = "processed";
pub const DEFAULT_ERRORS_DIR: &str = "errors";
pub const DEFAULT_OUTPUTS_DIR: &str = "outputs";

/// Status journal written by the JSON lines status recorder
pub const STATUS_JOURNAL_FILE: &str = "file-status.jsonl";

/// Directory under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "partner-etl";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Field Parsing Defaults
// =============================================================================

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted boolean spellings (compared case-insensitively)
pub const TRUE_VALUES: &[&str] = &["1", "true", "y", "s", "yes", "si"];
pub const FALSE_VALUES: &[&str] = &["0", "false", "n", "no"];

/// Default delimiter for delimited layouts
pub const DEFAULT_DELIMITER: char = ',';

/// Default quote character for delimited layouts
pub const DEFAULT_QUOTE: char = '"';

/// Largest window, either side of now, a bounded time may declare
pub const MAX_BOUNDED_TIME_MINUTES: f64 = 24.0 * 60.0;

// =============================================================================
// Reader
// =============================================================================

/// Byte order mark, stripped from decoded text
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Replacement character left behind by lossy decoding, stripped from decoded text
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

// =============================================================================
// Environment Overrides
// =============================================================================

pub mod env {
    pub const INBOUND_DIR: &str = "ETL_INBOUND_DIR";
    pub const PROCESSED_DIR: &str = "ETL_DIRECTORY_PROCESSED";
    pub const ERRORS_DIR: &str = "ETL_DIRECTORY_ERRORS";
    pub const OUTPUTS_DIR: &str = "ETL_DIRECTORY_OUTPUTS";
    pub const MAX_CONCURRENT_FILES: &str = "ETL_MAX_CONCURRENT_FILES";
}
