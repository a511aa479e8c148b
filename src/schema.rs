//! File type schemas: declared field types, layouts and record rules.
//!
//! A [`FileType`] is the catalog metadata for one kind of partner file. It is
//! loaded once from configuration, wrapped in an `Arc`, and shared read-only by
//! every pipeline run for that file type.

use crate::constants::MAX_BOUNDED_TIME_MINUTES;
use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Declared type of a field. Each variant owns one checker chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Decimal,
    Text,
    Date,
    Time,
    #[serde(alias = "datetime")]
    DateTime,
    Boolean,
    /// Time of day whose upper bound is `now + max` minutes when `max` is set
    BoundedTime,
}

impl DataType {
    /// All declared types, in registry order
    pub const ALL: [DataType; 8] = [
        DataType::Integer,
        DataType::Decimal,
        DataType::Text,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::Boolean,
        DataType::BoundedTime,
    ];

    /// Whether `min`/`max` mean something for this type
    pub fn supports_bounds(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Decimal | DataType::Text | DataType::BoundedTime
        )
    }

    /// Whether a chrono `format` applies to this type
    pub fn supports_format(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::Time | DataType::DateTime | DataType::BoundedTime
        )
    }
}

/// Static per-column configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Column name used by rules, natural keys and mappers
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Blank values fail with `REQUIRED_ERROR` when set
    #[serde(default)]
    pub required: bool,

    /// Lower bound: value for numbers, length for text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound: value for numbers, length for text, minutes from now for bounded time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Column width in characters, fixed-width layouts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    /// chrono format override for date and time types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldDefinition {
    /// Create an optional field with no bounds
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: false,
            min: None,
            max: None,
            width: None,
            format: None,
        }
    }

    /// Mark the field as mandatory
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the lower bound
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the upper bound
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set the fixed column width
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Override the chrono parse format
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// How a line is cut into fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Delimited {
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default = "default_quote")]
        quote: char,
    },
    /// Widths come from each field's `width`
    FixedWidth,
}

fn default_delimiter() -> char {
    crate::constants::DEFAULT_DELIMITER
}

fn default_quote() -> char {
    crate::constants::DEFAULT_QUOTE
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Delimited {
            delimiter: default_delimiter(),
            quote: default_quote(),
        }
    }
}

/// Business rule spanning more than one field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// `field` must take one of `values`
    OneOf { field: String, values: Vec<String> },

    /// `field` must be one of the codes listed for the value of `when_field`
    OneOfWhen {
        field: String,
        when_field: String,
        codes: HashMap<String, Vec<String>>,
    },

    /// `field` and `other` must differ
    NotEqual { field: String, other: String },

    /// `field` must be present whenever `other` is present
    RequiredWith { field: String, other: String },
}

impl FieldRule {
    /// Field names the rule reads
    pub fn fields(&self) -> Vec<&str> {
        match self {
            FieldRule::OneOf { field, .. } => vec![field.as_str()],
            FieldRule::OneOfWhen {
                field, when_field, ..
            } => vec![field.as_str(), when_field.as_str()],
            FieldRule::NotEqual { field, other } | FieldRule::RequiredWith { field, other } => {
                vec![field.as_str(), other.as_str()]
            }
        }
    }
}

/// Catalog metadata for one kind of partner file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileType {
    /// Catalog code, e.g. `HEINZ_SALIDAS_CADENAS`
    pub code: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub layout: Layout,

    /// Ordered column definitions; their count is the declared column count
    pub fields: Vec<FieldDefinition>,

    /// Leading lines (headers) dropped before splitting
    #[serde(default)]
    pub skip_lines: usize,

    /// Fields forming the natural key used for duplicate detection
    #[serde(default)]
    pub natural_key: Vec<String>,

    /// Fields uppercased before checking
    #[serde(default)]
    pub uppercase: Vec<String>,

    /// Cross-field rules applied to records that passed field checking
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}

impl FileType {
    /// Create a delimited file type with the given columns
    pub fn delimited(code: impl Into<String>, delimiter: char, fields: Vec<FieldDefinition>) -> Self {
        Self {
            code: code.into(),
            description: String::new(),
            layout: Layout::Delimited {
                delimiter,
                quote: default_quote(),
            },
            fields,
            skip_lines: 0,
            natural_key: Vec::new(),
            uppercase: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Create a fixed-width file type; every field needs a `width`
    pub fn fixed_width(code: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            layout: Layout::FixedWidth,
            ..Self::delimited(code, default_delimiter(), fields)
        }
    }

    pub fn with_natural_key(mut self, fields: &[&str]) -> Self {
        self.natural_key = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_uppercase(mut self, fields: &[&str]) -> Self {
        self.uppercase = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    /// Declared column count
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Sum of the fixed column widths
    pub fn total_width(&self) -> usize {
        self.fields.iter().filter_map(|f| f.width).sum()
    }

    /// Check the schema is internally consistent
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| {
            Err(EtlError::configuration(format!(
                "file type '{}': {}",
                self.code, message
            )))
        };

        if self.code.trim().is_empty() {
            return fail("code cannot be empty".to_string());
        }
        if self.fields.is_empty() {
            return fail("at least one field is required".to_string());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return fail(format!("duplicate field '{}'", field.name));
            }
            if let (Some(min), Some(max)) = (field.min, field.max) {
                if min > max {
                    return fail(format!(
                        "field '{}' has min {} greater than max {}",
                        field.name, min, max
                    ));
                }
            }
            if (field.min.is_some() || field.max.is_some()) && !field.data_type.supports_bounds() {
                return fail(format!(
                    "field '{}' of type {:?} does not accept min/max",
                    field.name, field.data_type
                ));
            }
            if field.data_type == DataType::BoundedTime
                && field
                    .max
                    .is_some_and(|max| !max.is_finite() || max.abs() > MAX_BOUNDED_TIME_MINUTES)
            {
                return fail(format!(
                    "field '{}' needs a max within {} minutes of now",
                    field.name, MAX_BOUNDED_TIME_MINUTES
                ));
            }
            if field.format.is_some() && !field.data_type.supports_format() {
                return fail(format!(
                    "field '{}' of type {:?} does not accept a format",
                    field.name, field.data_type
                ));
            }
            if self.layout == Layout::FixedWidth && field.width.unwrap_or(0) == 0 {
                return fail(format!(
                    "field '{}' needs a non-zero width in a fixed-width layout",
                    field.name
                ));
            }
        }

        let referenced = self
            .natural_key
            .iter()
            .chain(self.uppercase.iter())
            .map(String::as_str)
            .chain(self.rules.iter().flat_map(|r| r.fields()));
        for name in referenced {
            if self.field_index(name).is_none() {
                return fail(format!("unknown field '{}'", name));
            }
        }

        Ok(())
    }
}
