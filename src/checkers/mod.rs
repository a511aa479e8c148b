//! Field checker chains
//!
//! Every declared [`DataType`] owns one [`CheckerChain`]: a parse step, a
//! human-readable example of valid input, and the ordered constraint checkers
//! that type registers. Chains are plain function pointers collected once in a
//! [`CheckerRegistry`] and shared read-only across records, batches and threads.
//!
//! ## Check order
//!
//! 1. Required-ness: blank + required fails with `REQUIRED_ERROR`; blank + optional
//!    yields `None` and stops.
//! 2. Parse: failure yields `PARSE_ERROR` with valid examples.
//! 3. Constraints: run in registration order after a successful parse; the first
//!    violated bound yields `CONSTRAINT_ERROR`.
//!
//! ## Usage
//!
//! ```rust
//! use partner_etl::checkers::{CheckContext, CheckerRegistry};
//! use partner_etl::schema::{DataType, FieldDefinition};
//!
//! let registry = CheckerRegistry::standard();
//! let quantity = FieldDefinition::new("QTY", DataType::Integer).required().with_min(1.0);
//! let context = CheckContext::now();
//!
//! assert!(registry.check(&quantity, "12", &context).is_ok());
//! assert!(registry.check(&quantity, "abc", &context).is_err());
//! ```

pub mod constraints;
pub mod types;

use crate::error::FieldError;
use crate::models::FieldValue;
use crate::schema::{DataType, FieldDefinition};
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;

/// Converts a trimmed, non-blank raw value; `None` means the value does not parse
pub type ParseFn = fn(&FieldDefinition, &str) -> Option<FieldValue>;

/// Describes valid input for a field, used in `PARSE_ERROR` messages
pub type ExamplesFn = fn(&FieldDefinition) -> String;

/// Checks a parsed value; `Err` carries the description of the violated bound
pub type ConstraintFn =
    fn(&FieldDefinition, &FieldValue, &CheckContext) -> std::result::Result<(), String>;

/// Inputs shared by every check of one field-checking run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckContext {
    /// Wall clock captured when the run started
    pub now: NaiveDateTime,
}

impl CheckContext {
    /// Context at the current local time
    pub fn now() -> Self {
        Self {
            now: Local::now().naive_local(),
        }
    }

    /// Context pinned to a given instant
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

/// Parse step plus ordered constraints for one declared type
#[derive(Debug, Clone)]
pub struct CheckerChain {
    pub data_type: DataType,
    parse: ParseFn,
    examples: ExamplesFn,
    constraints: Vec<ConstraintFn>,
}

impl CheckerChain {
    pub fn new(data_type: DataType, parse: ParseFn, examples: ExamplesFn) -> Self {
        Self {
            data_type,
            parse,
            examples,
            constraints: Vec::new(),
        }
    }

    /// Append a constraint checker to the chain
    pub fn with_constraint(mut self, constraint: ConstraintFn) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Number of registered constraint checkers
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Run required, parse and constraint checks for one raw value
    pub fn check(
        &self,
        definition: &FieldDefinition,
        raw: &str,
        context: &CheckContext,
    ) -> std::result::Result<Option<FieldValue>, FieldError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if definition.required {
                return Err(FieldError::Required {
                    field: definition.name.clone(),
                });
            }
            return Ok(None);
        }

        let value = (self.parse)(definition, trimmed).ok_or_else(|| FieldError::Parse {
            field: definition.name.clone(),
            value: trimmed.to_string(),
            examples: (self.examples)(definition),
        })?;

        for constraint in &self.constraints {
            constraint(definition, &value, context).map_err(|bound| FieldError::Constraint {
                field: definition.name.clone(),
                value: trimmed.to_string(),
                bound,
            })?;
        }

        Ok(Some(value))
    }
}

/// Declared type to checker chain mapping, built once at configuration load
#[derive(Debug, Clone)]
pub struct CheckerRegistry {
    chains: HashMap<DataType, CheckerChain>,
}

impl CheckerRegistry {
    /// Registry with no chains
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// Registry with a chain for every [`DataType`]
    pub fn standard() -> Self {
        use constraints::*;
        use types::*;

        Self::empty()
            .with_chain(
                CheckerChain::new(DataType::Integer, parse_integer, integer_examples)
                    .with_constraint(integer_min)
                    .with_constraint(integer_max),
            )
            .with_chain(
                CheckerChain::new(DataType::Decimal, parse_decimal, decimal_examples)
                    .with_constraint(decimal_min)
                    .with_constraint(decimal_max),
            )
            .with_chain(
                CheckerChain::new(DataType::Text, parse_text, text_examples)
                    .with_constraint(text_min_length)
                    .with_constraint(text_max_length),
            )
            .with_chain(CheckerChain::new(DataType::Date, parse_date, date_examples))
            .with_chain(CheckerChain::new(DataType::Time, parse_time, time_examples))
            .with_chain(CheckerChain::new(
                DataType::DateTime,
                parse_datetime,
                datetime_examples,
            ))
            .with_chain(CheckerChain::new(
                DataType::Boolean,
                parse_boolean,
                boolean_examples,
            ))
            .with_chain(
                CheckerChain::new(DataType::BoundedTime, parse_time, time_examples)
                    .with_constraint(time_max_minutes_from_now),
            )
    }

    /// Register or replace the chain for a type
    pub fn with_chain(mut self, chain: CheckerChain) -> Self {
        self.chains.insert(chain.data_type, chain);
        self
    }

    pub fn chain(&self, data_type: DataType) -> Option<&CheckerChain> {
        self.chains.get(&data_type)
    }

    /// Check one raw value against its field definition
    pub fn check(
        &self,
        definition: &FieldDefinition,
        raw: &str,
        context: &CheckContext,
    ) -> std::result::Result<Option<FieldValue>, FieldError> {
        match self.chain(definition.data_type) {
            Some(chain) => chain.check(definition, raw, context),
            None => Err(FieldError::Parse {
                field: definition.name.clone(),
                value: raw.trim().to_string(),
                examples: format!("no checker registered for {:?}", definition.data_type),
            }),
        }
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
