//! Constraint checkers run after a successful parse.
//!
//! Each checker only looks at the bound it owns and passes when that bound is
//! not configured or the value is of a different variant.

use super::CheckContext;
use crate::models::FieldValue;
use crate::schema::FieldDefinition;
use chrono::Duration;
use std::cmp::Ordering;

type Outcome = std::result::Result<(), String>;

pub fn integer_min(definition: &FieldDefinition, value: &FieldValue, _: &CheckContext) -> Outcome {
    match (value, definition.min) {
        (FieldValue::Integer(v), Some(min)) if compare_integer(*v, min) == Ordering::Less => {
            Err(format!("min {}", min))
        }
        _ => Ok(()),
    }
}

pub fn integer_max(definition: &FieldDefinition, value: &FieldValue, _: &CheckContext) -> Outcome {
    match (value, definition.max) {
        (FieldValue::Integer(v), Some(max)) if compare_integer(*v, max) == Ordering::Greater => {
            Err(format!("max {}", max))
        }
        _ => Ok(()),
    }
}

/// Order an integer against a float bound without rounding the integer
///
/// Integral bounds inside the `i64` range compare exactly as `i64`.
fn compare_integer(value: i64, bound: f64) -> Ordering {
    const I64_RANGE_END: f64 = 9_223_372_036_854_775_808.0;
    if bound.fract() == 0.0 && bound >= -I64_RANGE_END && bound < I64_RANGE_END {
        value.cmp(&(bound as i64))
    } else {
        (value as f64).partial_cmp(&bound).unwrap_or(Ordering::Equal)
    }
}

pub fn decimal_min(definition: &FieldDefinition, value: &FieldValue, _: &CheckContext) -> Outcome {
    match (value, definition.min) {
        (FieldValue::Decimal(v), Some(min)) if *v < min => Err(format!("min {}", min)),
        _ => Ok(()),
    }
}

pub fn decimal_max(definition: &FieldDefinition, value: &FieldValue, _: &CheckContext) -> Outcome {
    match (value, definition.max) {
        (FieldValue::Decimal(v), Some(max)) if *v > max => Err(format!("max {}", max)),
        _ => Ok(()),
    }
}

/// Length bounds count characters, not bytes
pub fn text_min_length(
    definition: &FieldDefinition,
    value: &FieldValue,
    _: &CheckContext,
) -> Outcome {
    match (value, definition.min) {
        (FieldValue::Text(v), Some(min)) if (v.chars().count() as f64) < min => {
            Err(format!("min length {}", min))
        }
        _ => Ok(()),
    }
}

pub fn text_max_length(
    definition: &FieldDefinition,
    value: &FieldValue,
    _: &CheckContext,
) -> Outcome {
    match (value, definition.max) {
        (FieldValue::Text(v), Some(max)) if (v.chars().count() as f64) > max => {
            Err(format!("max length {}", max))
        }
        _ => Ok(()),
    }
}

/// Upper bound of `now + max` minutes for a time of day.
///
/// The value is read as a time on the context's date, so a limit that crosses
/// midnight accepts every remaining time of the day. A limit outside chrono's
/// date range leaves the value unbounded.
pub fn time_max_minutes_from_now(
    definition: &FieldDefinition,
    value: &FieldValue,
    context: &CheckContext,
) -> Outcome {
    match (value, definition.max) {
        (FieldValue::Time(time), Some(max)) => {
            let Some(limit) = Duration::try_minutes(max.trunc() as i64)
                .and_then(|window| context.now.checked_add_signed(window))
            else {
                return Ok(());
            };
            let candidate = context.now.date().and_time(*time);
            if candidate > limit {
                Err(format!(
                    "max {} ({} minutes from {})",
                    limit.format("%H:%M"),
                    max,
                    context.now.format("%H:%M")
                ))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}
