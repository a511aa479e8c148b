//! Type-specific parse steps and their valid-input examples

use crate::constants::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT, FALSE_VALUES, TRUE_VALUES,
};
use crate::models::FieldValue;
use crate::schema::FieldDefinition;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a signed 64-bit integer
pub fn parse_integer(_definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    raw.parse::<i64>().ok().map(FieldValue::Integer)
}

pub fn integer_examples(_definition: &FieldDefinition) -> String {
    "123456,-123456".to_string()
}

/// Parse a finite decimal; a lone `,` is accepted as the decimal separator
pub fn parse_decimal(_definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replacen(',', ".", 1)
    } else {
        raw.to_string()
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(FieldValue::Decimal)
}

pub fn decimal_examples(_definition: &FieldDefinition) -> String {
    "1234.56 or -0.5 or 12,75".to_string()
}

pub fn parse_text(_definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(raw.to_string()))
}

pub fn text_examples(_definition: &FieldDefinition) -> String {
    "any text".to_string()
}

pub fn parse_date(definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    NaiveDate::parse_from_str(raw, date_format(definition))
        .ok()
        .map(FieldValue::Date)
}

pub fn date_examples(definition: &FieldDefinition) -> String {
    sample_datetime().format(date_format(definition)).to_string()
}

/// Parse a time of day; used by both `time` and `bounded_time`
pub fn parse_time(definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    NaiveTime::parse_from_str(raw, time_format(definition))
        .ok()
        .map(FieldValue::Time)
}

pub fn time_examples(definition: &FieldDefinition) -> String {
    sample_datetime().format(time_format(definition)).to_string()
}

pub fn parse_datetime(definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    NaiveDateTime::parse_from_str(raw, datetime_format(definition))
        .ok()
        .map(FieldValue::DateTime)
}

pub fn datetime_examples(definition: &FieldDefinition) -> String {
    sample_datetime()
        .format(datetime_format(definition))
        .to_string()
}

/// Parse one of the accepted boolean spellings, case-insensitively
pub fn parse_boolean(_definition: &FieldDefinition, raw: &str) -> Option<FieldValue> {
    let lowered = raw.to_lowercase();
    if TRUE_VALUES.contains(&lowered.as_str()) {
        Some(FieldValue::Boolean(true))
    } else if FALSE_VALUES.contains(&lowered.as_str()) {
        Some(FieldValue::Boolean(false))
    } else {
        None
    }
}

pub fn boolean_examples(_definition: &FieldDefinition) -> String {
    TRUE_VALUES
        .iter()
        .chain(FALSE_VALUES.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

fn date_format(definition: &FieldDefinition) -> &str {
    definition.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
}

fn time_format(definition: &FieldDefinition) -> &str {
    definition.format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
}

fn datetime_format(definition: &FieldDefinition) -> &str {
    definition
        .format
        .as_deref()
        .unwrap_or(DEFAULT_DATETIME_FORMAT)
}

// Fixed instant rendered through the field's format to show valid input
fn sample_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or_default()
}
