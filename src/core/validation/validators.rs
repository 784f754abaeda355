//! Built-in validator primitives
//!
//! These are the named validators the default type table points at. Each one
//! is a plain predicate over a scalar; [`register_builtins`] wires them into a
//! [`PredicateTable`](super::predicates::PredicateTable) under their public
//! names (`isInt`, `isEmail`, ...).

use super::predicates::PredicateTable;
use crate::core::field::FieldDescriptor;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

/// Textual form of a scalar; `None` for null, arrays and objects
pub(crate) fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Parse the date formats accepted by `isDate` and `toDate`
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn regex_match(cell: &'static OnceLock<Regex>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).expect("builtin pattern must compile"))
        .is_match(text)
}

fn text_matches(value: &Value, cell: &'static OnceLock<Regex>, pattern: &str) -> bool {
    scalar_text(value).is_some_and(|text| regex_match(cell, pattern, &text))
}

/// Validator: finite integer or decimal number, optionally signed
pub fn is_numeric(value: &Value) -> bool {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    scalar_text(value).is_some_and(|text| {
        regex_match(&NUMERIC, r"^[-+]?(?:[0-9]*\.)?[0-9]+$", &text)
            && text.parse::<f64>().is_ok_and(f64::is_finite)
    })
}

/// Validator: integer without leading zeros that fits in 64 bits
pub fn is_int(value: &Value) -> bool {
    static INT: OnceLock<Regex> = OnceLock::new();
    scalar_text(value).is_some_and(|text| {
        regex_match(&INT, r"^[-+]?(?:0|[1-9][0-9]*)$", &text)
            && (text.parse::<i64>().is_ok() || text.parse::<u64>().is_ok())
    })
}

/// Validator: floating point number, exponent allowed
pub fn is_float(value: &Value) -> bool {
    static FLOAT: OnceLock<Regex> = OnceLock::new();
    scalar_text(value).is_some_and(|text| {
        regex_match(
            &FLOAT,
            r"^[-+]?(?:[0-9]+)?(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$",
            &text,
        ) && text.parse::<f64>().is_ok()
    })
}

/// Validator: one of `true`, `false`, `1`, `0`
pub fn is_boolean(value: &Value) -> bool {
    matches!(
        scalar_text(value).as_deref(),
        Some("true" | "false" | "1" | "0")
    )
}

/// Validator: parseable date or datetime
pub fn is_date(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| parse_date(text).is_some())
}

/// Validator: e-mail address
pub fn is_email(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| text.validate_email())
}

/// Validator: ASCII letters only
pub fn is_alpha(value: &Value) -> bool {
    static ALPHA: OnceLock<Regex> = OnceLock::new();
    text_matches(value, &ALPHA, r"^[A-Za-z]+$")
}

/// Validator: ASCII letters and digits only
pub fn is_alphanumeric(value: &Value) -> bool {
    static ALNUM: OnceLock<Regex> = OnceLock::new();
    text_matches(value, &ALNUM, r"^[0-9A-Za-z]+$")
}

/// Validator: decimal number such as `12`, `-0.5` or `.25`
pub fn is_decimal(value: &Value) -> bool {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    text_matches(
        value,
        &DECIMAL,
        r"^[-+]?(?:[0-9]+|\.[0-9]+|[0-9]+\.[0-9]+)$",
    )
}

/// Validator: 24 hexadecimal characters
pub fn is_mongo_id(value: &Value) -> bool {
    static MONGO_ID: OnceLock<Regex> = OnceLock::new();
    value
        .as_str()
        .is_some_and(|text| regex_match(&MONGO_ID, r"^[0-9a-fA-F]{24}$", text))
}

/// Validator: absolute URL
pub fn is_url(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| text.validate_url())
}

/// Validator: UUID in any of its textual forms
pub fn is_uuid(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| Uuid::parse_str(text).is_ok())
}

/// Validator: value is one of the allowed options
///
/// `options` is either an array of allowed values or an object whose keys are
/// the allowed values. Comparison is done on the textual form so that `"1"`
/// matches an option `1`.
pub fn is_in(value: &Value, options: Option<&Value>) -> bool {
    let Some(text) = scalar_text(value) else {
        return false;
    };

    match options {
        Some(Value::Array(allowed)) => allowed
            .iter()
            .any(|option| option == value || scalar_text(option).as_deref() == Some(&*text)),
        Some(Value::Object(allowed)) => allowed.contains_key(&*text),
        _ => false,
    }
}

/// Register every built-in validator under its public name
pub fn register_builtins(table: &mut PredicateTable) {
    let scalar: [(&str, fn(&Value) -> bool); 12] = [
        ("isNumeric", is_numeric),
        ("isInt", is_int),
        ("isFloat", is_float),
        ("isBoolean", is_boolean),
        ("isDate", is_date),
        ("isEmail", is_email),
        ("isAlpha", is_alpha),
        ("isAlphanumeric", is_alphanumeric),
        ("isDecimal", is_decimal),
        ("isMongoId", is_mongo_id),
        ("isURL", is_url),
        ("isUUID", is_uuid),
    ];

    for (name, predicate) in scalar {
        table.register_validator(name, move |value: &Value, _: &FieldDescriptor| {
            predicate(value)
        });
    }

    table.register_validator("isIn", |value: &Value, field: &FieldDescriptor| {
        is_in(value, field.options.as_ref())
    });
}
