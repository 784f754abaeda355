//! Built-in filter primitives
//!
//! Filters are scalar coercions. Applied to an array they map over its
//! elements, so a repeated field keeps its shape. `null` always passes through
//! untouched, and a coercion that cannot produce a value yields `null`.

use super::predicates::PredicateTable;
use super::validators::{parse_date, scalar_text};
use chrono::SecondsFormat;
use serde_json::{Number, Value};

/// Apply a scalar coercion to a value or to every element of an array
pub fn lift(value: Value, filter: fn(Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(filter).collect()),
        Value::Null => Value::Null,
        other => filter(other),
    }
}

/// Integral floats become JSON integers, non-finite numbers become null
fn number_value(num: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if num.is_finite() && num.fract() == 0.0 && num.abs() <= MAX_SAFE {
        Value::from(num as i64)
    } else {
        Number::from_f64(num).map_or(Value::Null, Value::Number)
    }
}

/// Filter: textual form of the value
pub fn to_string(value: Value) -> Value {
    match value {
        Value::String(_) | Value::Null => value,
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => Value::String(other.to_string()),
    }
}

/// Filter: parse as a number
pub fn to_number(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(n),
        Value::Bool(b) => Value::from(u8::from(b)),
        Value::String(s) => s.trim().parse::<f64>().map_or(Value::Null, number_value),
        _ => Value::Null,
    }
}

/// Filter: parse the leading integer, like `parseInt`
pub fn to_int(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Value::Number(n),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map_or(Value::Null, |f| Value::from(f.trunc() as i64)),
        Value::String(s) => leading_int(&s).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn leading_int(text: &str) -> Option<Value> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['-', '+']));
    let end = text[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |end| end + sign_len);
    let digits = &text[..end];
    digits
        .parse::<i64>()
        .map(Value::from)
        .or_else(|_| digits.parse::<u64>().map(Value::from))
        .ok()
}

/// Filter: parse as a floating point number
pub fn to_float(value: Value) -> Value {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Filter: anything but `0`, `false` and the empty string is true
pub fn to_boolean(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(b),
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Value::Bool(!matches!(
            scalar_text(&other).as_deref(),
            None | Some("0" | "false" | "")
        )),
    }
}

/// Filter: normalize a date to an RFC 3339 UTC timestamp
pub fn to_date(value: Value) -> Value {
    value
        .as_str()
        .and_then(parse_date)
        .map_or(Value::Null, |dt| {
            Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        })
}

/// Filter: canonical form of an e-mail address
///
/// Lowercases the address. Gmail addresses also lose dots and `+tag` suffixes
/// in the local part, and `googlemail.com` becomes `gmail.com`.
pub fn normalize_email(value: Value) -> Value {
    let Some(address) = value.as_str() else {
        return value;
    };
    let address = address.trim().to_lowercase();
    let Some((local, domain)) = address.rsplit_once('@') else {
        return Value::String(address);
    };

    if domain == "gmail.com" || domain == "googlemail.com" {
        let local = local.split('+').next().unwrap_or_default().replace('.', "");
        return Value::String(format!("{}@gmail.com", local));
    }

    Value::String(format!("{}@{}", local, domain))
}

fn map_str(value: Value, f: impl Fn(&str) -> String) -> Value {
    if let Some(s) = value.as_str() {
        return Value::String(f(s));
    }
    value
}

/// Filter: trim whitespace from string
pub fn trim(value: Value) -> Value {
    map_str(value, |s| s.trim().to_string())
}

/// Filter: convert string to lowercase
pub fn to_lower(value: Value) -> Value {
    map_str(value, str::to_lowercase)
}

/// Filter: convert string to uppercase
pub fn to_upper(value: Value) -> Value {
    map_str(value, str::to_uppercase)
}

/// Register every built-in filter under its public name
pub fn register_builtins(table: &mut PredicateTable) {
    let scalar: [(&str, fn(Value) -> Value); 10] = [
        ("toString", to_string),
        ("toNumber", to_number),
        ("toInt", to_int),
        ("toFloat", to_float),
        ("toBoolean", to_boolean),
        ("toDate", to_date),
        ("normalizeEmail", normalize_email),
        ("trim", trim),
        ("toLower", to_lower),
        ("toUpper", to_upper),
    ];

    for (name, filter) in scalar {
        table.register_filter(name, move |value| lift(value, filter));
    }
}
