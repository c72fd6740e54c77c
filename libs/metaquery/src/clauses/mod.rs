//! Clause builders for the leaves of a criteria tree.
//!
//! Each module compiles one kind of leaf into a boolean SQL fragment,
//! pushing its bind values onto the shared
//! [`CompilationCursor`](crate::cursor::CompilationCursor). A builder
//! returns `Ok(None)` when the leaf contributes nothing.

mod accessor;
mod loop_row;
mod personal_details;
mod row;
mod specialized;

pub use accessor::compile_accessor_row;
pub use loop_row::compile_loop_row;
pub use personal_details::{compile_personal_details, PersonalDetailsQuery};
pub use row::{compile_attribute_row, compile_row};
pub use specialized::compile_specialized;

use serde_json::{Map, Value as JsonValue};

use crate::bind::BindValue;
use crate::criteria::{present, Criterion};
use crate::error::{Error, Result};
use crate::schema::{ensure_allowed_comparator, FieldType};

/// Field name of a non-empty criterion.
fn field_name(criterion: &Criterion) -> Result<&str> {
    criterion
        .field_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::malformed("<unnamed>", "missing fieldName"))
}

/// Comparator of a criterion, passed through the allowlist gate.
fn checked_comparator(criterion: &Criterion) -> Result<&str> {
    let Some(comparator) = criterion.comparator.as_deref() else {
        let name = criterion.field_name.as_deref().unwrap_or("<unnamed>");
        return Err(Error::malformed(name, "missing comparator"));
    };
    ensure_allowed_comparator(comparator)?;
    Ok(comparator)
}

/// Comparators whose right-hand side is a list or a key set.
const LIST_COMPARATORS: &[&str] = &["IN", "NOT IN", "?", "?&", "?|"];

/// Rejects list and existence comparators on single-valued, non-loop rows.
fn ensure_scalar_comparator(name: &str, comparator: &str) -> Result<()> {
    if LIST_COMPARATORS.contains(&comparator) {
        return Err(Error::malformed(
            name,
            format!("comparator '{}' requires isList or isInLoop", comparator),
        ));
    }
    Ok(())
}

fn scalar_value<'a>(name: &str, criterion: &'a Criterion) -> Result<&'a JsonValue> {
    match &criterion.field_value {
        None | Some(JsonValue::Null) => Err(Error::malformed(name, "missing fieldValue")),
        Some(JsonValue::Array(_)) => Err(Error::malformed(
            name,
            "fieldValue is a list but the criterion is not list-valued",
        )),
        Some(JsonValue::Object(_)) => Err(Error::malformed(name, "fieldValue must be a scalar")),
        Some(value) => Ok(value),
    }
}

fn list_values<'a>(name: &str, criterion: &'a Criterion) -> Result<&'a [JsonValue]> {
    match &criterion.field_value {
        Some(JsonValue::Array(values)) if !values.is_empty() => Ok(values),
        Some(JsonValue::Array(_)) => Err(Error::malformed(name, "fieldValue list is empty")),
        _ => Err(Error::malformed(name, "list-valued criterion requires a fieldValue list")),
    }
}

/// Normalizes a scalar by field type: numeric text is parsed for integer
/// and float fields, text is uppercased for case-insensitive criteria.
fn normalize_scalar(name: &str, criterion: &Criterion, value: &JsonValue) -> Result<JsonValue> {
    match criterion.field_type {
        FieldType::Integer => parse_integer(value)
            .map(JsonValue::from)
            .ok_or_else(|| Error::malformed(name, format!("'{}' is not an integer", value))),
        FieldType::Float => parse_float(value)
            .and_then(|f| serde_json::Number::from_f64(f).map(JsonValue::Number))
            .ok_or_else(|| Error::malformed(name, format!("'{}' is not a number", value))),
        _ => match value {
            JsonValue::String(s) if criterion.case_insensitive => {
                Ok(JsonValue::String(s.to_uppercase()))
            }
            other => Ok(other.clone()),
        },
    }
}

fn parse_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_to_i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_to_i64))
        }
        _ => None,
    }
}

/// Drops the fraction; `None` when the result does not fit an `i64`.
fn truncate_to_i64(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then(|| t as i64)
}

fn parse_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Accepts native booleans and the strings "true"/"false" (any case).
fn normalize_bool(name: &str, value: &JsonValue) -> Result<bool> {
    match value {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::malformed(name, format!("'{}' is not a boolean", other))),
    }
}

/// Text form of a scalar for operators that only take text (`?`, `?&`, `?|`).
fn scalar_text(value: &JsonValue, uppercase: bool) -> String {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    if uppercase {
        text.to_uppercase()
    } else {
        text
    }
}

/// `{"<field>": {"<key>": <value>}}` bound as compact JSON text.
fn keyed_document(field: &str, key: &str, value: JsonValue) -> BindValue {
    let mut inner = Map::new();
    inner.insert(key.to_string(), value);
    let mut outer = Map::new();
    outer.insert(field.to_string(), JsonValue::Object(inner));
    BindValue::document(JsonValue::Object(outer))
}

/// Comparator for a relational property: `<property>Comparator` when given
/// (and allowlisted), otherwise `default`.
fn property_comparator<'a>(
    properties: &'a Map<String, JsonValue>,
    property: &str,
    default: &'a str,
) -> Result<&'a str> {
    let key = format!("{}Comparator", property);
    match present(properties, &key) {
        None => Ok(default),
        Some(JsonValue::String(comparator)) => {
            ensure_allowed_comparator(comparator)?;
            Ok(comparator.as_str())
        }
        Some(other) => Err(Error::malformed(
            property,
            format!("comparator must be a string, got {}", other),
        )),
    }
}
