use serde_json::Value as JsonValue;

use crate::bind::BindValue;
use crate::criteria::Criterion;
use crate::cursor::CompilationCursor;
use crate::error::Result;
use crate::schema::FieldType;

use super::{
    checked_comparator, ensure_scalar_comparator, field_name, keyed_document, list_values,
    normalize_bool, normalize_scalar, scalar_value,
};

/// Compiles one metadata criterion with the JSONB containment strategy.
///
/// Every criterion passes the comparator allowlist before any placeholder is
/// emitted. Loop attributes are routed to the array-membership compiler.
/// A unit qualifier always adds one `AND <prefix>metadata @> $n` conjunct.
pub fn compile_row(
    criterion: &Criterion,
    cursor: &mut CompilationCursor,
    table_prefix: &str,
) -> Result<Option<String>> {
    if criterion.is_empty() {
        return Ok(None);
    }
    let comparator = checked_comparator(criterion)?;
    let name = field_name(criterion)?;

    let mut clause = if criterion.is_in_loop {
        tracing::debug!(field = %name, loop_name = ?criterion.loop_name, "Compiling loop attribute");
        super::compile_loop_row(criterion, comparator, cursor, table_prefix)?
    } else {
        compile_attribute_row(criterion, comparator, cursor, table_prefix)?
    };

    if let Some(unit) = criterion.unit() {
        let idx = cursor.push(keyed_document(
            name,
            "unit",
            JsonValue::String(unit.to_string()),
        ));
        clause.push_str(&format!(" AND {}metadata @> ${}", table_prefix, idx));
    }

    Ok(Some(clause))
}

/// Compiles a single-instance metadata attribute (no unit qualifier).
///
/// `comparator` must already have passed the allowlist.
pub fn compile_attribute_row(
    criterion: &Criterion,
    comparator: &str,
    cursor: &mut CompilationCursor,
    table_prefix: &str,
) -> Result<String> {
    let name = field_name(criterion)?;
    if !criterion.is_list {
        ensure_scalar_comparator(name, comparator)?;
    }

    if criterion.field_type == FieldType::Boolean {
        let value = normalize_bool(name, scalar_value(name, criterion)?)?;
        let idx = cursor.push(keyed_document(name, "value", JsonValue::Bool(value)));
        return Ok(format!("{}metadata @> ${}", table_prefix, idx));
    }

    if criterion.is_list {
        let negation = if comparator == "NOT IN" { "NOT " } else { "" };
        let mut parts = Vec::new();
        for value in list_values(name, criterion)? {
            let value = normalize_scalar(name, criterion, value)?;
            let idx = cursor.push(keyed_document(name, "value", value));
            parts.push(format!("{}{}metadata @> ${}", negation, table_prefix, idx));
        }
        let disjunction = parts.join(" OR ");
        // Keep the OR group intact when a unit conjunct follows.
        return Ok(if criterion.unit().is_some() && parts.len() > 1 {
            format!("({})", disjunction)
        } else {
            disjunction
        });
    }

    let value = scalar_value(name, criterion)?;

    // Equality goes through JSONB containment (@>) so the GIN index applies.
    if comparator == "=" || comparator == "<>" {
        let negation = if comparator == "<>" { "NOT " } else { "" };
        let value = normalize_scalar(name, criterion, value)?;
        let idx = cursor.push(keyed_document(name, "value", value));
        return Ok(format!("{}{}metadata @> ${}", negation, table_prefix, idx));
    }

    // Ranges and patterns use the typed accessor.
    let name_idx = cursor.push(name.to_string());
    let value_idx = cursor.push(BindValue::from_json(value));
    Ok(format!(
        "({}metadata->${}->>'value')::{} {} ${}",
        table_prefix,
        name_idx,
        criterion.field_type.sql_cast(),
        comparator,
        value_idx
    ))
}
