use crate::bind::BindValue;
use crate::criteria::Criterion;
use crate::cursor::CompilationCursor;
use crate::error::{Error, Result};

use super::{checked_comparator, ensure_scalar_comparator, field_name, list_values, scalar_value};

/// Compiles one metadata criterion with the plain JSON accessor strategy
/// (`->` / `->>` plus a cast), for `json` metadata columns without
/// containment support.
///
/// The field-name placeholder is shared by the value and unit accessors.
pub fn compile_accessor_row(
    criterion: &Criterion,
    cursor: &mut CompilationCursor,
    table_prefix: &str,
) -> Result<Option<String>> {
    if criterion.is_empty() {
        return Ok(None);
    }
    let comparator = checked_comparator(criterion)?;
    let name = field_name(criterion)?;
    if criterion.is_in_loop {
        return Err(Error::malformed(
            name,
            "loop attributes require the JSONB dialect",
        ));
    }
    if !criterion.is_list {
        ensure_scalar_comparator(name, comparator)?;
    }

    let cast = criterion.field_type.sql_cast();
    let name_idx = cursor.push(name.to_string());
    let accessor = format!("({}metadata->${}->>'value')::{}", table_prefix, name_idx, cast);

    let mut clause = if criterion.is_list {
        let placeholders: Vec<String> = list_values(name, criterion)?
            .iter()
            .map(|v| cursor.placeholder(BindValue::from_json(v)))
            .collect();
        format!("{} {} ({})", accessor, comparator, placeholders.join(","))
    } else {
        let value = scalar_value(name, criterion)?;
        format!("{} {} {}", accessor, comparator, cursor.placeholder(BindValue::from_json(value)))
    };

    if let Some(unit) = criterion.unit() {
        let unit_idx = cursor.push(unit.to_string());
        clause.push_str(&format!(
            " AND ({}metadata->${}->>'unit')::text LIKE ${}",
            table_prefix, name_idx, unit_idx
        ));
    }

    Ok(Some(clause))
}
