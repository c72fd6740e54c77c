use crate::bind::BindValue;
use crate::criteria::Criterion;
use crate::cursor::CompilationCursor;
use crate::error::{Error, Result};

use super::{field_name, list_values, scalar_text, scalar_value};

/// Compiles an attribute living inside a repeatable metadata block.
///
/// Loop attributes keep every instance under a `values` array, so matching
/// uses the JSONB existence operators instead of scalar equality:
///
/// - `=` / `<>`: `(<NOT >metadata->$name->'values' ? $value)`
/// - `?&` / `?|`: `(metadata->$name->'values' ?& $values)` with a text array
///
/// `comparator` must already have passed the allowlist.
pub fn compile_loop_row(
    criterion: &Criterion,
    comparator: &str,
    cursor: &mut CompilationCursor,
    table_prefix: &str,
) -> Result<String> {
    let name = field_name(criterion)?;

    match comparator {
        "=" | "<>" => {
            let negation = if comparator == "<>" { "NOT " } else { "" };
            let value = scalar_text(scalar_value(name, criterion)?, criterion.case_insensitive);
            let name_idx = cursor.push(name.to_string());
            let value_idx = cursor.push(value);
            Ok(format!(
                "({}{}metadata->${}->'values' ? ${})",
                negation, table_prefix, name_idx, value_idx
            ))
        }
        "?&" | "?|" => {
            let values: Vec<String> = list_values(name, criterion)?
                .iter()
                .map(|v| scalar_text(v, criterion.case_insensitive))
                .collect();
            let name_idx = cursor.push(name.to_string());
            let values_idx = cursor.push(BindValue::TextArray(values));
            Ok(format!(
                "({}metadata->${}->'values' {} ${})",
                table_prefix, name_idx, comparator, values_idx
            ))
        }
        other => Err(Error::malformed(
            name,
            format!("comparator '{}' is not supported for loop attributes", other),
        )),
    }
}
