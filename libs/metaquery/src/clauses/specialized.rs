use serde_json::Value as JsonValue;

use crate::bind::BindValue;
use crate::criteria::{present, SpecializedCriterion};
use crate::cursor::CompilationCursor;
use crate::error::Result;
use crate::schema::to_snake_case;

use super::property_comparator;

/// Compiles constraints on the relational columns of a specialized subtype
/// (e.g. `subject.sex`, `sample.biobank_code`).
///
/// List values default to `IN ($a,$b,...)`, scalars to `= $n`; either can be
/// overridden through `<property>Comparator`. Clauses are AND-joined. Returns
/// `None` when no recognized property is present.
pub fn compile_specialized(
    criteria: &SpecializedCriterion,
    cursor: &mut CompilationCursor,
    table_prefix: &str,
) -> Result<Option<String>> {
    let mut clauses = Vec::new();

    for property in criteria.specialized_query.specialized_properties() {
        let Some(value) = present(&criteria.properties, property) else {
            continue;
        };
        let column = format!("{}{}", table_prefix, to_snake_case(property));

        match value {
            JsonValue::Array(values) => {
                if values.is_empty() {
                    continue;
                }
                let comparator = property_comparator(&criteria.properties, property, "IN")?;
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| cursor.placeholder(BindValue::from_json(v)))
                    .collect();
                clauses.push(format!(
                    "{} {} ({})",
                    column,
                    comparator,
                    placeholders.join(",")
                ));
            }
            scalar => {
                let comparator = property_comparator(&criteria.properties, property, "=")?;
                clauses.push(format!(
                    "{} {} {}",
                    column,
                    comparator,
                    cursor.placeholder(BindValue::from_json(scalar))
                ));
            }
        }
    }

    if clauses.is_empty() {
        Ok(None)
    } else {
        Ok(Some(clauses.join(" AND ")))
    }
}
