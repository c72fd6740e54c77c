use serde_json::Value as JsonValue;

use crate::bind::BindValue;
use crate::criteria::{present, PersonalDetailsCriterion};
use crate::cursor::CompilationCursor;
use crate::error::Result;
use crate::schema::{
    to_snake_case, PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_PROPERTIES, PERSONAL_DETAILS_TABLE,
    UPPERCASED_PERSONAL_DETAILS,
};

pub const PERSONAL_DETAILS_ALIAS: &str = "pd";

/// Compiled personal-details block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalDetailsQuery {
    pub alias: &'static str,
    pub select: String,
    /// AND-joined predicate over the detail columns; `None` when the block
    /// names no recognized property.
    pub predicate: Option<String>,
}

/// Compiles given name / surname / birth date constraints.
///
/// Names are matched case-insensitively by convention: their values are
/// uppercased before binding. Columns are qualified with `qualifier`
/// (`"pd."` when the predicate is evaluated against the `pd` CTE).
pub fn compile_personal_details(
    criteria: &PersonalDetailsCriterion,
    cursor: &mut CompilationCursor,
    qualifier: &str,
) -> Result<PersonalDetailsQuery> {
    let mut clauses = Vec::new();

    for property in PERSONAL_DETAILS_PROPERTIES {
        let Some(value) = present(&criteria.properties, property) else {
            continue;
        };
        let comparator = super::property_comparator(&criteria.properties, property, "=")?;
        let value = match value {
            JsonValue::String(s) if UPPERCASED_PERSONAL_DETAILS.contains(property) => {
                BindValue::Text(s.to_uppercase())
            }
            other => BindValue::from_json(other),
        };
        let idx = cursor.push(value);
        clauses.push(format!(
            "{}{} {} ${}",
            qualifier,
            to_snake_case(property),
            comparator,
            idx
        ));
    }

    Ok(PersonalDetailsQuery {
        alias: PERSONAL_DETAILS_ALIAS,
        select: format!(
            "SELECT {} FROM {}",
            PERSONAL_DETAILS_COLUMNS.join(", "),
            PERSONAL_DETAILS_TABLE
        ),
        predicate: (!clauses.is_empty()).then(|| clauses.join(" AND ")),
    })
}
