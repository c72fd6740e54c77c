//! Static schema knowledge: the comparator allowlist, the entity-class to
//! table mapping and the relational columns each class projects.
//!
//! Uses compile-time perfect hash sets (phf) for the allowlist so the
//! security gate is a single lookup with no runtime allocation.

use heck::ToSnakeCase;
use phf::phf_set;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Comparators accepted from user input. Anything else is treated as an
/// injection attempt. `!=` is intentionally absent (only ANSI `<>`).
static ALLOWED_COMPARATORS: phf::Set<&'static str> = phf_set! {
    "=", "<>", ">", "<", ">=", "<=",
    "IN", "NOT IN",
    "LIKE", "NOT LIKE", "ILIKE", "NOT ILIKE",
    "?", "?&", "?|",
};

pub fn is_allowed_comparator(op: &str) -> bool {
    ALLOWED_COMPARATORS.contains(op)
}

/// Fails closed with [`Error::InjectionRejected`] unless `op` is allowlisted.
pub fn ensure_allowed_comparator(op: &str) -> Result<()> {
    if is_allowed_comparator(op) {
        Ok(())
    } else {
        tracing::warn!(comparator = %op, "Rejected forbidden comparator");
        Err(Error::InjectionRejected {
            comparator: op.to_string(),
        })
    }
}

/// Logical entity classes, each backed by one physical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityClass {
    Subject,
    Sample,
    #[default]
    Data,
}

impl EntityClass {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "sample" => Ok(Self::Sample),
            "data" | "generic" => Ok(Self::Data),
            _ => Err(Error::UnknownEntityClass(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Subject => "Subject",
            Self::Sample => "Sample",
            Self::Data => "Data",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Sample => "sample",
            Self::Data => "data",
        }
    }

    /// Columns selected when the class is compiled into a CTE or the root
    /// row source.
    pub fn projection_columns(self) -> &'static [&'static str] {
        match self {
            Self::Subject => &["id", "code", "sex"],
            Self::Sample => &["id", "biobank_code", "parent_subject", "parent_sample"],
            Self::Data => &["id", "parent_subject", "parent_sample", "parent_data"],
        }
    }

    /// Convenience columns projected by the final statement for a root of
    /// this class, qualified with the root alias.
    pub fn main_query_columns(self) -> &'static [&'static str] {
        match self {
            Self::Subject => &["d.code", "d.sex"],
            Self::Sample => &["d.biobank", "d.biobank_code"],
            Self::Data => &[],
        }
    }

    /// Relational (non-metadata) properties a specialized criterion may
    /// constrain, in camelCase as they appear in criteria documents.
    pub fn specialized_properties(self) -> &'static [&'static str] {
        match self {
            Self::Subject => &["code", "sex"],
            Self::Sample => &["biobank", "biobankCode"],
            Self::Data => &[],
        }
    }
}

impl TryFrom<String> for EntityClass {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EntityClass> for String {
    fn from(value: EntityClass) -> Self {
        value.name().to_string()
    }
}

/// Metadata value types; governs the SQL cast on accessor predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    pub fn sql_cast(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            other => Err(Error::InvalidDocument(format!(
                "unknown field type '{}'",
                other
            ))),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.sql_cast().to_string()
    }
}

pub const PERSONAL_DETAILS_TABLE: &str = "personal_details";

pub const PERSONAL_DETAILS_COLUMNS: &[&str] = &["id", "given_name", "surname", "birth_date"];

/// Personal-details properties in criteria documents (camelCase).
pub const PERSONAL_DETAILS_PROPERTIES: &[&str] = &["givenName", "surname", "birthDate"];

/// Personal-details properties matched case-insensitively (value uppercased).
pub(crate) const UPPERCASED_PERSONAL_DETAILS: &[&str] = &["givenName", "surname"];

/// `biobankCode` -> `biobank_code`.
pub fn to_snake_case(s: &str) -> String {
    s.to_snake_case()
}
