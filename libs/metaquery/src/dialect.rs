use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clauses;
use crate::criteria::Criterion;
use crate::cursor::CompilationCursor;
use crate::error::{Error, Result};

/// Storage dialect of the `metadata` column, selecting how metadata rows
/// are compiled. Everything else (tree walk, CTEs, specialized columns) is
/// shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `json` columns: typed `->`/`->>` accessors only.
    Json,
    /// `jsonb` columns: containment (`@>`) and existence (`?`, `?&`, `?|`).
    #[default]
    Jsonb,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonb => "jsonb",
        }
    }

    pub fn compile_row(
        self,
        criterion: &Criterion,
        cursor: &mut CompilationCursor,
        table_prefix: &str,
    ) -> Result<Option<String>> {
        match self {
            Self::Json => clauses::compile_accessor_row(criterion, cursor, table_prefix),
            Self::Jsonb => clauses::compile_row(criterion, cursor, table_prefix),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonb" => Ok(Self::Jsonb),
            other => Err(Error::InvalidDocument(format!("unknown dialect '{}'", other))),
        }
    }
}
