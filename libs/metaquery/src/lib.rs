//! Compiles tree-shaped search criteria over JSON/JSONB metadata columns into
//! a parameterized PostgreSQL statement.
//!
//! ```
//! use metaquery::{compose, EntityNode};
//!
//! let criteria = EntityNode::from_json_str(
//!     r#"{"dataType": 1, "content": [
//!         {"fieldName": "constellation", "fieldType": "text", "comparator": "=", "fieldValue": "cepheus"}
//!     ]}"#,
//! )?;
//! let query = compose(&criteria)?;
//! assert_eq!(
//!     query.statement,
//!     "SELECT DISTINCT d.id, d.metadata FROM data d WHERE d.type = $1 AND ((d.metadata @> $2));"
//! );
//! assert_eq!(query.parameters.len(), 2);
//! # Ok::<(), metaquery::Error>(())
//! ```
//!
//! User input only ever reaches the statement as bind parameters; comparators,
//! the one piece of caller text spliced into SQL, must pass a fixed allowlist.
#![forbid(unsafe_code)]

mod bind;
mod clauses;
mod compose;
mod criteria;
mod cte;
mod cursor;
mod dialect;
mod error;
mod schema;
mod tree;

pub use bind::BindValue;
pub use clauses::{
    compile_accessor_row, compile_attribute_row, compile_loop_row, compile_personal_details,
    compile_row, compile_specialized, PersonalDetailsQuery,
};
pub use compose::{ComposedQuery, QueryPlan};
pub use criteria::{
    ContentItem, Criterion, EntityNode, Junction, PersonalDetailsCriterion, SpecializedCriterion,
};
pub use cte::{linearize, CommonTableExpression};
pub use cursor::CompilationCursor;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use schema::{
    ensure_allowed_comparator, is_allowed_comparator, to_snake_case, EntityClass, FieldType,
    PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_PROPERTIES, PERSONAL_DETAILS_TABLE,
};
pub use tree::{compile_tree, QueryNode, Subquery};

/// Composes statements with a fixed row-compilation dialect.
///
/// Each call owns a fresh [`CompilationCursor`], so one builder can be
/// shared freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// Compiles `criteria` without rendering, exposing the CTE list and
    /// projection.
    pub fn plan(&self, criteria: &EntityNode) -> Result<QueryPlan> {
        QueryPlan::build(criteria, self.dialect)
    }

    pub fn compose(&self, criteria: &EntityNode) -> Result<ComposedQuery> {
        self.plan(criteria).map(QueryPlan::into_composed)
    }

    /// Decodes a criteria tree from JSON, then composes it.
    pub fn compose_json(&self, criteria: &serde_json::Value) -> Result<ComposedQuery> {
        let node = EntityNode::from_value(criteria.clone())?;
        self.compose(&node)
    }
}

/// Composes `criteria` with the default (JSONB) dialect.
pub fn compose(criteria: &EntityNode) -> Result<ComposedQuery> {
    QueryBuilder::default().compose(criteria)
}
