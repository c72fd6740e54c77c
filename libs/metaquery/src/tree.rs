//! Recursive compilation of a criteria tree into query nodes.
//!
//! Each entity node becomes a `SELECT ... FROM <table>` with a `WHERE` that
//! always starts with the `type` discriminator. Nested entity nodes are not
//! flattened into their parent's `WHERE`; they are kept as child query nodes
//! and later turned into CTEs (see [`crate::cte`]).

use crate::bind::BindValue;
use crate::clauses::{compile_personal_details, compile_specialized, PersonalDetailsQuery};
use crate::criteria::{ContentItem, EntityNode, PersonalDetailsCriterion};
use crate::cursor::CompilationCursor;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{EntityClass, PERSONAL_DETAILS_TABLE};

/// Alias of the root row source in the final statement.
pub const ROOT_ALIAS: &str = "d";

/// A compiled entity node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode {
    pub class: EntityClass,
    pub table: &'static str,
    /// CTE name; `None` for the root.
    pub alias: Option<String>,
    pub select: String,
    pub where_clause: String,
    pub subqueries: Vec<Subquery>,
}

/// A child of a compiled node that becomes its own CTE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subquery {
    Entity(QueryNode),
    PersonalDetails(PersonalDetailsQuery),
}

impl QueryNode {
    pub fn is_root(&self) -> bool {
        self.alias.is_none()
    }

    /// Name under which this node's rows are referenced by its children.
    pub fn reference_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(ROOT_ALIAS)
    }

    pub fn has_personal_details(&self) -> bool {
        self.subqueries
            .iter()
            .any(|s| matches!(s, Subquery::PersonalDetails(_)))
    }
}

/// Compiles `root` and everything below it, threading `cursor` through the
/// whole walk.
pub fn compile_tree(
    root: &EntityNode,
    dialect: Dialect,
    cursor: &mut CompilationCursor,
) -> Result<QueryNode> {
    compile_node(root, dialect, cursor, None)
}

fn compile_node(
    node: &EntityNode,
    dialect: Dialect,
    cursor: &mut CompilationCursor,
    alias: Option<String>,
) -> Result<QueryNode> {
    let class = node.entity_class();
    let table = class.table();
    let is_root = alias.is_none();
    // Nested nodes are wrapped into CTEs and need no table alias of their own.
    let table_prefix = if is_root { "d." } else { "" };

    tracing::debug!(
        table,
        alias = alias.as_deref().unwrap_or(ROOT_ALIAS),
        items = node.content.len(),
        "Compiling entity node"
    );

    let mut select = format!(
        "SELECT {} FROM {}",
        class.projection_columns().join(", "),
        table
    );
    let type_idx = cursor.push(BindValue::from_json(&node.data_type));
    let mut where_clause = format!("WHERE {}type = ${}", table_prefix, type_idx);

    let mut field_queries = Vec::new();
    let mut subqueries = Vec::new();

    for item in &node.content {
        match item {
            ContentItem::Entity(child) => {
                let child_alias = cursor.next_alias();
                let compiled = compile_node(child, dialect, cursor, Some(child_alias))?;
                subqueries.push(Subquery::Entity(compiled));
            }
            ContentItem::PersonalDetails(criteria) => {
                if let Some(pd) = compile_personal_details_item(class, criteria, cursor, is_root)? {
                    field_queries.push(pd.0);
                    // Every block reads the same `pd` CTE; it is declared once.
                    let declared = subqueries
                        .iter()
                        .any(|s| matches!(s, Subquery::PersonalDetails(_)));
                    if let (Some(cte), false) = (pd.1, declared) {
                        subqueries.push(Subquery::PersonalDetails(cte));
                    }
                }
            }
            ContentItem::Specialized(criteria) => {
                if let Some(clause) = compile_specialized(criteria, cursor, table_prefix)? {
                    field_queries.push(clause);
                }
            }
            ContentItem::Criterion(criterion) => {
                if let Some(clause) = dialect.compile_row(criterion, cursor, table_prefix)? {
                    field_queries.push(clause);
                }
            }
        }
    }

    if !field_queries.is_empty() {
        let junction = format!(" {} ", node.junction.as_sql());
        let combined = field_queries
            .iter()
            .map(|q| format!("({})", q))
            .collect::<Vec<_>>()
            .join(&junction);
        where_clause.push_str(&format!(" AND ({})", combined));
    }

    if is_root {
        select.push_str(" d");
    }

    Ok(QueryNode {
        class,
        table,
        alias,
        select,
        where_clause,
        subqueries,
    })
}

/// Personal details are folded into the owning node's junction list. Under
/// the root the predicate targets the `pd` CTE (joined to `d`); under a
/// nested node, where no CTE is in scope, it becomes a semi-join on
/// `personal_info`.
fn compile_personal_details_item(
    class: EntityClass,
    criteria: &PersonalDetailsCriterion,
    cursor: &mut CompilationCursor,
    is_root: bool,
) -> Result<Option<(String, Option<PersonalDetailsQuery>)>> {
    if class != EntityClass::Subject {
        return Err(Error::malformed(
            "personalDetails",
            format!("personal details only apply to Subject nodes, not {}", class.name()),
        ));
    }

    if is_root {
        let compiled = compile_personal_details(criteria, cursor, "pd.")?;
        Ok(compiled
            .predicate
            .clone()
            .map(|predicate| (predicate, Some(compiled))))
    } else {
        let compiled = compile_personal_details(criteria, cursor, "")?;
        Ok(compiled.predicate.map(|predicate| {
            (
                format!(
                    "personal_info IN (SELECT id FROM {} WHERE {})",
                    PERSONAL_DETAILS_TABLE, predicate
                ),
                None,
            )
        }))
    }
}
