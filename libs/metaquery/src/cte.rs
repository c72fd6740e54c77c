//! Flattening of a compiled query tree into `WITH` entries and joins.

use crate::clauses::PersonalDetailsQuery;
use crate::schema::{EntityClass, PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_TABLE};
use crate::tree::{QueryNode, Subquery, ROOT_ALIAS};

/// One named entry of the `WITH` prologue and the join that brings it into
/// the main statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonTableExpression {
    pub alias: String,
    /// `<alias> AS (<body>)`
    pub expression: String,
    pub join_clause: String,
}

impl CommonTableExpression {
    fn new(alias: &str, body: &str, join_clause: String) -> Self {
        Self {
            alias: alias.to_string(),
            expression: format!("{} AS ({})", alias, body),
            join_clause,
        }
    }

    /// `s`: subject summary joined to the root's parent subject.
    pub fn subject_summary() -> Self {
        Self::new(
            "s",
            &format!(
                "SELECT {} FROM {}",
                ["id", "code", "sex", "personal_info"].join(", "),
                EntityClass::Subject.table()
            ),
            format!("LEFT JOIN s ON s.id = {}.parent_subject", ROOT_ALIAS),
        )
    }

    /// `pd`: unfiltered personal details joined through `owner.personal_info`.
    pub fn personal_details(owner: &str) -> Self {
        Self::new(
            "pd",
            &format!(
                "SELECT {} FROM {}",
                PERSONAL_DETAILS_COLUMNS.join(", "),
                PERSONAL_DETAILS_TABLE
            ),
            format!("LEFT JOIN pd ON pd.id = {}.personal_info", owner),
        )
    }

    /// `bb`: biobank lookup joined to the root sample.
    pub fn biobank() -> Self {
        Self::new(
            "bb",
            "SELECT id, biobank_id, acronym, name FROM biobank",
            format!("LEFT JOIN bb ON bb.id = {}.biobank", ROOT_ALIAS),
        )
    }

    fn nested(node: &QueryNode, alias: &str, parent: &QueryNode) -> Self {
        Self::new(
            alias,
            &format!("{} {}", node.select, node.where_clause),
            format!(
                "INNER JOIN {alias} ON {alias}.parent_{table} = {parent_alias}.id",
                alias = alias,
                table = parent.table,
                parent_alias = parent.reference_alias()
            ),
        )
    }

    fn from_personal_details(query: &PersonalDetailsQuery, owner: &str) -> Self {
        Self::new(
            query.alias,
            &query.select,
            format!("LEFT JOIN {} ON {}.id = {}.personal_info", query.alias, query.alias, owner),
        )
    }
}

/// Walks `root`'s subqueries depth-first (pre-order), so every ancestor's
/// entry precedes its descendants'.
pub fn linearize(root: &QueryNode) -> Vec<CommonTableExpression> {
    let mut ctes = Vec::new();
    collect(root, &mut ctes);
    ctes
}

fn collect(parent: &QueryNode, ctes: &mut Vec<CommonTableExpression>) {
    for subquery in &parent.subqueries {
        match subquery {
            Subquery::PersonalDetails(pd) => {
                ctes.push(CommonTableExpression::from_personal_details(
                    pd,
                    parent.reference_alias(),
                ));
            }
            Subquery::Entity(child) => {
                // Only nested nodes are stored as subqueries, so an alias is set.
                let Some(alias) = child.alias.as_deref() else {
                    continue;
                };
                ctes.push(CommonTableExpression::nested(child, alias, parent));
                collect(child, ctes);
            }
        }
    }
}
