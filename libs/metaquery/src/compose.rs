//! Final statement assembly.

use serde::Serialize;

use crate::bind::BindValue;
use crate::criteria::EntityNode;
use crate::cte::{linearize, CommonTableExpression};
use crate::cursor::CompilationCursor;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::EntityClass;
use crate::tree::{compile_tree, QueryNode};

/// A parameterized statement: `parameters[i - 1]` binds to `$i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedQuery {
    pub statement: String,
    pub parameters: Vec<BindValue>,
}

impl ComposedQuery {
    /// Every `$n` ordinal in the statement, in textual order.
    pub fn placeholders(&self) -> Vec<usize> {
        let mut ordinals = Vec::new();
        let mut chars = self.statement.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '$' {
                continue;
            }
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if let Ok(n) = digits.parse() {
                ordinals.push(n);
            }
        }
        ordinals
    }

    /// Highest placeholder ordinal, 0 when there is none.
    pub fn max_placeholder(&self) -> usize {
        self.placeholders().into_iter().max().unwrap_or(0)
    }

    /// True when the parameter list covers exactly the ordinals used.
    pub fn is_aligned(&self) -> bool {
        self.max_placeholder() == self.parameters.len()
    }
}

/// Intermediate result of one composition, before rendering.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub root: QueryNode,
    pub ctes: Vec<CommonTableExpression>,
    /// Projection of the main `SELECT DISTINCT`.
    pub columns: Vec<String>,
    pub parameters: Vec<BindValue>,
}

impl QueryPlan {
    pub fn build(criteria: &EntityNode, dialect: Dialect) -> Result<Self> {
        let mut cursor = CompilationCursor::new();
        let root = compile_tree(criteria, dialect, &mut cursor)?;
        let class = root.class;

        let mut columns: Vec<String> = std::iter::once("d.id")
            .chain(class.main_query_columns().iter().copied())
            .map(String::from)
            .collect();
        let mut ctes = Vec::new();

        if class != EntityClass::Subject && criteria.wants_subject {
            ctes.push(CommonTableExpression::subject_summary());
            columns.extend(["s.code", "s.sex"].map(String::from));
            if criteria.wants_personal_info {
                ctes.push(CommonTableExpression::personal_details("s"));
                columns.extend(personal_detail_columns());
            }
        }

        if class == EntityClass::Subject && criteria.wants_personal_info {
            // A personal-details criterion under the root already brings `pd`.
            if !root.has_personal_details() {
                ctes.push(CommonTableExpression::personal_details("d"));
            }
            columns.extend(personal_detail_columns());
        }

        if class == EntityClass::Sample {
            ctes.push(CommonTableExpression::biobank());
            columns.push("bb.acronym AS biobank_acronym".to_string());
        }

        columns.push("d.metadata".to_string());
        ctes.extend(linearize(&root));

        tracing::debug!(
            table = root.table,
            placeholders = cursor.last_position(),
            nested = cursor.cte_count(),
            ctes = ctes.len(),
            "Composed query plan"
        );

        Ok(Self {
            root,
            ctes,
            columns,
            parameters: cursor.into_parameters(),
        })
    }

    /// `WITH a AS (...), b AS (...) SELECT DISTINCT ... FROM t d <joins> WHERE ...;`
    pub fn statement(&self) -> String {
        let main = format!(
            "SELECT DISTINCT {} FROM {} d",
            self.columns.join(", "),
            self.root.table
        );
        if self.ctes.is_empty() {
            return format!("{} {};", main, self.root.where_clause);
        }

        let prologue = self
            .ctes
            .iter()
            .map(|cte| cte.expression.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let joins = self
            .ctes
            .iter()
            .map(|cte| cte.join_clause.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "WITH {} {} {} {};",
            prologue, main, joins, self.root.where_clause
        )
    }

    pub fn cte_aliases(&self) -> Vec<&str> {
        self.ctes.iter().map(|cte| cte.alias.as_str()).collect()
    }

    pub fn into_composed(self) -> ComposedQuery {
        ComposedQuery {
            statement: self.statement(),
            parameters: self.parameters,
        }
    }
}

fn personal_detail_columns() -> impl Iterator<Item = String> {
    ["pd.given_name", "pd.surname", "pd.birth_date"]
        .into_iter()
        .map(String::from)
}
