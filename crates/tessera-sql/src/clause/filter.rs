//! `WHERE` conditions.

use super::{Clause, ClauseKind};
use crate::expression::Expression;
use crate::statement::Builder;

/// Conditions joined with `AND`.
///
/// Merging appends the incoming conditions to the live ones, so filters
/// added in several steps narrow the same statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Where {
    /// The conditions.
    pub exprs: Vec<Expression>,
}

impl Where {
    /// Creates a filter from conditions.
    #[must_use]
    pub fn new<I, E>(exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Self {
            exprs: exprs.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a condition.
    #[must_use]
    pub fn and(mut self, expr: impl Into<Expression>) -> Self {
        self.exprs.push(expr.into());
        self
    }

    pub(crate) fn build(&self, builder: &mut dyn Builder) {
        for (idx, expr) in self.exprs.iter().enumerate() {
            if idx > 0 {
                builder.write_str(" AND ");
            }
            expr.build(builder);
        }
    }

    pub(crate) fn merge_into(self, clause: &mut Clause) {
        let merged = match clause.expression.take() {
            Some(ClauseKind::Where(mut live)) => {
                live.exprs.extend(self.exprs);
                live
            }
            _ => self,
        };

        if merged.exprs.is_empty() {
            clause.name.clear();
        }
        clause.expression = Some(ClauseKind::Where(merged));
    }
}
