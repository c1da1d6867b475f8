//! `SELECT` column list.

use crate::expression::Expression;
use crate::statement::Builder;

/// Columns of a `SELECT`; renders `*` when empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    /// Selected expressions.
    pub columns: Vec<Expression>,
}

impl Select {
    /// Creates an empty selection (`*`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a selected expression.
    #[must_use]
    pub fn column(mut self, column: impl Into<Expression>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub(crate) fn build(&self, builder: &mut dyn Builder) {
        if self.columns.is_empty() {
            builder.write_char('*');
            return;
        }
        for (idx, column) in self.columns.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            column.build(builder);
        }
    }
}
