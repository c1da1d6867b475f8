//! `FROM` source list.

use crate::expression::Expression;
use crate::statement::Builder;

/// Sources of a query: tables, raw catalog views, table-valued functions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FromClause {
    /// Source expressions, comma separated.
    pub tables: Vec<Expression>,
}

impl FromClause {
    /// Creates a source list with a single source.
    #[must_use]
    pub fn new(source: impl Into<Expression>) -> Self {
        Self {
            tables: vec![source.into()],
        }
    }

    /// Adds a source.
    #[must_use]
    pub fn table(mut self, source: impl Into<Expression>) -> Self {
        self.tables.push(source.into());
        self
    }

    pub(crate) fn build(&self, builder: &mut dyn Builder) {
        for (idx, table) in self.tables.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            table.build(builder);
        }
    }
}
