//! `ORDER BY` columns.

use crate::expression::Column;
use crate::statement::Builder;

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByColumn {
    /// The sorted column.
    pub column: Column,
    /// Sort descending.
    pub desc: bool,
}

/// Sort keys, rendered comma separated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy {
    /// The sort keys.
    pub columns: Vec<OrderByColumn>,
}

impl OrderBy {
    /// Creates an empty sort.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ascending key.
    #[must_use]
    pub fn asc(mut self, column: Column) -> Self {
        self.columns.push(OrderByColumn {
            column,
            desc: false,
        });
        self
    }

    /// Adds a descending key.
    #[must_use]
    pub fn desc(mut self, column: Column) -> Self {
        self.columns.push(OrderByColumn { column, desc: true });
        self
    }

    pub(crate) fn build(&self, builder: &mut dyn Builder) {
        for (idx, key) in self.columns.iter().enumerate() {
            if idx > 0 {
                builder.write_str(", ");
            }
            builder.write_quoted(&key.column.clone().into());
            if key.desc {
                builder.write_str(" DESC");
            }
        }
    }
}
