//! Named, mergeable statement clauses.
//!
//! A [`Clause`] is a fixed set of slots rendered in order: before-expressions,
//! the name token, after-name-expressions, the primary expression, and
//! after-expressions. Which slots are populated decides the SQL shape.
//!
//! The primary expression is a [`ClauseKind`], a closed set of variants that
//! each know their name, render order priority and merge rule. A statement
//! keeps at most one live clause per name; adding a second one merges it into
//! the first.

mod filter;
mod from;
mod limit;
mod order_by;
mod select;

pub use filter::Where;
pub use from::FromClause;
pub use limit::Limit;
pub use order_by::{OrderBy, OrderByColumn};
pub use select::Select;

use crate::expression::Expression;
use crate::statement::Builder;

/// Replaces the default slot rendering of a clause.
pub type ClauseBuilder = fn(&Clause, &mut dyn Builder);

/// A named composite of expressions.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    /// Name token, e.g. `WHERE`. Empty names are not rendered.
    pub name: String,
    /// Render order used by [`Statement::build_all`](crate::Statement::build_all).
    pub priority: f64,
    /// Rendered before the name token.
    pub before_expressions: Vec<Expression>,
    /// Rendered right after the name token.
    pub after_name_expressions: Vec<Expression>,
    /// Rendered last.
    pub after_expressions: Vec<Expression>,
    /// The primary expression.
    pub expression: Option<ClauseKind>,
    /// Custom renderer overriding the slot layout.
    pub builder: Option<ClauseBuilder>,
}

impl Clause {
    /// Creates an empty clause with a name token.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Renders the clause.
    pub fn build(&self, builder: &mut dyn Builder) {
        if let Some(custom) = self.builder {
            custom(self, builder);
            return;
        }

        let mut written = false;
        for expr in &self.before_expressions {
            separate(builder, &mut written);
            expr.build(builder);
        }
        if !self.name.is_empty() {
            separate(builder, &mut written);
            builder.write_str(&self.name);
        }
        for expr in &self.after_name_expressions {
            separate(builder, &mut written);
            expr.build(builder);
        }
        if let Some(expression) = &self.expression {
            separate(builder, &mut written);
            expression.build(builder);
        }
        for expr in &self.after_expressions {
            separate(builder, &mut written);
            expr.build(builder);
        }
    }
}

fn separate(builder: &mut dyn Builder, written: &mut bool) {
    if *written {
        builder.write_char(' ');
    }
    *written = true;
}

/// The clause variants a statement understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseKind {
    /// `SELECT` column list.
    Select(Select),
    /// `FROM` source list.
    From(FromClause),
    /// `WHERE` conditions.
    Where(Where),
    /// `ORDER BY` columns.
    OrderBy(OrderBy),
    /// `LIMIT` / `OFFSET`.
    Limit(Limit),
}

impl ClauseKind {
    /// The clause name; also the key a statement stores it under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::From(_) => "FROM",
            Self::Where(_) => "WHERE",
            Self::OrderBy(_) => "ORDER BY",
            Self::Limit(_) => "LIMIT",
        }
    }

    /// Position of the clause in a statement rendered by priority.
    #[must_use]
    pub const fn priority(&self) -> f64 {
        match self {
            Self::Select(_) => 10.0,
            Self::From(_) => 20.0,
            Self::Where(_) => 30.0,
            Self::OrderBy(_) => 40.0,
            Self::Limit(_) => 50.0,
        }
    }

    /// Renders the variant body.
    pub fn build(&self, builder: &mut dyn Builder) {
        match self {
            Self::Select(select) => select.build(builder),
            Self::From(from) => from.build(builder),
            Self::Where(filter) => filter.build(builder),
            Self::OrderBy(order_by) => order_by.build(builder),
            Self::Limit(limit) => limit.build(builder),
        }
    }

    /// Merges this clause into the live clause of the same name.
    ///
    /// Variants without their own rule replace the existing expression.
    pub fn merge_into(self, clause: &mut Clause) {
        match self {
            Self::Where(filter) => filter.merge_into(clause),
            Self::Limit(limit) => limit.merge_into(clause),
            other => clause.expression = Some(other),
        }
    }
}

impl From<Select> for ClauseKind {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

impl From<FromClause> for ClauseKind {
    fn from(from: FromClause) -> Self {
        Self::From(from)
    }
}

impl From<Where> for ClauseKind {
    fn from(filter: Where) -> Self {
        Self::Where(filter)
    }
}

impl From<OrderBy> for ClauseKind {
    fn from(order_by: OrderBy) -> Self {
        Self::OrderBy(order_by)
    }
}

impl From<Limit> for ClauseKind {
    fn from(limit: Limit) -> Self {
        Self::Limit(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;
    use crate::expression::{Column, Expr};
    use crate::statement::Statement;

    fn render(clause: &Clause) -> String {
        let dialect = GenericDialect::new();
        let mut stmt = Statement::new(&dialect);
        clause.build(&mut stmt);
        stmt.into_parts().0
    }

    #[test]
    fn test_slots_render_in_fixed_order() {
        let clause = Clause {
            name: String::from("JOIN"),
            before_expressions: vec![Expr::new("LEFT").into()],
            after_name_expressions: vec![Column::new("orders").into()],
            after_expressions: vec![Expr::new("ON o.user_id = u.id").into()],
            ..Clause::default()
        };
        assert_eq!(render(&clause), "LEFT JOIN \"orders\" ON o.user_id = u.id");
    }

    #[test]
    fn test_empty_name_is_skipped() {
        let clause = Clause {
            expression: Some(Limit::new(5).into()),
            ..Clause::default()
        };
        assert_eq!(render(&clause), "LIMIT 5");
    }

    #[test]
    fn test_custom_builder_overrides_slots() {
        fn fetch_first(clause: &Clause, builder: &mut dyn Builder) {
            if let Some(ClauseKind::Limit(limit)) = &clause.expression {
                builder.write_str(&format!("FETCH FIRST {} ROWS ONLY", limit.limit));
            }
        }

        let clause = Clause {
            name: String::from("LIMIT"),
            expression: Some(Limit::new(3).into()),
            builder: Some(fetch_first),
            ..Clause::default()
        };
        assert_eq!(render(&clause), "FETCH FIRST 3 ROWS ONLY");
    }

    #[test]
    fn test_default_merge_replaces_expression() {
        let mut clause = Clause::named("SELECT");
        ClauseKind::from(Select::new().column(Column::new("a"))).merge_into(&mut clause);
        ClauseKind::from(Select::new().column(Column::new("b"))).merge_into(&mut clause);
        assert_eq!(clause.name, "SELECT");
        assert_eq!(render(&clause), "SELECT \"b\"");
    }
}
