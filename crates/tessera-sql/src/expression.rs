//! Renderable expression primitives.
//!
//! Every expression writes itself through a [`Builder`]. Identifier quoting
//! and placeholder numbering belong to the builder, so the same expression
//! renders correctly for any dialect.

use crate::statement::Builder;
use crate::value::{SqlValue, ToSqlValue};

/// Table name resolved to the statement's current table at render time.
pub const CURRENT_TABLE: &str = "@@@table@@@";

/// Column name resolved to the statement's primary key column at render time.
pub const PRIMARY_KEY: &str = "@@@primary_key@@@";

/// A table reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Optional alias, rendered as `AS "alias"`.
    pub alias: Option<String>,
    /// Writes `name` verbatim instead of quoting it.
    pub raw: bool,
}

impl Table {
    /// Creates a quoted table reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            raw: false,
        }
    }

    /// A reference to the table of the statement being rendered.
    #[must_use]
    pub fn current() -> Self {
        Self::new(CURRENT_TABLE)
    }

    /// A table reference written verbatim, e.g. `information_schema.tables`.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            raw: true,
            ..Self::new(sql)
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A column reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Column {
    /// Optional table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
    /// Optional alias, rendered as `AS "alias"`.
    pub alias: Option<String>,
    /// Writes `name` verbatim instead of quoting it.
    pub raw: bool,
}

impl Column {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
            alias: None,
            raw: false,
        }
    }

    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::new(name)
        }
    }

    /// The primary key column of the current table.
    #[must_use]
    pub fn primary() -> Self {
        Self::qualified(CURRENT_TABLE, PRIMARY_KEY)
    }

    /// A column reference written verbatim.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            raw: true,
            ..Self::new(sql)
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A raw SQL fragment with positional `?` markers.
///
/// This is also the statement template: each `?` is replaced by the next var,
/// rendered through [`Builder::add_var`]. Markers without a matching var are
/// written as a literal `?`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expr {
    /// The SQL text.
    pub sql: String,
    /// Values substituted for the `?` markers, in order.
    pub vars: Vec<Expression>,
}

impl Expr {
    /// Creates a fragment without vars.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            vars: Vec::new(),
        }
    }

    /// Appends a var.
    #[must_use]
    pub fn var(mut self, var: impl Into<Expression>) -> Self {
        self.vars.push(var.into());
        self
    }

    /// Appends several vars.
    #[must_use]
    pub fn vars(mut self, vars: impl IntoIterator<Item = Expression>) -> Self {
        self.vars.extend(vars);
        self
    }

    /// Renders the fragment, expanding each marker.
    pub fn build(&self, builder: &mut dyn Builder) {
        let mut vars = self.vars.iter();
        let mut segments = self.sql.split('?');

        if let Some(head) = segments.next() {
            builder.write_str(head);
        }

        for segment in segments {
            match vars.next() {
                Some(var) => builder.add_var(std::slice::from_ref(var)),
                None => builder.write_char('?'),
            }
            builder.write_str(segment);
        }
    }
}

/// Any renderable token.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A table reference.
    Table(Table),
    /// A column reference.
    Column(Column),
    /// A raw fragment, possibly with nested vars.
    Expr(Expr),
    /// A bound literal.
    Value(SqlValue),
    /// A parenthesized, comma separated list; nests for composite shapes.
    List(Vec<Expression>),
}

impl Expression {
    /// A bound literal.
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }

    /// A list of expressions.
    #[must_use]
    pub fn list<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Renders the expression.
    pub fn build(&self, builder: &mut dyn Builder) {
        match self {
            Self::Table(_) | Self::Column(_) => builder.write_quoted(self),
            Self::Expr(expr) => expr.build(builder),
            Self::Value(_) | Self::List(_) => builder.add_var(std::slice::from_ref(self)),
        }
    }
}

impl From<Table> for Expression {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<Column> for Expression {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<Expr> for Expression {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<SqlValue> for Expression {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<Self>> for Expression {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}
