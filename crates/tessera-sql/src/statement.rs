//! The statement renderer.
//!
//! [`Statement`] accumulates SQL text and bound values while expressions and
//! clauses write themselves into it through the [`Builder`] trait. It is the
//! only place that knows how the active dialect quotes identifiers and spells
//! placeholders.

use std::collections::HashMap;

use crate::clause::{Clause, ClauseKind};
use crate::dialect::Dialect;
use crate::expression::{Column, Expr, Expression, Table, CURRENT_TABLE, PRIMARY_KEY};
use crate::value::SqlValue;

/// Output sink that expressions render into.
pub trait Builder {
    /// Writes a single character.
    fn write_char(&mut self, ch: char);

    /// Writes SQL text verbatim.
    fn write_str(&mut self, sql: &str);

    /// Writes a table or column reference, quoted per the dialect.
    fn write_quoted(&mut self, field: &Expression);

    /// Writes each var, comma separated: references are quoted, literals
    /// become placeholders, lists are parenthesized.
    fn add_var(&mut self, vars: &[Expression]);

    /// Returns the quoted form of a reference without writing it.
    fn quote(&self, field: &Expression) -> String;
}

/// A single statement being rendered.
///
/// Single-writer: build one statement per task and discard it after
/// [`Statement::into_parts`].
pub struct Statement<'d> {
    dialect: &'d dyn Dialect,
    table: String,
    primary_key: Option<String>,
    clauses: HashMap<String, Clause>,
    sql: String,
    vars: Vec<SqlValue>,
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("dialect", &self.dialect.name())
            .field("table", &self.table)
            .field("sql", &self.sql)
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

impl<'d> Statement<'d> {
    /// Creates an empty statement for a dialect.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            table: String::new(),
            primary_key: None,
            clauses: HashMap::new(),
            sql: String::new(),
            vars: Vec::new(),
        }
    }

    /// Sets the table that [`Table::current`] resolves to.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the column that [`Column::primary`] resolves to.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Returns the current table.
    #[must_use]
    pub fn current_table(&self) -> &str {
        &self.table
    }

    /// Adds a clause, merging it into the live clause of the same name.
    pub fn add_clause(&mut self, kind: impl Into<ClauseKind>) {
        let kind = kind.into();
        let name = kind.name();
        let builder = self.dialect.clause_builder(name);
        let clause = self
            .clauses
            .entry(name.to_owned())
            .or_insert_with(|| Clause {
                priority: kind.priority(),
                ..Clause::default()
            });

        clause.name = name.to_owned();
        clause.builder = builder;
        kind.merge_into(clause);
    }

    /// Returns the live clause stored under `name`.
    #[must_use]
    pub fn clause(&self, name: &str) -> Option<&Clause> {
        self.clauses.get(name)
    }

    /// Renders the named live clauses in the given order, space separated.
    /// Names without a live clause are skipped.
    pub fn build(&mut self, names: &[&str]) {
        let clauses = std::mem::take(&mut self.clauses);
        let mut written = false;
        for name in names {
            if let Some(clause) = clauses.get(*name) {
                if written {
                    self.sql.push(' ');
                }
                clause.build(self);
                written = true;
            }
        }
        self.clauses = clauses;
    }

    /// Renders every live clause ordered by priority.
    pub fn build_all(&mut self) {
        let mut ordered: Vec<(&String, f64)> = self
            .clauses
            .iter()
            .map(|(name, clause)| (name, clause.priority))
            .collect();
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        let names: Vec<String> = ordered.into_iter().map(|(name, _)| name.clone()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.build(&names);
    }

    /// Renders a single expression at the end of the statement.
    pub fn render(&mut self, expr: &Expression) {
        expr.build(self);
    }

    /// Renders a `?` template with its vars.
    pub fn render_template(&mut self, sql: &str, vars: Vec<Expression>) {
        Expr::new(sql).vars(vars).build(self);
    }

    /// Returns the SQL rendered so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound values so far.
    #[must_use]
    pub fn vars(&self) -> &[SqlValue] {
        &self.vars
    }

    /// Consumes the statement and returns the SQL and bound values.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.vars)
    }

    fn quote_table(&self, table: &Table) -> String {
        let mut quoted = if table.name == CURRENT_TABLE {
            self.dialect.quote_identifier(&self.table)
        } else if table.raw {
            table.name.clone()
        } else {
            self.dialect.quote_identifier(&table.name)
        };

        if let Some(alias) = &table.alias {
            quoted.push_str(" AS ");
            quoted.push_str(&self.dialect.quote_identifier(alias));
        }
        quoted
    }

    fn quote_column(&self, column: &Column) -> String {
        let mut quoted = String::new();
        if let Some(table) = &column.table {
            let table = if table == CURRENT_TABLE {
                &self.table
            } else {
                table
            };
            quoted.push_str(&self.dialect.quote_identifier(table));
            quoted.push('.');
        }

        if column.name == PRIMARY_KEY {
            if let Some(primary_key) = &self.primary_key {
                quoted.push_str(&self.dialect.quote_identifier(primary_key));
            }
        } else if column.raw {
            quoted.push_str(&column.name);
        } else {
            quoted.push_str(&self.dialect.quote_identifier(&column.name));
        }

        if let Some(alias) = &column.alias {
            quoted.push_str(" AS ");
            quoted.push_str(&self.dialect.quote_identifier(alias));
        }
        quoted
    }
}

impl Builder for Statement<'_> {
    fn write_char(&mut self, ch: char) {
        self.sql.push(ch);
    }

    fn write_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn write_quoted(&mut self, field: &Expression) {
        match field {
            Expression::Table(table) => {
                let quoted = self.quote_table(table);
                self.sql.push_str(&quoted);
            }
            Expression::Column(column) => {
                let quoted = self.quote_column(column);
                self.sql.push_str(&quoted);
            }
            other => other.build(self),
        }
    }

    fn add_var(&mut self, vars: &[Expression]) {
        for (idx, var) in vars.iter().enumerate() {
            if idx > 0 {
                self.sql.push(',');
            }
            match var {
                Expression::Table(_) | Expression::Column(_) => self.write_quoted(var),
                Expression::Expr(expr) => expr.build(self),
                Expression::Value(value) => {
                    self.vars.push(value.clone());
                    let placeholder = self.dialect.placeholder(self.vars.len());
                    self.sql.push_str(&placeholder);
                }
                Expression::List(items) if items.is_empty() => self.sql.push_str("(NULL)"),
                Expression::List(items) => {
                    self.sql.push('(');
                    self.add_var(items);
                    self.sql.push(')');
                }
            }
        }
    }

    fn quote(&self, field: &Expression) -> String {
        match field {
            Expression::Table(table) => self.quote_table(table),
            Expression::Column(column) => self.quote_column(column),
            Expression::Expr(expr) => expr.sql.clone(),
            Expression::Value(SqlValue::Text(name)) => self.dialect.quote_identifier(name),
            Expression::Value(value) => value.to_sql_inline(),
            Expression::List(items) => {
                let quoted: Vec<String> = items.iter().map(|item| self.quote(item)).collect();
                format!("({})", quoted.join(","))
            }
        }
    }
}
