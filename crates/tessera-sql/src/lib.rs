//! # tessera-sql
//!
//! Composable SQL fragments: expressions, mergeable clauses and a statement
//! renderer that expands `?` templates into dialect-specific SQL plus bound
//! values.
//!
//! This crate provides:
//! - Expression primitives (tables, columns, raw fragments, literals, lists)
//! - Named clauses with a fixed slot layout and per-variant merge rules
//! - A [`Statement`] renderer that owns quoting and placeholder numbering
//!
//! ## Templates
//!
//! DDL and catalog queries are written once as `?` templates. Identifiers,
//! raw type names and literals are injected through the var list, never by
//! string concatenation:
//!
//! ```rust
//! use tessera_sql::{Column, Expr, Expression, GenericDialect, Statement, Table};
//!
//! let dialect = GenericDialect::new();
//! let mut stmt = Statement::new(&dialect).table("items");
//! stmt.render_template(
//!     "CREATE TABLE ? (? ?,PRIMARY KEY ?)",
//!     vec![
//!         Table::current().into(),
//!         Column::new("id").into(),
//!         Expr::new("INTEGER").into(),
//!         Expression::list([Column::new("id")]),
//!     ],
//! );
//!
//! assert_eq!(
//!     stmt.sql(),
//!     "CREATE TABLE \"items\" (\"id\" INTEGER,PRIMARY KEY (\"id\"))"
//! );
//! ```
//!
//! ## Clause merging
//!
//! A statement keeps one live clause per name. Adding the same clause twice
//! merges the two according to the clause's own rule:
//!
//! ```rust
//! use tessera_sql::clause::Limit;
//! use tessera_sql::{GenericDialect, Statement};
//!
//! let dialect = GenericDialect::new();
//! let mut stmt = Statement::new(&dialect);
//! stmt.add_clause(Limit::new(10));
//! stmt.add_clause(Limit::offset(5));
//! stmt.build(&["LIMIT"]);
//!
//! assert_eq!(stmt.sql(), "LIMIT 10 OFFSET 5");
//! ```

pub mod clause;
pub mod dialect;
pub mod expression;
pub mod statement;
pub mod value;

pub use clause::{Clause, ClauseBuilder, ClauseKind};
pub use dialect::{Dialect, GenericDialect};
pub use expression::{Column, Expr, Expression, Table, CURRENT_TABLE, PRIMARY_KEY};
pub use statement::{Builder, Statement};
pub use value::{SqlValue, ToSqlValue};
