//! Database dialect implementations.
//!
//! A migration dialect extends the rendering rules of a
//! [`tessera_sql::Dialect`] with what the migrator needs to know about one
//! database system: concrete column types, where the catalog lives, and the
//! DDL statements whose shape differs between systems.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use tessera_sql::{Column, Dialect, Expr, Expression, Table};

use crate::schema::Field;

/// An existence question asked of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<'a> {
    /// Does `table` exist?
    Table {
        /// Current database name.
        database: &'a str,
        /// Table name.
        table: &'a str,
    },
    /// Does `table` have `column`?
    Column {
        /// Current database name.
        database: &'a str,
        /// Table name.
        table: &'a str,
        /// Physical column name.
        column: &'a str,
    },
    /// Does `table` carry a constraint called `name`?
    Constraint {
        /// Current database name.
        database: &'a str,
        /// Table name.
        table: &'a str,
        /// Constraint name.
        name: &'a str,
    },
    /// Does `table` have an index called `name`?
    Index {
        /// Current database name.
        database: &'a str,
        /// Table name.
        table: &'a str,
        /// Index name.
        name: &'a str,
    },
}

/// Where a probe counts rows: a catalog source and its filter conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// The `FROM` source.
    pub source: Expression,
    /// Conditions joined with `AND`.
    pub conditions: Vec<Expression>,
}

impl Catalog {
    /// A catalog table written verbatim.
    #[must_use]
    pub fn new(source: impl Into<Expression>) -> Self {
        Self {
            source: source.into(),
            conditions: Vec::new(),
        }
    }

    /// Adds a condition with one bound value.
    #[must_use]
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(Expr::new(format!("{column} = ?")).var(Expression::value(value)).into());
        self
    }

    /// Adds a raw condition.
    #[must_use]
    pub fn raw(mut self, condition: &str) -> Self {
        self.conditions.push(Expr::new(condition).into());
        self
    }
}

/// Where an index access method goes in `CREATE INDEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexUsing {
    /// Access methods are not supported and are left out.
    Unsupported,
    /// `CREATE INDEX i ON t USING m (cols)`.
    BeforeColumns,
    /// `CREATE INDEX i ON t (cols) USING m`.
    AfterColumns,
}

/// Trait for database-specific migration SQL.
pub trait MigrationDialect: Dialect + Send + Sync {
    /// Returns the column type for a field; an explicit type wins.
    fn data_type_of(&self, field: &Field) -> String {
        field
            .db_data_type
            .clone()
            .unwrap_or_else(|| self.type_name(field))
    }

    /// Maps the logical type of a field.
    fn type_name(&self, field: &Field) -> String;

    /// Returns the keyword appended to auto-increment columns, if the
    /// dialect does not express them through the type.
    fn auto_increment_keyword(&self) -> Option<&'static str>;

    /// Returns the query yielding the current database name.
    fn current_database_sql(&self) -> &'static str;

    /// Returns the catalog source and filters answering a probe.
    fn catalog(&self, probe: &Probe<'_>) -> Catalog;

    /// Renames a table.
    fn rename_table(&self, old: &str, new: &str) -> Expr {
        Expr::new("ALTER TABLE ? RENAME TO ?")
            .var(Table::new(old))
            .var(Table::new(new))
    }

    /// Changes the type of a column.
    fn alter_column(&self, table: &str, column: &str, data_type: &str) -> Expr {
        Expr::new("ALTER TABLE ? ALTER COLUMN ? TYPE ?")
            .var(Table::new(table))
            .var(Column::new(column))
            .var(Expr::new(data_type))
    }

    /// Drops an index of `table`.
    fn drop_index(&self, table: &str, name: &str) -> Expr {
        let _ = table;
        Expr::new("DROP INDEX ?").var(Column::new(name))
    }

    /// Renames an index of `table`.
    fn rename_index(&self, table: &str, old: &str, new: &str) -> Expr {
        let _ = table;
        Expr::new("ALTER INDEX ? RENAME TO ?")
            .var(Column::new(old))
            .var(Column::new(new))
    }

    /// Returns whether this dialect supports ALTER COLUMN.
    fn supports_alter_column(&self) -> bool;

    /// Returns whether this dialect supports renaming indexes.
    fn supports_rename_index(&self) -> bool;

    /// Returns whether this dialect supports adding and dropping constraints
    /// after table creation.
    fn supports_add_constraint(&self) -> bool;

    /// Returns whether indexes can be declared inside `CREATE TABLE`.
    fn supports_inline_index(&self) -> bool {
        false
    }

    /// Returns whether index comments are supported.
    fn supports_index_comment(&self) -> bool {
        false
    }

    /// Returns where an index access method is written.
    fn index_using(&self) -> IndexUsing {
        IndexUsing::Unsupported
    }
}

/// Returns the integer width of a field, defaulting to 64 bits.
pub(crate) fn int_width(field: &Field) -> u32 {
    field.size.filter(|size| *size > 0).unwrap_or(64)
}
