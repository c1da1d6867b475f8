//! SQLite dialect for migrations.
//!
//! SQLite keeps its catalog in `sqlite_master` and exposes columns through
//! the `pragma_table_info` table-valued function. It cannot change a column
//! type or add a constraint to an existing table, and an auto-increment
//! primary key has to be declared in the column type itself.

use tessera_sql::{Dialect, Expr, Expression, Table};

use super::{Catalog, MigrationDialect, Probe};
use crate::schema::{DataType, Field};

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

impl MigrationDialect for SqliteDialect {
    fn type_name(&self, field: &Field) -> String {
        let name = match field.data_type {
            DataType::Int | DataType::Uint if field.auto_increment && field.primary_key => {
                "INTEGER PRIMARY KEY AUTOINCREMENT"
            }
            DataType::Bool | DataType::Int | DataType::Uint => "INTEGER",
            DataType::Float => "REAL",
            DataType::String | DataType::Text | DataType::Json | DataType::Uuid => "TEXT",
            DataType::Time => "DATETIME",
            DataType::Bytes => "BLOB",
        };
        name.to_owned()
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        None
    }

    fn current_database_sql(&self) -> &'static str {
        "SELECT 'main'"
    }

    fn catalog(&self, probe: &Probe<'_>) -> Catalog {
        let master = || Catalog::new(Table::raw("sqlite_master"));
        match *probe {
            Probe::Table { table, .. } => master().eq("type", "table").eq("name", table),
            Probe::Column { table, column, .. } => {
                let source: Expression = Expr::new("pragma_table_info(?)")
                    .var(Expression::value(table))
                    .into();
                Catalog::new(source).eq("name", column)
            }
            Probe::Constraint { table, name, .. } => {
                let mut catalog = master().eq("type", "table").eq("name", table);
                let pattern = format!("%CONSTRAINT {} %", self.quote_identifier(name));
                catalog
                    .conditions
                    .push(Expr::new("sql LIKE ?").var(Expression::value(pattern)).into());
                catalog
            }
            Probe::Index { table, name, .. } => master()
                .eq("type", "index")
                .eq("tbl_name", table)
                .eq("name", name),
        }
    }

    fn supports_alter_column(&self) -> bool {
        false
    }

    fn supports_rename_index(&self) -> bool {
        false
    }

    fn supports_add_constraint(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_increment_key_is_declared_in_type() {
        let dialect = SqliteDialect::new();
        let id = Field::new("id", DataType::Int).primary_key().auto_increment();
        assert_eq!(dialect.data_type_of(&id), "INTEGER PRIMARY KEY AUTOINCREMENT");
        assert!(dialect.auto_increment_keyword().is_none());

        let plain = Field::new("count", DataType::Uint);
        assert_eq!(dialect.data_type_of(&plain), "INTEGER");
    }

    #[test]
    fn test_explicit_type_wins() {
        let dialect = SqliteDialect::new();
        let field = Field::new("price", DataType::Float).db_type("NUMERIC(10,2)");
        assert_eq!(dialect.data_type_of(&field), "NUMERIC(10,2)");
    }

    #[test]
    fn test_dialect_properties() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.name(), "sqlite");
        assert_eq!(dialect.placeholder(2), "?");
        assert!(!dialect.supports_alter_column());
        assert!(!dialect.supports_add_constraint());
        assert!(!dialect.supports_inline_index());
    }
}
