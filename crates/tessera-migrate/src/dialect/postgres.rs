//! PostgreSQL dialect for migrations.

use tessera_sql::{Dialect, Table};

use super::{int_width, Catalog, IndexUsing, MigrationDialect, Probe};
use crate::schema::{DataType, Field};

/// PostgreSQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}

impl MigrationDialect for PostgresDialect {
    fn type_name(&self, field: &Field) -> String {
        match field.data_type {
            DataType::Bool => String::from("BOOLEAN"),
            DataType::Int | DataType::Uint => {
                let width = int_width(field);
                let name = match (field.auto_increment, width) {
                    (true, ..=16) => "SMALLSERIAL",
                    (true, ..=32) => "SERIAL",
                    (true, _) => "BIGSERIAL",
                    (false, ..=16) => "SMALLINT",
                    (false, ..=32) => "INTEGER",
                    (false, _) => "BIGINT",
                };
                name.to_owned()
            }
            DataType::Float => match field.size {
                Some(size) if size <= 32 => String::from("REAL"),
                _ => String::from("DOUBLE PRECISION"),
            },
            DataType::String => match field.size {
                Some(size) if size > 0 => format!("VARCHAR({size})"),
                _ => String::from("TEXT"),
            },
            DataType::Text => String::from("TEXT"),
            DataType::Time => match field.precision {
                Some(precision) => format!("TIMESTAMPTZ({precision})"),
                None => String::from("TIMESTAMPTZ"),
            },
            DataType::Bytes => String::from("BYTEA"),
            DataType::Json => String::from("JSONB"),
            DataType::Uuid => String::from("UUID"),
        }
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        None
    }

    fn current_database_sql(&self) -> &'static str {
        "SELECT CURRENT_DATABASE()"
    }

    fn catalog(&self, probe: &Probe<'_>) -> Catalog {
        match *probe {
            Probe::Table { database, table } => {
                Catalog::new(Table::raw("information_schema.tables"))
                    .eq("table_catalog", database)
                    .raw("table_schema = CURRENT_SCHEMA()")
                    .eq("table_name", table)
                    .eq("table_type", "BASE TABLE")
            }
            Probe::Column {
                database,
                table,
                column,
            } => Catalog::new(Table::raw("information_schema.columns"))
                .eq("table_catalog", database)
                .raw("table_schema = CURRENT_SCHEMA()")
                .eq("table_name", table)
                .eq("column_name", column),
            Probe::Constraint {
                database,
                table,
                name,
            } => Catalog::new(Table::raw("information_schema.table_constraints"))
                .eq("table_catalog", database)
                .raw("table_schema = CURRENT_SCHEMA()")
                .eq("table_name", table)
                .eq("constraint_name", name),
            Probe::Index { table, name, .. } => Catalog::new(Table::raw("pg_indexes"))
                .raw("schemaname = CURRENT_SCHEMA()")
                .eq("tablename", table)
                .eq("indexname", name),
        }
    }

    fn supports_alter_column(&self) -> bool {
        true
    }

    fn supports_rename_index(&self) -> bool {
        true
    }

    fn supports_add_constraint(&self) -> bool {
        true
    }

    fn index_using(&self) -> IndexUsing {
        IndexUsing::BeforeColumns
    }
}
