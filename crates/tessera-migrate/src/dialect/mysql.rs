//! MySQL dialect for migrations.

use tessera_sql::{Column, Dialect, Expr, Table};

use super::{int_width, Catalog, IndexUsing, MigrationDialect, Probe};
use crate::schema::{DataType, Field};

/// MySQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }
}

impl MigrationDialect for MySqlDialect {
    fn type_name(&self, field: &Field) -> String {
        match field.data_type {
            DataType::Bool => String::from("boolean"),
            DataType::Int | DataType::Uint => {
                let name = match int_width(field) {
                    ..=8 => "tinyint",
                    ..=16 => "smallint",
                    ..=24 => "mediumint",
                    ..=32 => "int",
                    _ => "bigint",
                };
                if field.data_type == DataType::Uint {
                    format!("{name} unsigned")
                } else {
                    name.to_owned()
                }
            }
            DataType::Float => match field.size {
                Some(size) if size <= 32 => String::from("float"),
                _ => String::from("double"),
            },
            DataType::String => match field.size {
                Some(size) if size > 0 => format!("varchar({size})"),
                _ if field.primary_key || field.unique => String::from("varchar(191)"),
                _ => String::from("longtext"),
            },
            DataType::Text => String::from("longtext"),
            DataType::Time => format!("datetime({})", field.precision.unwrap_or(3)),
            DataType::Bytes => String::from("longblob"),
            DataType::Json => String::from("json"),
            DataType::Uuid => String::from("char(36)"),
        }
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    fn current_database_sql(&self) -> &'static str {
        "SELECT DATABASE()"
    }

    fn catalog(&self, probe: &Probe<'_>) -> Catalog {
        match *probe {
            Probe::Table { database, table } => {
                Catalog::new(Table::raw("information_schema.tables"))
                    .eq("table_schema", database)
                    .eq("table_name", table)
                    .eq("table_type", "BASE TABLE")
            }
            Probe::Column {
                database,
                table,
                column,
            } => Catalog::new(Table::raw("information_schema.columns"))
                .eq("table_schema", database)
                .eq("table_name", table)
                .eq("column_name", column),
            Probe::Constraint {
                database,
                table,
                name,
            } => Catalog::new(Table::raw("information_schema.table_constraints"))
                .eq("constraint_schema", database)
                .eq("table_name", table)
                .eq("constraint_name", name),
            Probe::Index {
                database,
                table,
                name,
            } => Catalog::new(Table::raw("information_schema.statistics"))
                .eq("table_schema", database)
                .eq("table_name", table)
                .eq("index_name", name),
        }
    }

    fn rename_table(&self, old: &str, new: &str) -> Expr {
        Expr::new("RENAME TABLE ? TO ?")
            .var(Table::new(old))
            .var(Table::new(new))
    }

    fn alter_column(&self, table: &str, column: &str, data_type: &str) -> Expr {
        Expr::new("ALTER TABLE ? MODIFY COLUMN ? ?")
            .var(Table::new(table))
            .var(Column::new(column))
            .var(Expr::new(data_type))
    }

    fn drop_index(&self, table: &str, name: &str) -> Expr {
        Expr::new("DROP INDEX ? ON ?")
            .var(Column::new(name))
            .var(Table::new(table))
    }

    fn rename_index(&self, table: &str, old: &str, new: &str) -> Expr {
        Expr::new("ALTER TABLE ? RENAME INDEX ? TO ?")
            .var(Table::new(table))
            .var(Column::new(old))
            .var(Column::new(new))
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

    fn supports_inline_index(&self) -> bool {
        true
    }

    fn supports_index_comment(&self) -> bool {
        true
    }

    fn index_using(&self) -> IndexUsing {
        IndexUsing::AfterColumns
    }
}
