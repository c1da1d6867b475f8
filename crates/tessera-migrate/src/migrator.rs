//! The migrator.
//!
//! Creation follows dependency order, removal the reverse. Every statement is
//! rendered from a `?` template through [`tessera_sql::Statement`] and run by
//! the [`Store`] one at a time; the first failure stops the batch and leaves
//! earlier statements applied.
//!
//! Migration is additive: `auto_migrate` creates missing tables, columns,
//! constraints, indexes and join tables, and never drops or narrows
//! anything that already exists.

use std::collections::HashSet;

use tessera_sql::clause::{FromClause, Select, Where};
use tessera_sql::{Column, Expr, Expression, SqlValue, Statement, Table};
use tracing::{debug, info, warn};

use crate::config::MigratorConfig;
use crate::dialect::{IndexUsing, MigrationDialect, Probe};
use crate::error::{MigrateError, Result};
use crate::graph;
use crate::model::{Model, ModelRef};
use crate::schema::{CheckConstraint, Constraint, Field, Index, IndexOption, Schema};
use crate::store::Store;

/// Options for view creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOption {
    /// Use `CREATE OR REPLACE VIEW`.
    pub replace: bool,
    /// `WITH ... CHECK OPTION` clause.
    pub check_option: Option<String>,
    /// The view query.
    pub query: String,
}

/// A constraint resolved from a name.
enum Resolved<'a> {
    Foreign(&'a Constraint),
    Check(&'a CheckConstraint),
}

impl Resolved<'_> {
    fn name(&self) -> &str {
        match self {
            Self::Foreign(constraint) => &constraint.name,
            Self::Check(check) => &check.name,
        }
    }
}

/// Applies model schemas to a store.
#[derive(Debug)]
pub struct Migrator<D, S> {
    dialect: D,
    store: S,
    config: MigratorConfig,
}

impl<D: MigrationDialect, S: Store> Migrator<D, S> {
    /// Creates a migrator with the default configuration.
    pub fn new(dialect: D, store: S) -> Self {
        Self::with_config(dialect, store, MigratorConfig::default())
    }

    /// Creates a migrator.
    pub const fn with_config(dialect: D, store: S, config: MigratorConfig) -> Self {
        Self {
            dialect,
            store,
            config,
        }
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Creates missing tables, columns, constraints, indexes and join tables.
    ///
    /// Referenced models that were not supplied are added. Probes that fail
    /// count as "absent".
    ///
    /// # Errors
    ///
    /// Returns the first parse or execution failure.
    pub async fn auto_migrate(&self, models: &[ModelRef]) -> Result<()> {
        let ordered = self.reorder_models(models, true)?;
        let deferred = self.config.allow_deferred_constraints_when_auto_migrate
            && self.dialect.supports_add_constraint();

        let mut created = HashSet::new();
        let mut joins = Vec::new();
        let mut pending: Vec<(Schema, String)> = Vec::new();

        for model in &ordered {
            let schema = model.schema()?;

            if self.has_table(&schema).await {
                self.migrate_existing(&schema, deferred, &mut pending).await?;
            } else {
                self.create_table_schema(&schema, !deferred).await?;
                created.insert(schema.table.clone());
                if deferred {
                    defer_constraints(&schema, &mut pending);
                }
            }
            joins.extend(schema.join_tables());
        }

        for schema in self.create_join_tables(joins, &mut created, !deferred).await? {
            if deferred {
                defer_constraints(&schema, &mut pending);
            }
        }

        for (schema, name) in &pending {
            if self.has_constraint_named(&schema.table, name).await {
                continue;
            }
            if let Some(constraint) = schema.constraint(name) {
                self.add_foreign_key(schema, constraint).await?;
            }
        }

        Ok(())
    }

    async fn migrate_existing(
        &self,
        schema: &Schema,
        deferred: bool,
        pending: &mut Vec<(Schema, String)>,
    ) -> Result<()> {
        for field in &schema.fields {
            if !self.has_column_named(&schema.table, &field.db_name).await {
                self.add_field(schema, field).await?;
            }
        }

        for constraint in schema.constraints() {
            if self.has_constraint_named(&schema.table, &constraint.name).await {
                continue;
            }
            if !self.dialect.supports_add_constraint() {
                warn!(
                    table = %schema.table,
                    constraint = %constraint.name,
                    dialect = self.dialect.name(),
                    "Cannot add foreign key to an existing table"
                );
            } else if deferred {
                pending.push((schema.clone(), constraint.name.clone()));
            } else {
                self.add_foreign_key(schema, constraint).await?;
            }
        }

        for check in &schema.checks {
            if self.has_constraint_named(&schema.table, &check.name).await {
                continue;
            }
            if self.dialect.supports_add_constraint() {
                self.add_check(schema, check).await?;
            } else {
                warn!(
                    table = %schema.table,
                    constraint = %check.name,
                    dialect = self.dialect.name(),
                    "Cannot add check constraint to an existing table"
                );
            }
        }

        for index in &schema.indexes {
            if !self.has_index_named(&schema.table, &index.name).await {
                self.add_index(schema, index).await?;
            }
        }

        Ok(())
    }

    /// Creates tables in dependency order, then their join tables.
    ///
    /// # Errors
    ///
    /// Returns the first parse or execution failure; tables created before
    /// it stay.
    pub async fn create_table(&self, models: &[ModelRef]) -> Result<()> {
        let mut created = HashSet::new();
        let mut joins = Vec::new();
        for model in self.reorder_models(models, false)? {
            let schema = model.schema()?;
            self.create_table_schema(&schema, true).await?;
            created.insert(schema.table.clone());
            joins.extend(schema.join_tables());
        }
        self.create_join_tables(joins, &mut created, true).await?;
        Ok(())
    }

    async fn create_join_tables(
        &self,
        joins: Vec<ModelRef>,
        created: &mut HashSet<String>,
        inline_constraints: bool,
    ) -> Result<Vec<Schema>> {
        let mut made = Vec::new();
        for join in joins {
            let schema = join.schema()?;
            if created.contains(&schema.table) || self.has_table(&schema).await {
                continue;
            }
            self.create_table_schema(&schema, inline_constraints).await?;
            created.insert(schema.table.clone());
            made.push(schema);
        }
        Ok(made)
    }

    async fn create_table_schema(&self, schema: &Schema, inline_constraints: bool) -> Result<()> {
        let mut sql = String::from("CREATE TABLE ? (");
        let mut vars: Vec<Expression> = vec![Table::current().into()];
        let mut key_in_type = false;

        for field in &schema.fields {
            let data_type = self.full_data_type(field);
            key_in_type |= data_type.sql.to_uppercase().contains("PRIMARY KEY");
            sql.push_str("? ?,");
            vars.push(Column::new(&field.db_name).into());
            vars.push(data_type.into());
        }

        let primary = schema.primary_fields();
        if !key_in_type && !primary.is_empty() {
            sql.push_str("PRIMARY KEY ?,");
            vars.push(Expression::list(
                primary.iter().map(|field| Column::new(&field.db_name)),
            ));
        }

        let inline_indexes =
            self.dialect.supports_inline_index() && !self.config.create_index_after_create_table;
        if inline_indexes {
            for index in &schema.indexes {
                sql.push_str("?,");
                vars.push(self.inline_index(index).into());
            }
        }

        if inline_constraints {
            for constraint in schema.constraints() {
                sql.push_str("?,");
                vars.push(foreign_key(constraint).into());
            }
        }

        for check in &schema.checks {
            sql.push_str("?,");
            vars.push(check_constraint(check).into());
        }

        if sql.ends_with(',') {
            sql.pop();
        }
        sql.push(')');

        self.run(self.render(schema, Expr::new(sql).vars(vars))).await?;
        info!(table = %schema.table, "Created table");

        if !inline_indexes {
            for index in &schema.indexes {
                self.add_index(schema, index).await?;
            }
        }
        Ok(())
    }

    /// Drops tables in the reverse of creation order: join tables first,
    /// then the models in reverse dependency order. Missing tables are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns the first parse or execution failure.
    pub async fn drop_table(&self, models: &[ModelRef]) -> Result<()> {
        let ordered = self.reorder_models(models, false)?;
        let mut joins = Vec::new();
        for model in &ordered {
            joins.extend(model.schema()?.join_tables());
        }

        let mut dropped = HashSet::new();
        for model in joins.iter().rev().chain(ordered.iter().rev()) {
            let table = model.table_name();
            if !dropped.insert(table.to_owned()) {
                continue;
            }
            let stmt = Expr::new("DROP TABLE IF EXISTS ?").var(Table::new(table));
            self.run(self.render_plain(stmt)).await?;
            info!(table = %table, "Dropped table");
        }
        Ok(())
    }

    /// Returns whether the model's table exists; probe failures count as
    /// absent.
    pub async fn has_table(&self, model: &dyn Model) -> bool {
        let result = self.try_has_table(model).await;
        collapse("table", model.table_name(), model.table_name(), result)
    }

    /// Returns whether the model's table exists.
    ///
    /// # Errors
    ///
    /// Returns the probe failure.
    pub async fn try_has_table(&self, model: &dyn Model) -> Result<bool> {
        let database = self.current_database().await?;
        self.count_catalog(
            model.table_name(),
            &Probe::Table {
                database: &database,
                table: model.table_name(),
            },
        )
        .await
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub async fn rename_table(&self, old: &str, new: &str) -> Result<()> {
        self.run(self.render_plain(self.dialect.rename_table(old, new)))
            .await?;
        info!(from = %old, to = %new, "Renamed table");
        Ok(())
    }

    /// Adds the named field's column.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::FieldNotFound`] for an unknown field, or the
    /// parse or execution failure.
    pub async fn add_column(&self, model: &dyn Model, name: &str) -> Result<()> {
        let schema = model.schema()?;
        let field = lookup_field(&schema, name)?;
        self.add_field(&schema, field).await
    }

    async fn add_field(&self, schema: &Schema, field: &Field) -> Result<()> {
        let stmt = Expr::new("ALTER TABLE ? ADD COLUMN ? ?")
            .var(Table::current())
            .var(Column::new(&field.db_name))
            .var(self.full_data_type(field));
        self.run(self.render(schema, stmt)).await?;
        info!(table = %schema.table, column = %field.db_name, "Added column");
        Ok(())
    }

    /// Drops the named field's column.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::FieldNotFound`] for an unknown field, or the
    /// parse or execution failure.
    pub async fn drop_column(&self, model: &dyn Model, name: &str) -> Result<()> {
        let schema = model.schema()?;
        let field = lookup_field(&schema, name)?;
        let stmt = Expr::new("ALTER TABLE ? DROP COLUMN ?")
            .var(Table::current())
            .var(Column::new(&field.db_name));
        self.run(self.render(&schema, stmt)).await?;
        info!(table = %schema.table, column = %field.db_name, "Dropped column");
        Ok(())
    }

    /// Changes the named field's column to its declared type.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Unsupported`] where the dialect cannot alter
    /// columns, [`MigrateError::FieldNotFound`] for an unknown field, or the
    /// parse or execution failure.
    pub async fn alter_column(&self, model: &dyn Model, name: &str) -> Result<()> {
        self.require(self.dialect.supports_alter_column(), "ALTER COLUMN")?;
        let schema = model.schema()?;
        let field = lookup_field(&schema, name)?;
        let data_type = self.dialect.data_type_of(field);
        let stmt = self
            .dialect
            .alter_column(&schema.table, &field.db_name, &data_type);
        self.run(self.render(&schema, stmt)).await?;
        info!(table = %schema.table, column = %field.db_name, data_type = %data_type, "Altered column");
        Ok(())
    }

    /// Returns whether the named field's column exists; probe failures
    /// count as absent.
    pub async fn has_column(&self, model: &dyn Model, name: &str) -> bool {
        let result = self.try_has_column(model, name).await;
        collapse("column", model.table_name(), name, result)
    }

    /// Returns whether the named field's column exists. Names that are not
    /// fields of the model are probed as physical column names.
    ///
    /// # Errors
    ///
    /// Returns the parse or probe failure.
    pub async fn try_has_column(&self, model: &dyn Model, name: &str) -> Result<bool> {
        let schema = model.schema()?;
        let column = schema
            .look_up_field(name)
            .map_or(name, |field| field.db_name.as_str());
        self.try_has_column_named(&schema.table, column).await
    }

    async fn try_has_column_named(&self, table: &str, column: &str) -> Result<bool> {
        let database = self.current_database().await?;
        self.count_catalog(
            table,
            &Probe::Column {
                database: &database,
                table,
                column,
            },
        )
        .await
    }

    async fn has_column_named(&self, table: &str, column: &str) -> bool {
        let result = self.try_has_column_named(table, column).await;
        collapse("column", table, column, result)
    }

    /// Renames a column to the named field's column. `old` is resolved
    /// through the model when it names a field, and used as is otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::FieldNotFound`] if `new` is not a field, or
    /// the parse or execution failure.
    pub async fn rename_column(&self, model: &dyn Model, old: &str, new: &str) -> Result<()> {
        let schema = model.schema()?;
        let target = lookup_field(&schema, new)?;
        let old = schema
            .look_up_field(old)
            .map_or(old, |field| field.db_name.as_str());
        let stmt = Expr::new("ALTER TABLE ? RENAME COLUMN ? TO ?")
            .var(Table::current())
            .var(Column::new(old))
            .var(Column::new(&target.db_name));
        self.run(self.render(&schema, stmt)).await?;
        info!(table = %schema.table, from = %old, to = %target.db_name, "Renamed column");
        Ok(())
    }

    /// Creates a constraint by name. A field name creates every foreign key
    /// built on that field.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Unsupported`] where constraints cannot be
    /// added to existing tables, [`MigrateError::ConstraintNotFound`] for an
    /// unknown name, or the parse or execution failure.
    pub async fn create_constraint(&self, model: &dyn Model, name: &str) -> Result<()> {
        self.require(self.dialect.supports_add_constraint(), "ADD CONSTRAINT")?;
        let schema = model.schema()?;
        for resolved in resolve_constraints(&schema, name)? {
            match resolved {
                Resolved::Foreign(constraint) => self.add_foreign_key(&schema, constraint).await?,
                Resolved::Check(check) => self.add_check(&schema, check).await?,
            }
        }
        Ok(())
    }

    async fn add_foreign_key(&self, schema: &Schema, constraint: &Constraint) -> Result<()> {
        let stmt = Expr::new("ALTER TABLE ? ADD ?")
            .var(Table::current())
            .var(foreign_key(constraint));
        self.run(self.render(schema, stmt)).await?;
        info!(table = %schema.table, constraint = %constraint.name, "Created foreign key");
        Ok(())
    }

    async fn add_check(&self, schema: &Schema, check: &CheckConstraint) -> Result<()> {
        let stmt = Expr::new("ALTER TABLE ? ADD ?")
            .var(Table::current())
            .var(check_constraint(check));
        self.run(self.render(schema, stmt)).await?;
        info!(table = %schema.table, constraint = %check.name, "Created check constraint");
        Ok(())
    }

    /// Drops a constraint by constraint or field name.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Unsupported`] where constraints cannot be
    /// dropped, [`MigrateError::ConstraintNotFound`] for an unknown name, or
    /// the parse or execution failure.
    pub async fn drop_constraint(&self, model: &dyn Model, name: &str) -> Result<()> {
        self.require(self.dialect.supports_add_constraint(), "DROP CONSTRAINT")?;
        let schema = model.schema()?;
        for resolved in resolve_constraints(&schema, name)? {
            let stmt = Expr::new("ALTER TABLE ? DROP CONSTRAINT ?")
                .var(Table::current())
                .var(Column::new(resolved.name()));
            self.run(self.render(&schema, stmt)).await?;
            info!(table = %schema.table, constraint = %resolved.name(), "Dropped constraint");
        }
        Ok(())
    }

    /// Returns whether a constraint exists; probe failures count as absent.
    pub async fn has_constraint(&self, model: &dyn Model, name: &str) -> bool {
        let result = self.try_has_constraint(model, name).await;
        collapse("constraint", model.table_name(), name, result)
    }

    /// Returns whether a constraint exists. Constraint and field names are
    /// resolved through the model; other names are probed as given.
    ///
    /// # Errors
    ///
    /// Returns the parse or probe failure.
    pub async fn try_has_constraint(&self, model: &dyn Model, name: &str) -> Result<bool> {
        let schema = model.schema()?;
        let resolved = resolve_constraints(&schema, name)
            .ok()
            .and_then(|all| all.first().map(|first| first.name().to_owned()))
            .unwrap_or_else(|| name.to_owned());
        self.try_has_constraint_named(&schema.table, &resolved).await
    }

    async fn try_has_constraint_named(&self, table: &str, name: &str) -> Result<bool> {
        let database = self.current_database().await?;
        self.count_catalog(
            table,
            &Probe::Constraint {
                database: &database,
                table,
                name,
            },
        )
        .await
    }

    async fn has_constraint_named(&self, table: &str, name: &str) -> bool {
        let result = self.try_has_constraint_named(table, name).await;
        collapse("constraint", table, name, result)
    }

    /// Creates an index by name. A field name creates every index covering
    /// that field.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::IndexNotFound`] for an unknown name, or the
    /// parse or execution failure.
    pub async fn create_index(&self, model: &dyn Model, name: &str) -> Result<()> {
        let schema = model.schema()?;
        for index in resolve_indexes(&schema, name)? {
            self.add_index(&schema, index).await?;
        }
        Ok(())
    }

    async fn add_index(&self, schema: &Schema, index: &Index) -> Result<()> {
        let mut sql = String::from("CREATE ");
        if let Some(class) = &index.class {
            sql.push_str(class);
            sql.push(' ');
        }
        sql.push_str("INDEX ? ON ?");

        let using = index.kind.as_deref();
        if let (IndexUsing::BeforeColumns, Some(kind)) = (self.dialect.index_using(), using) {
            sql.push_str(" USING ");
            sql.push_str(kind);
        }
        sql.push_str(" ?");
        if let (IndexUsing::AfterColumns, Some(kind)) = (self.dialect.index_using(), using) {
            sql.push_str(" USING ");
            sql.push_str(kind);
        }
        self.push_comment(&mut sql, index);
        if let Some(predicate) = &index.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        let stmt = Expr::new(sql)
            .var(Column::new(&index.name))
            .var(Table::current())
            .var(self.build_index_options(&index.fields));
        self.run(self.render(schema, stmt)).await?;
        info!(table = %schema.table, index = %index.name, "Created index");
        Ok(())
    }

    /// Drops an index by index or field name.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::IndexNotFound`] for an unknown name, or the
    /// parse or execution failure.
    pub async fn drop_index(&self, model: &dyn Model, name: &str) -> Result<()> {
        let schema = model.schema()?;
        for index in resolve_indexes(&schema, name)? {
            let stmt = self.dialect.drop_index(&schema.table, &index.name);
            self.run(self.render(&schema, stmt)).await?;
            info!(table = %schema.table, index = %index.name, "Dropped index");
        }
        Ok(())
    }

    /// Returns whether an index exists; probe failures count as absent.
    pub async fn has_index(&self, model: &dyn Model, name: &str) -> bool {
        let result = self.try_has_index(model, name).await;
        collapse("index", model.table_name(), name, result)
    }

    /// Returns whether an index exists. Index and field names are resolved
    /// through the model; other names are probed as given.
    ///
    /// # Errors
    ///
    /// Returns the parse or probe failure.
    pub async fn try_has_index(&self, model: &dyn Model, name: &str) -> Result<bool> {
        let schema = model.schema()?;
        let resolved = resolve_indexes(&schema, name)
            .ok()
            .and_then(|all| all.first().map(|index| index.name.clone()))
            .unwrap_or_else(|| name.to_owned());
        self.try_has_index_named(&schema.table, &resolved).await
    }

    async fn try_has_index_named(&self, table: &str, name: &str) -> Result<bool> {
        let database = self.current_database().await?;
        self.count_catalog(
            table,
            &Probe::Index {
                database: &database,
                table,
                name,
            },
        )
        .await
    }

    async fn has_index_named(&self, table: &str, name: &str) -> bool {
        let result = self.try_has_index_named(table, name).await;
        collapse("index", table, name, result)
    }

    /// Renames an index to the named index of the model. `old` is used as
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Unsupported`] where indexes cannot be
    /// renamed, [`MigrateError::IndexNotFound`] if `new` does not resolve,
    /// or the parse or execution failure.
    pub async fn rename_index(&self, model: &dyn Model, old: &str, new: &str) -> Result<()> {
        self.require(self.dialect.supports_rename_index(), "RENAME INDEX")?;
        let schema = model.schema()?;
        let target = resolve_indexes(&schema, new)?
            .first()
            .map(|index| index.name.clone())
            .ok_or_else(|| MigrateError::IndexNotFound {
                table: schema.table.clone(),
                name: new.to_owned(),
            })?;
        let stmt = self.dialect.rename_index(&schema.table, old, &target);
        self.run(self.render(&schema, stmt)).await?;
        info!(table = %schema.table, from = %old, to = %target, "Renamed index");
        Ok(())
    }

    /// View creation is not implemented.
    ///
    /// # Errors
    ///
    /// Always returns [`MigrateError::NotImplemented`].
    pub fn create_view(&self, name: &str, option: &ViewOption) -> Result<()> {
        let _ = (name, option);
        Err(MigrateError::NotImplemented("create_view"))
    }

    /// View removal is not implemented.
    ///
    /// # Errors
    ///
    /// Always returns [`MigrateError::NotImplemented`].
    pub fn drop_view(&self, name: &str) -> Result<()> {
        let _ = name;
        Err(MigrateError::NotImplemented("drop_view"))
    }

    /// Returns the name of the current database.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub async fn current_database(&self) -> Result<String> {
        let sql = self.dialect.current_database_sql();
        debug!(sql = %sql, "Querying current database");
        self.store.scalar_text(sql, &[]).await
    }

    /// Orders models so that referenced tables come first.
    ///
    /// # Errors
    ///
    /// Returns the first parse failure.
    pub fn reorder_models(&self, models: &[ModelRef], auto_add: bool) -> Result<Vec<ModelRef>> {
        graph::reorder_models(models, auto_add)
    }

    /// Returns the column type the dialect declares for a field.
    #[must_use]
    pub fn data_type_of(&self, field: &Field) -> String {
        self.dialect.data_type_of(field)
    }

    /// Builds the parenthesized column list of an index.
    #[must_use]
    pub fn build_index_options(&self, options: &[IndexOption]) -> Expression {
        Expression::list(options.iter().map(|option| {
            let mut sql = String::from("?");
            if let Some(length) = option.length {
                sql.push_str(&format!("({length})"));
            }
            if let Some(collate) = &option.collate {
                sql.push_str(" COLLATE ");
                sql.push_str(collate);
            }
            if let Some(sort) = &option.sort {
                sql.push(' ');
                sql.push_str(sort);
            }
            let target: Expression = option.expression.as_ref().map_or_else(
                || Column::new(&option.field).into(),
                |expression| Expr::new(expression).into(),
            );
            Expr::new(sql).var(target)
        }))
    }

    fn full_data_type(&self, field: &Field) -> Expr {
        let mut sql = self.dialect.data_type_of(field);
        if field.auto_increment {
            if let Some(keyword) = self.dialect.auto_increment_keyword() {
                sql.push(' ');
                sql.push_str(keyword);
            }
        }
        if field.not_null {
            sql.push_str(" NOT NULL");
        }
        if field.unique {
            sql.push_str(" UNIQUE");
        }
        match &field.default_value {
            Some(default) => {
                sql.push_str(" DEFAULT ?");
                Expr::new(sql).var(Expr::new(default))
            }
            None => Expr::new(sql),
        }
    }

    fn inline_index(&self, index: &Index) -> Expr {
        let mut sql = String::new();
        if let Some(class) = &index.class {
            sql.push_str(class);
            sql.push(' ');
        }
        sql.push_str("INDEX ? ?");
        if let (IndexUsing::AfterColumns, Some(kind)) =
            (self.dialect.index_using(), index.kind.as_deref())
        {
            sql.push_str(" USING ");
            sql.push_str(kind);
        }
        self.push_comment(&mut sql, index);
        Expr::new(sql)
            .var(Column::new(&index.name))
            .var(self.build_index_options(&index.fields))
    }

    fn push_comment(&self, sql: &mut String, index: &Index) {
        if let Some(comment) = &index.comment {
            if self.dialect.supports_index_comment() {
                sql.push_str(" COMMENT ");
                sql.push_str(&SqlValue::Text(comment.clone()).to_sql_inline());
            }
        }
    }

    fn require(&self, supported: bool, operation: &'static str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(MigrateError::Unsupported {
                dialect: self.dialect.name(),
                operation,
            })
        }
    }

    fn render(&self, schema: &Schema, template: Expr) -> (String, Vec<SqlValue>) {
        let mut stmt = Statement::new(&self.dialect).table(&schema.table);
        if let Some(field) = schema.prioritized_primary_field() {
            stmt = stmt.primary_key(&field.db_name);
        }
        stmt.render(&template.into());
        stmt.into_parts()
    }

    fn render_plain(&self, template: Expr) -> (String, Vec<SqlValue>) {
        let mut stmt = Statement::new(&self.dialect);
        stmt.render(&template.into());
        stmt.into_parts()
    }

    async fn run(&self, (sql, args): (String, Vec<SqlValue>)) -> Result<()> {
        debug!(sql = %sql, args = ?args, "Executing statement");
        self.store.execute(&sql, &args).await?;
        Ok(())
    }

    async fn count_catalog(&self, table: &str, probe: &Probe<'_>) -> Result<bool> {
        let catalog = self.dialect.catalog(probe);
        let (sql, args) = {
            let mut stmt = Statement::new(&self.dialect).table(table);
            stmt.add_clause(Select::new().column(Expr::new("count(*)")));
            stmt.add_clause(FromClause::new(catalog.source));
            stmt.add_clause(Where::new(catalog.conditions));
            stmt.build(&["SELECT", "FROM", "WHERE"]);
            stmt.into_parts()
        };
        debug!(sql = %sql, args = ?args, "Probing catalog");
        Ok(self.store.count(&sql, &args).await? > 0)
    }
}

fn defer_constraints(schema: &Schema, pending: &mut Vec<(Schema, String)>) {
    for constraint in schema.constraints() {
        pending.push((schema.clone(), constraint.name.clone()));
    }
}

fn collapse(probe: &'static str, table: &str, name: &str, result: Result<bool>) -> bool {
    result.unwrap_or_else(|err| {
        warn!(probe, table = %table, name = %name, error = %err, "Catalog probe failed, treating as absent");
        false
    })
}

fn lookup_field<'a>(schema: &'a Schema, name: &str) -> Result<&'a Field> {
    schema
        .look_up_field(name)
        .ok_or_else(|| MigrateError::FieldNotFound {
            table: schema.table.clone(),
            field: name.to_owned(),
        })
}

fn resolve_constraints<'a>(schema: &'a Schema, name: &str) -> Result<Vec<Resolved<'a>>> {
    if let Some(constraint) = schema.constraint(name) {
        return Ok(vec![Resolved::Foreign(constraint)]);
    }
    if let Some(check) = schema.check(name) {
        return Ok(vec![Resolved::Check(check)]);
    }
    let by_field: Vec<Resolved<'a>> = schema
        .constraints_for_field(name)
        .into_iter()
        .map(Resolved::Foreign)
        .collect();
    if by_field.is_empty() {
        Err(MigrateError::ConstraintNotFound {
            table: schema.table.clone(),
            name: name.to_owned(),
        })
    } else {
        Ok(by_field)
    }
}

fn resolve_indexes<'a>(schema: &'a Schema, name: &str) -> Result<Vec<&'a Index>> {
    if let Some(index) = schema.index(name) {
        return Ok(vec![index]);
    }
    let by_field = schema.indexes_for_field(name);
    if by_field.is_empty() {
        Err(MigrateError::IndexNotFound {
            table: schema.table.clone(),
            name: name.to_owned(),
        })
    } else {
        Ok(by_field)
    }
}

fn foreign_key(constraint: &Constraint) -> Expr {
    let mut sql = String::from("CONSTRAINT ? FOREIGN KEY ? REFERENCES ??");
    if let Some(action) = constraint.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = constraint.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    Expr::new(sql)
        .var(Column::new(&constraint.name))
        .var(Expression::list(constraint.foreign_keys.iter().map(Column::new)))
        .var(Table::new(&constraint.reference_table))
        .var(Expression::list(constraint.references.iter().map(Column::new)))
}

fn check_constraint(check: &CheckConstraint) -> Expr {
    Expr::new("CONSTRAINT ? CHECK (?)")
        .var(Column::new(&check.name))
        .var(Expr::new(&check.constraint))
}
