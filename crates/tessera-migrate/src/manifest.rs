//! JSON model manifests.
//!
//! A manifest declares models by table name. Relations name their target
//! table instead of embedding it, so forward and mutual references are
//! plain data; each [`ModelRef`] handed out resolves its schema lazily
//! against the shared manifest.
//!
//! ```json
//! {
//!   "models": [
//!     {
//!       "table": "customers",
//!       "columns": [{ "name": "id", "type": "int", "primary_key": true }]
//!     },
//!     {
//!       "table": "orders",
//!       "columns": [
//!         { "name": "id", "type": "int", "primary_key": true, "auto_increment": true },
//!         { "name": "customer_id", "type": "int", "not_null": true }
//!       ],
//!       "relations": [
//!         { "name": "customer", "kind": "belongs_to", "target": "customers", "on_delete": "cascade" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::model::{Model, ModelRef};
use crate::schema::{
    CheckConstraint, Constraint, DataType, Field, Index, IndexOption, ReferentialAction,
    RelationKind, Relationship, Schema,
};

/// Top-level manifest document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Declared models.
    pub models: Vec<ModelDef>,
}

/// A declared model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDef {
    /// Table name.
    pub table: String,
    /// Columns, in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Relations to other models.
    #[serde(default)]
    pub relations: Vec<RelationDef>,
    /// Indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Check constraints.
    #[serde(default)]
    pub checks: Vec<CheckDef>,
}

/// A declared column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Logical name.
    pub name: String,
    /// Physical name, when it differs from the logical one.
    #[serde(default)]
    pub column: Option<String>,
    /// Logical type.
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Length or bit width.
    #[serde(default)]
    pub size: Option<u32>,
    /// Precision.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Explicit column type.
    #[serde(default)]
    pub db_type: Option<String>,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Generated by the store.
    #[serde(default)]
    pub auto_increment: bool,
    /// Declared NOT NULL.
    #[serde(default)]
    pub not_null: bool,
    /// Declared UNIQUE.
    #[serde(default)]
    pub unique: bool,
    /// Raw SQL default expression.
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnDef {
    fn db_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    fn to_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            db_name: self.db_name().to_owned(),
            data_type: self.data_type,
            size: self.size,
            precision: self.precision,
            db_data_type: self.db_type.clone(),
            primary_key: self.primary_key,
            auto_increment: self.auto_increment,
            not_null: self.not_null,
            unique: self.unique,
            default_value: self.default.clone(),
        }
    }
}

/// A declared relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name.
    pub name: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// Target table.
    pub target: String,
    /// Referencing columns; `<name>_id` when empty.
    #[serde(default)]
    pub foreign_key: Vec<String>,
    /// Referenced columns; the target's primary key when empty.
    #[serde(default)]
    pub references: Vec<String>,
    /// Constraint name; `fk_<table>_<name>` when absent.
    #[serde(default)]
    pub constraint: Option<String>,
    /// `ON DELETE` action.
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,
    /// `ON UPDATE` action.
    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
    /// Join table name for many-to-many; `<table>_<name>` when absent.
    #[serde(default)]
    pub join_table: Option<String>,
}

/// A declared index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name; `idx_<table>_<columns>` when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Indexed columns.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Indexed columns with per-column options, after `columns`.
    #[serde(default)]
    pub fields: Vec<IndexOption>,
    /// Shorthand for `class: "UNIQUE"`.
    #[serde(default)]
    pub unique: bool,
    /// Class keyword.
    #[serde(default)]
    pub class: Option<String>,
    /// Access method.
    #[serde(default)]
    pub using: Option<String>,
    /// Partial index predicate.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    /// Comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl IndexDef {
    fn options(&self) -> impl Iterator<Item = IndexOption> + '_ {
        self.columns
            .iter()
            .map(IndexOption::column)
            .chain(self.fields.iter().cloned())
    }
}

/// A declared check constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDef {
    /// Short name; the constraint is named `chk_<table>_<name>`.
    pub name: String,
    /// Raw SQL predicate.
    pub constraint: String,
}

/// A validated set of model definitions.
#[derive(Debug)]
pub struct Manifest {
    models: Vec<ModelDef>,
    by_table: HashMap<String, usize>,
}

impl Manifest {
    /// Parses and validates a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Serialization`] for malformed JSON and
    /// [`MigrateError::ParseFailed`] for an invalid model definition.
    pub fn from_json(json: &str) -> Result<Arc<Self>> {
        let file: ManifestFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Reads a JSON manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Io`] if the file cannot be read, otherwise
    /// the errors of [`Manifest::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| MigrateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&json)?;
        debug!(path = %path.display(), models = manifest.models.len(), "Loaded manifest");
        Ok(manifest)
    }

    /// Validates an already deserialized manifest.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ParseFailed`] for an invalid model definition.
    pub fn from_file(file: ManifestFile) -> Result<Arc<Self>> {
        let mut by_table = HashMap::new();
        for (position, model) in file.models.iter().enumerate() {
            if model.table.trim().is_empty() {
                return Err(MigrateError::parse(
                    format!("#{position}"),
                    "table name must not be empty",
                ));
            }
            if by_table.insert(model.table.clone(), position).is_some() {
                return Err(MigrateError::parse(&model.table, "table declared twice"));
            }
        }

        let manifest = Self {
            models: file.models,
            by_table,
        };
        for model in &manifest.models {
            manifest.validate(model)?;
        }
        Ok(Arc::new(manifest))
    }

    /// Returns the model declared for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ParseFailed`] if no such table is declared.
    pub fn model(self: &Arc<Self>, table: &str) -> Result<ModelRef> {
        if !self.by_table.contains_key(table) {
            return Err(MigrateError::parse(table, "not declared in the manifest"));
        }
        Ok(Arc::new(ManifestModel {
            manifest: Arc::clone(self),
            table: table.to_owned(),
        }))
    }

    /// Returns every declared model, in declaration order.
    #[must_use]
    pub fn models(self: &Arc<Self>) -> Vec<ModelRef> {
        self.models
            .iter()
            .map(|def| -> ModelRef {
                Arc::new(ManifestModel {
                    manifest: Arc::clone(self),
                    table: def.table.clone(),
                })
            })
            .collect()
    }

    /// Returns the declared table names, in declaration order.
    #[must_use]
    pub fn tables(&self) -> Vec<&str> {
        self.models.iter().map(|def| def.table.as_str()).collect()
    }

    fn def(&self, table: &str) -> Result<&ModelDef> {
        self.by_table
            .get(table)
            .map(|&position| &self.models[position])
            .ok_or_else(|| MigrateError::parse(table, "not declared in the manifest"))
    }

    fn validate(&self, model: &ModelDef) -> Result<()> {
        let fail = |message: String| MigrateError::parse(&model.table, message);

        let mut columns = HashSet::new();
        for column in &model.columns {
            if !columns.insert(column.db_name()) {
                return Err(fail(format!("column '{}' declared twice", column.db_name())));
            }
        }
        let declared = |name: &str| {
            model
                .columns
                .iter()
                .any(|column| column.name == name || column.db_name() == name)
        };

        for relation in &model.relations {
            let target = self.def(&relation.target).map_err(|_| {
                fail(format!(
                    "relation '{}' targets undeclared table '{}'",
                    relation.name, relation.target
                ))
            })?;

            match relation.kind {
                RelationKind::BelongsTo => {
                    for column in foreign_keys(relation) {
                        if !declared(&column) {
                            return Err(fail(format!(
                                "relation '{}' uses undeclared column '{column}'",
                                relation.name
                            )));
                        }
                    }
                    if references(relation, target).is_empty() {
                        return Err(fail(format!(
                            "relation '{}' needs `references`: '{}' has no primary key",
                            relation.name, target.table
                        )));
                    }
                }
                RelationKind::ManyToMany => {
                    if primary_columns(model).is_empty() || primary_columns(target).is_empty() {
                        return Err(fail(format!(
                            "many-to-many relation '{}' needs primary keys on both sides",
                            relation.name
                        )));
                    }
                    if relation.name == model.table {
                        return Err(fail(format!(
                            "many-to-many relation '{}' must not be named after its table",
                            relation.name
                        )));
                    }
                }
            }
        }

        for index in &model.indexes {
            if index.columns.is_empty() && index.fields.is_empty() {
                return Err(fail(String::from("index without columns")));
            }
            for option in index.options() {
                if option.expression.is_none() && !declared(&option.field) {
                    return Err(fail(format!(
                        "index uses undeclared column '{}'",
                        option.field
                    )));
                }
            }
        }

        Ok(())
    }

    fn schema_of(self: &Arc<Self>, table: &str) -> Result<Schema> {
        let def = self.def(table)?;
        let mut schema = Schema::new(&def.table);
        schema.fields = def.columns.iter().map(ColumnDef::to_field).collect();

        for relation in &def.relations {
            let target = self.def(&relation.target)?;
            let relationship = match relation.kind {
                RelationKind::BelongsTo => {
                    let name = relation
                        .constraint
                        .clone()
                        .unwrap_or_else(|| format!("fk_{}_{}", def.table, relation.name));
                    let mut constraint = Constraint::new(name, self.model(&relation.target)?);
                    constraint.foreign_keys = foreign_keys(relation)
                        .iter()
                        .map(|column| physical(def, column))
                        .collect();
                    constraint.references = references(relation, target);
                    constraint.on_delete = relation.on_delete;
                    constraint.on_update = relation.on_update;
                    Relationship::belongs_to(&relation.name, constraint)
                }
                RelationKind::ManyToMany => {
                    let join: ModelRef = Arc::new(JoinTableModel {
                        manifest: Arc::clone(self),
                        table: relation
                            .join_table
                            .clone()
                            .unwrap_or_else(|| format!("{}_{}", def.table, relation.name)),
                        owner: def.table.clone(),
                        relation: relation.name.clone(),
                    });
                    Relationship::many_to_many(&relation.name, join)
                }
            };
            schema.relationships.push(relationship);
        }

        for index in &def.indexes {
            let fields: Vec<IndexOption> = index
                .options()
                .map(|mut option| {
                    if option.expression.is_none() {
                        option.field = physical(def, &option.field);
                    }
                    option
                })
                .collect();
            let name = index.name.clone().unwrap_or_else(|| {
                let columns: Vec<&str> = fields.iter().map(|option| option.field.as_str()).collect();
                format!("idx_{}_{}", def.table, columns.join("_"))
            });
            schema.indexes.push(Index {
                name,
                fields,
                class: index
                    .class
                    .clone()
                    .or_else(|| index.unique.then(|| String::from("UNIQUE"))),
                kind: index.using.clone(),
                where_clause: index.where_clause.clone(),
                comment: index.comment.clone(),
            });
        }

        schema.checks = def
            .checks
            .iter()
            .map(|check| CheckConstraint {
                name: format!("chk_{}_{}", def.table, check.name),
                constraint: check.constraint.clone(),
            })
            .collect();

        Ok(schema)
    }

    fn join_schema(self: &Arc<Self>, join: &JoinTableModel) -> Result<Schema> {
        let owner = self.def(&join.owner)?;
        let relation = owner
            .relations
            .iter()
            .find(|relation| relation.name == join.relation)
            .ok_or_else(|| MigrateError::parse(&join.table, "join relation disappeared"))?;
        let target = self.def(&relation.target)?;

        let mut schema = Schema::new(&join.table);
        for (side, prefix, model) in [
            (&owner.table, &owner.table, owner),
            (&relation.target, &relation.name, target),
        ] {
            let mut constraint = Constraint::new(
                format!("fk_{}_{prefix}", join.table),
                self.model(side)?,
            )
            .on_delete(ReferentialAction::Cascade)
            .on_update(ReferentialAction::Cascade);

            for column in primary_columns(model) {
                let name = format!("{prefix}_{}", column.db_name());
                let mut field = column.to_field();
                field.name.clone_from(&name);
                field.db_name.clone_from(&name);
                field.auto_increment = false;
                field.unique = false;
                field.not_null = true;
                field.default_value = None;
                schema.fields.push(field);

                constraint.foreign_keys.push(name);
                constraint.references.push(column.db_name().to_owned());
            }
            schema
                .relationships
                .push(Relationship::belongs_to(prefix.as_str(), constraint));
        }
        Ok(schema)
    }
}

fn primary_columns(model: &ModelDef) -> Vec<&ColumnDef> {
    model.columns.iter().filter(|column| column.primary_key).collect()
}

fn foreign_keys(relation: &RelationDef) -> Vec<String> {
    if relation.foreign_key.is_empty() {
        vec![format!("{}_id", relation.name)]
    } else {
        relation.foreign_key.clone()
    }
}

fn references(relation: &RelationDef, target: &ModelDef) -> Vec<String> {
    if relation.references.is_empty() {
        primary_columns(target)
            .into_iter()
            .map(|column| column.db_name().to_owned())
            .collect()
    } else {
        relation
            .references
            .iter()
            .map(|column| physical(target, column))
            .collect()
    }
}

fn physical(model: &ModelDef, name: &str) -> String {
    model
        .columns
        .iter()
        .find(|column| column.name == name)
        .map_or_else(|| name.to_owned(), |column| column.db_name().to_owned())
}

/// A model declared in a manifest.
pub struct ManifestModel {
    manifest: Arc<Manifest>,
    table: String,
}

impl fmt::Debug for ManifestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ManifestModel").field(&self.table).finish()
    }
}

impl Model for ManifestModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> Result<Schema> {
        self.manifest.schema_of(&self.table)
    }
}

/// The join table of a many-to-many relation.
struct JoinTableModel {
    manifest: Arc<Manifest>,
    table: String,
    owner: String,
    relation: String,
}

impl fmt::Debug for JoinTableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinTableModel")
            .field("table", &self.table)
            .field("owner", &self.owner)
            .field("relation", &self.relation)
            .finish()
    }
}

impl Model for JoinTableModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> Result<Schema> {
        self.manifest.join_schema(self)
    }
}
