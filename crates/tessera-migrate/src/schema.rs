//! Schema descriptors.
//!
//! These types describe a model's table the way the migrator consumes it:
//! columns with their logical and physical names, relationships resolved to
//! foreign-key constraints, indexes and check constraints. They are produced
//! by a [`Model`](crate::model::Model) implementation and never by the
//! migrator itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ModelRef;

/// Logical column types, mapped to concrete types by each dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Signed integer; `size` is the width in bits.
    Int,
    /// Unsigned integer; `size` is the width in bits.
    Uint,
    /// Floating point; `size` is the width in bits.
    Float,
    /// Bounded character string; `size` is the maximum length.
    String,
    /// Unbounded text.
    Text,
    /// Timestamp; `precision` is the fractional-second digits.
    Time,
    /// Binary data.
    Bytes,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
}

/// Action taken on the referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Propagate the change.
    Cascade,
    /// Refuse the change.
    Restrict,
    /// Set the referencing columns to NULL.
    SetNull,
    /// Set the referencing columns to their default.
    SetDefault,
    /// Do nothing (checked at the end of the statement).
    NoAction,
}

impl ReferentialAction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A column of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Logical name, as the model spells it.
    pub name: String,
    /// Physical column name.
    pub db_name: String,
    /// Logical type.
    pub data_type: DataType,
    /// Length or bit width, depending on the type.
    pub size: Option<u32>,
    /// Precision for time and decimal types.
    pub precision: Option<u32>,
    /// Explicit column type; wins over the dialect mapping.
    pub db_data_type: Option<String>,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Generated by the store.
    pub auto_increment: bool,
    /// Declared `NOT NULL`.
    pub not_null: bool,
    /// Declared `UNIQUE`.
    pub unique: bool,
    /// Raw SQL default expression.
    pub default_value: Option<String>,
}

impl Field {
    /// Creates a nullable column whose physical name equals its logical name.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            data_type,
            size: None,
            precision: None,
            db_data_type: None,
            primary_key: false,
            auto_increment: false,
            not_null: false,
            unique: false,
            default_value: None,
        }
    }

    /// Sets the physical column name.
    #[must_use]
    pub fn column(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the size.
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the precision.
    #[must_use]
    pub const fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Overrides the dialect type mapping.
    #[must_use]
    pub fn db_type(mut self, db_data_type: impl Into<String>) -> Self {
        self.db_data_type = Some(db_data_type.into());
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the raw SQL default expression.
    #[must_use]
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }
}

/// A foreign-key constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Referencing columns on the owning table (physical names).
    pub foreign_keys: Vec<String>,
    /// Referenced columns (physical names).
    pub references: Vec<String>,
    /// Referenced table.
    pub reference_table: String,
    /// Referenced model, used to order and auto-add dependencies.
    pub reference: ModelRef,
    /// `ON DELETE` action.
    pub on_delete: Option<ReferentialAction>,
    /// `ON UPDATE` action.
    pub on_update: Option<ReferentialAction>,
}

impl Constraint {
    /// Creates a constraint referencing `reference`.
    #[must_use]
    pub fn new(name: impl Into<String>, reference: ModelRef) -> Self {
        Self {
            name: name.into(),
            foreign_keys: Vec::new(),
            references: Vec::new(),
            reference_table: reference.table_name().to_owned(),
            reference,
            on_delete: None,
            on_update: None,
        }
    }

    /// Adds a referencing column.
    #[must_use]
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_keys.push(column.into());
        self
    }

    /// Adds a referenced column.
    #[must_use]
    pub fn references(mut self, column: impl Into<String>) -> Self {
        self.references.push(column.into());
        self
    }

    /// Sets the `ON DELETE` action.
    #[must_use]
    pub const fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the `ON UPDATE` action.
    #[must_use]
    pub const fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// How a relationship links two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The foreign key lives on this table.
    BelongsTo,
    /// Rows are linked through a join table.
    ManyToMany,
}

/// A relationship to another model.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship name.
    pub name: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Foreign key owned by this table, if any.
    pub constraint: Option<Constraint>,
    /// Join table model for many-to-many relationships.
    pub join_table: Option<ModelRef>,
}

impl Relationship {
    /// A relationship whose foreign key lives on this table.
    #[must_use]
    pub fn belongs_to(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::BelongsTo,
            constraint: Some(constraint),
            join_table: None,
        }
    }

    /// A relationship through a join table.
    #[must_use]
    pub fn many_to_many(name: impl Into<String>, join_table: ModelRef) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ManyToMany,
            constraint: None,
            join_table: Some(join_table),
        }
    }
}

/// One column (or expression) of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOption {
    /// Physical column name.
    pub field: String,
    /// Raw SQL expression used instead of the column.
    pub expression: Option<String>,
    /// Prefix length.
    pub length: Option<u32>,
    /// Collation.
    pub collate: Option<String>,
    /// `ASC` or `DESC`.
    pub sort: Option<String>,
}

impl IndexOption {
    /// Indexes a plain column.
    #[must_use]
    pub fn column(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }
}

/// An index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed columns, in order.
    pub fields: Vec<IndexOption>,
    /// Class keyword, e.g. `UNIQUE`.
    pub class: Option<String>,
    /// Access method, e.g. `btree`.
    pub kind: Option<String>,
    /// Partial index predicate.
    pub where_clause: Option<String>,
    /// Index comment.
    pub comment: Option<String>,
}

impl Index {
    /// Creates an index over the given columns.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: columns.into_iter().map(IndexOption::column).collect(),
            ..Self::default()
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.class = Some(String::from("UNIQUE"));
        self
    }

    /// Returns true if the index covers `column`.
    #[must_use]
    pub fn covers(&self, column: &str) -> bool {
        self.fields.iter().any(|option| option.field == column)
    }
}

/// A check constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConstraint {
    /// Constraint name.
    pub name: String,
    /// Raw SQL predicate.
    pub constraint: String,
}

/// The parsed description of one model.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Table name.
    pub table: String,
    /// Columns, in declaration order.
    pub fields: Vec<Field>,
    /// Relationships.
    pub relationships: Vec<Relationship>,
    /// Indexes.
    pub indexes: Vec<Index>,
    /// Check constraints.
    pub checks: Vec<CheckConstraint>,
}

impl Schema {
    /// Creates an empty schema for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a relationship.
    #[must_use]
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index_def(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a check constraint.
    #[must_use]
    pub fn check_def(mut self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
        self.checks.push(CheckConstraint {
            name: name.into(),
            constraint: constraint.into(),
        });
        self
    }

    /// Finds a column by logical or physical name.
    #[must_use]
    pub fn look_up_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .or_else(|| self.fields.iter().find(|field| field.db_name == name))
    }

    /// Returns the primary key columns, in declaration order.
    #[must_use]
    pub fn primary_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|field| field.primary_key).collect()
    }

    /// Returns the column that stands for the primary key: the only primary
    /// column, or the one named `id` in a composite key.
    #[must_use]
    pub fn prioritized_primary_field(&self) -> Option<&Field> {
        let primary = self.primary_fields();
        match primary.as_slice() {
            [only] => Some(*only),
            fields => fields.iter().copied().find(|field| field.db_name == "id"),
        }
    }

    /// Iterates over the foreign keys owned by this table.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.relationships
            .iter()
            .filter_map(|relationship| relationship.constraint.as_ref())
    }

    /// Finds a foreign key by constraint name.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints().find(|constraint| constraint.name == name)
    }

    /// Returns every foreign key whose columns include the named field.
    #[must_use]
    pub fn constraints_for_field(&self, name: &str) -> Vec<&Constraint> {
        let Some(field) = self.look_up_field(name) else {
            return Vec::new();
        };
        self.constraints()
            .filter(|constraint| constraint.foreign_keys.contains(&field.db_name))
            .collect()
    }

    /// Finds a check constraint by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckConstraint> {
        self.checks.iter().find(|check| check.name == name)
    }

    /// Finds an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Returns every index covering the named field.
    #[must_use]
    pub fn indexes_for_field(&self, name: &str) -> Vec<&Index> {
        let Some(field) = self.look_up_field(name) else {
            return Vec::new();
        };
        self.indexes
            .iter()
            .filter(|index| index.covers(&field.db_name))
            .collect()
    }

    /// Returns the join table models of many-to-many relationships.
    #[must_use]
    pub fn join_tables(&self) -> Vec<ModelRef> {
        self.relationships
            .iter()
            .filter_map(|relationship| relationship.join_table.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn customers() -> Schema {
        Schema::new("customers").field(Field::new("id", DataType::Int).primary_key())
    }

    fn orders() -> Schema {
        let customer = Arc::new(customers());
        Schema::new("orders")
            .field(Field::new("id", DataType::Int).primary_key().auto_increment())
            .field(Field::new("CustomerID", DataType::Int).column("customer_id"))
            .field(Field::new("note", DataType::String).size(200))
            .relationship(Relationship::belongs_to(
                "customer",
                Constraint::new("fk_orders_customer", customer)
                    .foreign_key("customer_id")
                    .references("id")
                    .on_delete(ReferentialAction::Cascade),
            ))
            .index_def(Index::new("idx_orders_customer_id", ["customer_id"]))
            .check_def("chk_orders_note", "length(note) > 0")
    }

    #[test]
    fn test_look_up_field_by_either_name() {
        let schema = orders();
        assert_eq!(schema.look_up_field("CustomerID").unwrap().db_name, "customer_id");
        assert_eq!(schema.look_up_field("customer_id").unwrap().name, "CustomerID");
        assert!(schema.look_up_field("missing").is_none());
    }

    #[test]
    fn test_prioritized_primary_field() {
        assert_eq!(orders().prioritized_primary_field().unwrap().db_name, "id");

        let composite = Schema::new("order_lines")
            .field(Field::new("order_id", DataType::Int).primary_key())
            .field(Field::new("line", DataType::Int).primary_key());
        assert_eq!(composite.primary_fields().len(), 2);
        assert!(composite.prioritized_primary_field().is_none());
    }

    #[test]
    fn test_constraint_lookups() {
        let schema = orders();
        let constraint = schema.constraint("fk_orders_customer").unwrap();
        assert_eq!(constraint.reference_table, "customers");
        assert_eq!(schema.constraints_for_field("CustomerID").len(), 1);
        assert!(schema.constraints_for_field("note").is_empty());
        assert!(schema.check("chk_orders_note").is_some());
    }

    #[test]
    fn test_index_lookups() {
        let schema = orders();
        assert!(schema.index("idx_orders_customer_id").is_some());
        assert_eq!(schema.indexes_for_field("CustomerID").len(), 1);
        assert!(schema.indexes_for_field("note").is_empty());
    }

    #[test]
    fn test_referential_action_keywords() {
        assert_eq!(ReferentialAction::SetNull.to_string(), "SET NULL");
        let action: ReferentialAction = serde_json::from_str("\"no_action\"").unwrap();
        assert_eq!(action, ReferentialAction::NoAction);
    }
}
