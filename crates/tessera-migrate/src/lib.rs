//! Dependency-ordered, additive schema migration.
//!
//! `tessera-migrate` turns model descriptions into DDL and applies it:
//! - Models are ordered so every referenced table is created first
//! - Existing tables are diffed against the catalog; only missing columns,
//!   constraints, indexes and join tables are created
//! - SQL is rendered from dialect-neutral `?` templates (SQLite, PostgreSQL,
//!   MySQL)
//!
//! # Architecture
//!
//! - **Schema** - Descriptors for columns, relationships, indexes and checks
//! - **Model** - The parser interface producing schemas; [`manifest`]
//!   implements it for JSON manifests
//! - **Graph** - Dependency ordering of models
//! - **Dialect** - Column types, catalog probes and dialect-specific DDL
//! - **Store** - Executes rendered statements
//! - **Migrator** - Orchestrates all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_migrate::prelude::*;
//!
//! let customers: ModelRef = Arc::new(
//!     Schema::new("customers")
//!         .field(Field::new("id", DataType::Int).primary_key().auto_increment()),
//! );
//! let orders: ModelRef = Arc::new(
//!     Schema::new("orders")
//!         .field(Field::new("id", DataType::Int).primary_key().auto_increment())
//!         .field(Field::new("customer_id", DataType::Int).not_null())
//!         .relationship(Relationship::belongs_to(
//!             "customer",
//!             Constraint::new("fk_orders_customer", Arc::clone(&customers))
//!                 .foreign_key("customer_id")
//!                 .references("id"),
//!         )),
//! );
//!
//! let migrator = Migrator::new(SqliteDialect::new(), SqliteStore::new(pool));
//! migrator.auto_migrate(&[orders, customers]).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the dependency order of a manifest
//! tessera-migrate --manifest models.json order
//!
//! # Show the DDL for an empty PostgreSQL database
//! tessera-migrate --manifest models.json plan --dialect postgres
//!
//! # Apply to a SQLite database
//! tessera-migrate --manifest models.json --database sqlite:app.db auto-migrate
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod migrator;
pub mod model;
pub mod schema;
pub mod store;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::MigratorConfig;
    pub use crate::dialect::{
        MigrationDialect, MySqlDialect, PostgresDialect, SqliteDialect,
    };
    pub use crate::error::{MigrateError, Result};
    pub use crate::graph::{reorder_models, DependencyGraph};
    pub use crate::manifest::Manifest;
    pub use crate::migrator::{Migrator, ViewOption};
    pub use crate::model::{Model, ModelRef};
    pub use crate::schema::{
        CheckConstraint, Constraint, DataType, Field, Index, IndexOption, ReferentialAction,
        RelationKind, Relationship, Schema,
    };
    pub use crate::store::{DryRunStore, SqliteStore, Store};
}
