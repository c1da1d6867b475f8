#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tessera_migrate::prelude::*;
use tessera_sql::SqlValue;

/// Manifest with a forward reference, a many-to-many relation, an index and
/// a check constraint.
pub const SHOP: &str = r#"{
    "models": [
        {
            "table": "orders",
            "columns": [
                { "name": "id", "type": "int", "primary_key": true, "auto_increment": true },
                { "name": "customer_id", "type": "int", "not_null": true },
                { "name": "total", "type": "float", "not_null": true, "default": "0" }
            ],
            "relations": [
                { "name": "customer", "kind": "belongs_to", "target": "customers",
                  "on_delete": "cascade" },
                { "name": "tags", "kind": "many_to_many", "target": "tags" }
            ],
            "indexes": [{ "columns": ["customer_id"] }],
            "checks": [{ "name": "total", "constraint": "total >= 0" }]
        },
        {
            "table": "customers",
            "columns": [
                { "name": "id", "type": "int", "primary_key": true, "auto_increment": true },
                { "name": "email", "type": "string", "size": 120, "unique": true }
            ]
        },
        {
            "table": "tags",
            "columns": [
                { "name": "id", "type": "int", "primary_key": true },
                { "name": "label", "type": "text" }
            ]
        }
    ]
}"#;

/// Two tables referencing each other.
pub const MUTUAL: &str = r#"{
    "models": [
        {
            "table": "authors",
            "columns": [
                { "name": "id", "type": "int", "primary_key": true },
                { "name": "favorite_book_id", "type": "int" }
            ],
            "relations": [
                { "name": "favorite_book", "kind": "belongs_to", "target": "books" }
            ]
        },
        {
            "table": "books",
            "columns": [
                { "name": "id", "type": "int", "primary_key": true },
                { "name": "author_id", "type": "int" }
            ],
            "relations": [
                { "name": "author", "kind": "belongs_to", "target": "authors" }
            ]
        }
    ]
}"#;

pub fn shop() -> Arc<Manifest> {
    Manifest::from_json(SHOP).unwrap_or_else(|e| panic!("Invalid shop manifest: {e}"))
}

pub fn mutual() -> Arc<Manifest> {
    Manifest::from_json(MUTUAL).unwrap_or_else(|e| panic!("Invalid mutual manifest: {e}"))
}

/// `items(id int primary key, name varchar(255))`.
pub fn item() -> ModelRef {
    Arc::new(
        Schema::new("items")
            .field(Field::new("id", DataType::Int).primary_key())
            .field(Field::new("name", DataType::String).size(255)),
    )
}

pub fn table_names(models: &[ModelRef]) -> Vec<&str> {
    models.iter().map(|model| model.table_name()).collect()
}

pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap()
}

/// Records executed statements and forwards everything to the wrapped store.
#[derive(Debug)]
pub struct Recorder<S> {
    inner: S,
    executed: Mutex<Vec<String>>,
}

impl<S: Store> Recorder<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns and clears the statements executed so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.executed.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, sql: &str) {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_owned());
    }
}

impl<S: Store> Store for Recorder<S> {
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        self.record(sql);
        self.inner.execute(sql, args).await
    }

    async fn count(&self, sql: &str, args: &[SqlValue]) -> Result<i64> {
        self.inner.count(sql, args).await
    }

    async fn scalar_text(&self, sql: &str, args: &[SqlValue]) -> Result<String> {
        self.inner.scalar_text(sql, args).await
    }
}

pub async fn sqlite_migrator() -> Migrator<SqliteDialect, Recorder<SqliteStore>> {
    let store = Recorder::new(SqliteStore::new(memory_pool().await));
    Migrator::new(SqliteDialect::new(), store)
}
