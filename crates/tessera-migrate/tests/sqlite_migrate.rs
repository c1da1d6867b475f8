//! Migrations against an in-memory SQLite database.

mod common;

use std::sync::{Mutex, PoisonError};

use common::{item, memory_pool, shop, sqlite_migrator};
use tessera_migrate::prelude::*;
use tessera_sql::SqlValue;

#[tokio::test]
async fn test_auto_migrate_is_idempotent() {
    let migrator = sqlite_migrator().await;
    let models = shop().models();

    migrator.auto_migrate(&models).await.unwrap();
    let first = migrator.store().take();
    assert_eq!(
        first.iter().filter(|sql| sql.starts_with("CREATE TABLE")).count(),
        4
    );
    assert!(first
        .iter()
        .any(|sql| sql == "CREATE INDEX \"idx_orders_customer_id\" ON \"orders\" (\"customer_id\")"));

    migrator.auto_migrate(&models).await.unwrap();
    assert!(migrator.store().take().is_empty());
}

#[tokio::test]
async fn test_probes_see_what_auto_migrate_created() {
    let migrator = sqlite_migrator().await;
    let manifest = shop();
    migrator.auto_migrate(&manifest.models()).await.unwrap();

    let orders = manifest.model("orders").unwrap();
    assert!(migrator.has_table(&*orders).await);
    assert!(migrator.has_column(&*orders, "total").await);
    assert!(!migrator.has_column(&*orders, "missing").await);
    assert!(migrator.has_index(&*orders, "idx_orders_customer_id").await);
    assert!(migrator.has_index(&*orders, "customer_id").await);
    assert!(migrator.has_constraint(&*orders, "fk_orders_customer").await);
    assert!(migrator.has_constraint(&*orders, "customer_id").await);
    assert!(migrator.has_constraint(&*orders, "chk_orders_total").await);
    assert!(!migrator.has_constraint(&*orders, "fk_orders_nothing").await);

    let join = Schema::new("orders_tags");
    assert!(migrator.has_table(&join).await);
}

#[tokio::test]
async fn test_existing_table_gets_missing_index() {
    let migrator = sqlite_migrator().await;
    let manifest = shop();
    migrator.auto_migrate(&manifest.models()).await.unwrap();

    let orders = manifest.model("orders").unwrap();
    migrator
        .drop_index(&*orders, "idx_orders_customer_id")
        .await
        .unwrap();
    assert!(!migrator.has_index(&*orders, "idx_orders_customer_id").await);
    migrator.store().take();

    migrator.auto_migrate(&manifest.models()).await.unwrap();
    assert_eq!(
        migrator.store().take(),
        vec!["CREATE INDEX \"idx_orders_customer_id\" ON \"orders\" (\"customer_id\")"]
    );
}

#[tokio::test]
async fn test_column_operations_round_trip() {
    let migrator = sqlite_migrator().await;
    let items = item();
    migrator.create_table(&[items.clone()]).await.unwrap();

    migrator.drop_column(&*items, "name").await.unwrap();
    assert!(!migrator.has_column(&*items, "name").await);

    migrator.add_column(&*items, "name").await.unwrap();
    assert!(migrator.has_column(&*items, "name").await);

    migrator
        .store()
        .inner()
        .execute("ALTER TABLE \"items\" RENAME COLUMN \"name\" TO \"title\"", &[])
        .await
        .unwrap();
    migrator.rename_column(&*items, "title", "name").await.unwrap();
    assert!(migrator.has_column(&*items, "name").await);
    assert!(!migrator.has_column(&*items, "title").await);
}

#[tokio::test]
async fn test_unknown_names_are_reported() {
    let migrator = sqlite_migrator().await;
    let items = item();

    assert!(matches!(
        migrator.add_column(&*items, "nope").await,
        Err(MigrateError::FieldNotFound { .. })
    ));
    assert!(matches!(
        migrator.create_index(&*items, "nope").await,
        Err(MigrateError::IndexNotFound { .. })
    ));
    assert!(migrator.store().take().is_empty());
}

#[tokio::test]
async fn test_unsupported_operations_fail_before_executing() {
    let migrator = sqlite_migrator().await;
    let items = item();

    assert!(matches!(
        migrator.alter_column(&*items, "name").await,
        Err(MigrateError::Unsupported { dialect: "sqlite", .. })
    ));
    assert!(matches!(
        migrator.create_constraint(&*items, "anything").await,
        Err(MigrateError::Unsupported { .. })
    ));
    assert!(migrator.store().take().is_empty());
}

#[tokio::test]
async fn test_rename_table_moves_the_table() {
    let migrator = sqlite_migrator().await;
    let items = item();
    migrator.create_table(&[items.clone()]).await.unwrap();

    migrator.rename_table("items", "products").await.unwrap();
    assert!(migrator.has_table(&Schema::new("products")).await);
    assert!(!migrator.has_table(&*items).await);
}

#[tokio::test]
async fn test_drop_table_removes_join_tables_first() {
    let migrator = sqlite_migrator().await;
    let models = shop().models();
    migrator.create_table(&models).await.unwrap();
    assert!(migrator.has_table(&Schema::new("orders_tags")).await);

    migrator.store().take();
    migrator.drop_table(&models).await.unwrap();
    assert_eq!(
        migrator.store().take(),
        vec![
            "DROP TABLE IF EXISTS \"orders_tags\"",
            "DROP TABLE IF EXISTS \"tags\"",
            "DROP TABLE IF EXISTS \"orders\"",
            "DROP TABLE IF EXISTS \"customers\"",
        ]
    );
    for model in &models {
        assert!(!migrator.has_table(&**model).await);
    }
    assert!(!migrator.has_table(&Schema::new("orders_tags")).await);

    let remaining = migrator
        .store()
        .inner()
        .count(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_current_database_is_main() {
    let migrator = sqlite_migrator().await;
    assert_eq!(migrator.current_database().await.unwrap(), "main");
}

/// A store whose every call fails.
#[derive(Debug)]
struct Unreachable;

impl Store for Unreachable {
    async fn execute(&self, _sql: &str, _args: &[SqlValue]) -> Result<u64> {
        Err(MigrateError::NotImplemented("execute"))
    }

    async fn count(&self, _sql: &str, _args: &[SqlValue]) -> Result<i64> {
        Err(MigrateError::NotImplemented("count"))
    }

    async fn scalar_text(&self, _sql: &str, _args: &[SqlValue]) -> Result<String> {
        Err(MigrateError::NotImplemented("scalar_text"))
    }
}

#[tokio::test]
async fn test_failed_probes_count_as_absent() {
    let migrator = Migrator::new(SqliteDialect::new(), Unreachable);
    let items = item();

    assert!(!migrator.has_table(&*items).await);
    assert!(migrator.try_has_table(&*items).await.is_err());
    assert!(!migrator.has_column(&*items, "name").await);
    assert!(migrator.try_has_index(&*items, "idx").await.is_err());
}

/// Runs statements on SQLite until the `fail_at`-th one, which fails.
#[derive(Debug)]
struct FailAt {
    inner: SqliteStore,
    fail_at: usize,
    executed: Mutex<Vec<String>>,
}

impl Store for FailAt {
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        let position = {
            let mut executed = self.executed.lock().unwrap_or_else(PoisonError::into_inner);
            executed.push(sql.to_owned());
            executed.len()
        };
        if position == self.fail_at {
            return Err(MigrateError::NotImplemented("execute"));
        }
        self.inner.execute(sql, args).await
    }

    async fn count(&self, sql: &str, args: &[SqlValue]) -> Result<i64> {
        self.inner.count(sql, args).await
    }

    async fn scalar_text(&self, sql: &str, args: &[SqlValue]) -> Result<String> {
        self.inner.scalar_text(sql, args).await
    }
}

#[tokio::test]
async fn test_failed_statement_stops_the_batch() {
    let store = FailAt {
        inner: SqliteStore::new(memory_pool().await),
        fail_at: 2,
        executed: Mutex::new(Vec::new()),
    };
    let migrator = Migrator::new(SqliteDialect::new(), store);
    let manifest = shop();

    assert!(migrator.auto_migrate(&manifest.models()).await.is_err());

    let executed = migrator
        .store()
        .executed
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].starts_with("CREATE TABLE \"customers\""));
    assert!(executed[1].starts_with("CREATE TABLE \"orders\""));

    let customers = manifest.model("customers").unwrap();
    let orders = manifest.model("orders").unwrap();
    assert!(migrator.has_table(&*customers).await);
    assert!(!migrator.has_table(&*orders).await);
}
