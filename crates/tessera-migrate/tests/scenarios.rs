//! Ordering and DDL scenarios.

mod common;

use std::sync::Arc;

use common::{item, mutual, shop, sqlite_migrator, table_names};
use tessera_migrate::prelude::*;

#[test]
fn test_referenced_model_is_ordered_first() {
    let manifest = shop();
    let orders = manifest.model("orders").unwrap();
    let customers = manifest.model("customers").unwrap();

    let ordered = reorder_models(&[orders, customers], false).unwrap();
    assert_eq!(table_names(&ordered), vec!["customers", "orders"]);
}

#[test]
fn test_mutual_references_terminate_with_each_table_once() {
    let manifest = mutual();
    for auto_add in [false, true] {
        let ordered = reorder_models(&manifest.models(), auto_add).unwrap();
        let mut tables = table_names(&ordered);
        tables.sort_unstable();
        assert_eq!(tables, vec!["authors", "books"]);
    }
}

#[test]
fn test_auto_add_pulls_in_unlisted_dependencies() {
    let manifest = shop();
    let orders = manifest.model("orders").unwrap();

    let ordered = reorder_models(&[orders], true).unwrap();
    assert_eq!(table_names(&ordered), vec!["customers", "orders"]);
}

#[tokio::test]
async fn test_create_table_declares_columns_and_primary_key() {
    let migrator = Migrator::new(MySqlDialect::new(), DryRunStore::new());
    migrator.auto_migrate(&[item()]).await.unwrap();

    let executed = migrator.store().executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql,
        "CREATE TABLE `items` (`id` bigint,`name` varchar(255),PRIMARY KEY (`id`))"
    );
    assert!(executed[0].args.is_empty());
}

#[tokio::test]
async fn test_existing_table_gets_only_the_missing_column() {
    let migrator = sqlite_migrator().await;
    migrator
        .store()
        .inner()
        .execute("CREATE TABLE \"items\" (\"id\" INTEGER, PRIMARY KEY (\"id\"))", &[])
        .await
        .unwrap();

    migrator.auto_migrate(&[item()]).await.unwrap();

    assert_eq!(
        migrator.store().take(),
        vec!["ALTER TABLE \"items\" ADD COLUMN \"name\" TEXT"]
    );
    assert!(migrator.try_has_column(&*item(), "name").await.unwrap());
}

#[tokio::test]
async fn test_plan_creates_join_tables_after_their_owners() {
    let migrator = Migrator::new(PostgresDialect::new(), DryRunStore::new());
    migrator.auto_migrate(&shop().models()).await.unwrap();

    let creates: Vec<String> = migrator
        .store()
        .executed()
        .into_iter()
        .filter(|recorded| recorded.sql.starts_with("CREATE TABLE"))
        .map(|recorded| recorded.sql)
        .collect();
    assert_eq!(creates.len(), 4);
    assert!(creates[0].starts_with("CREATE TABLE \"customers\""));
    assert!(creates[1].starts_with("CREATE TABLE \"orders\""));
    assert!(creates[2].starts_with("CREATE TABLE \"tags\""));
    assert_eq!(
        creates[3],
        "CREATE TABLE \"orders_tags\" (\"orders_id\" BIGINT NOT NULL,\"tags_id\" BIGINT NOT NULL,\
         PRIMARY KEY (\"orders_id\",\"tags_id\"),\
         CONSTRAINT \"fk_orders_tags_orders\" FOREIGN KEY (\"orders_id\") \
         REFERENCES \"orders\"(\"id\") ON DELETE CASCADE ON UPDATE CASCADE,\
         CONSTRAINT \"fk_orders_tags_tags\" FOREIGN KEY (\"tags_id\") \
         REFERENCES \"tags\"(\"id\") ON DELETE CASCADE ON UPDATE CASCADE)"
    );
}

#[tokio::test]
async fn test_deferred_constraints_are_added_after_the_batch() {
    let config = MigratorConfig::new().deferred_constraints(true);
    let migrator = Migrator::with_config(PostgresDialect::new(), DryRunStore::new(), config);
    migrator.auto_migrate(&mutual().models()).await.unwrap();

    let sql: Vec<String> = migrator
        .store()
        .executed()
        .into_iter()
        .map(|recorded| recorded.sql)
        .collect();
    assert_eq!(sql.len(), 4);
    assert!(sql[..2].iter().all(|s| s.starts_with("CREATE TABLE") && !s.contains("FOREIGN KEY")));
    assert!(sql[2..]
        .iter()
        .all(|s| s.starts_with("ALTER TABLE") && s.contains("ADD CONSTRAINT")));
}

#[tokio::test]
async fn test_sqlite_ignores_deferred_constraints() {
    let config = MigratorConfig::new().deferred_constraints(true);
    let migrator = Migrator::with_config(SqliteDialect::new(), DryRunStore::new(), config);
    migrator.auto_migrate(&mutual().models()).await.unwrap();

    let executed = migrator.store().executed();
    assert_eq!(executed.len(), 2);
    assert!(executed.iter().all(|recorded| recorded.sql.contains("FOREIGN KEY")));
}

#[tokio::test]
async fn test_drop_table_runs_in_reverse_dependency_order() {
    let manifest = shop();
    let migrator = Migrator::new(SqliteDialect::new(), DryRunStore::new());
    let models = vec![
        manifest.model("customers").unwrap(),
        manifest.model("orders").unwrap(),
    ];
    migrator.drop_table(&models).await.unwrap();

    let sql: Vec<String> = migrator
        .store()
        .executed()
        .into_iter()
        .map(|recorded| recorded.sql)
        .collect();
    assert_eq!(
        sql,
        vec![
            "DROP TABLE IF EXISTS \"orders_tags\"",
            "DROP TABLE IF EXISTS \"orders\"",
            "DROP TABLE IF EXISTS \"customers\"",
        ]
    );
}

#[tokio::test]
async fn test_schema_models_work_without_a_manifest() {
    let customers: ModelRef = Arc::new(
        Schema::new("customers").field(Field::new("id", DataType::Int).primary_key()),
    );
    let orders: ModelRef = Arc::new(
        Schema::new("orders")
            .field(Field::new("id", DataType::Int).primary_key())
            .field(Field::new("customer_id", DataType::Int))
            .relationship(Relationship::belongs_to(
                "customer",
                Constraint::new("fk_orders_customer", Arc::clone(&customers))
                    .foreign_key("customer_id")
                    .references("id"),
            )),
    );

    let migrator = Migrator::new(SqliteDialect::new(), DryRunStore::new());
    migrator.create_table(&[orders, customers]).await.unwrap();

    let executed = migrator.store().executed();
    assert!(executed[0].sql.starts_with("CREATE TABLE \"customers\""));
    assert!(executed[1].sql.starts_with("CREATE TABLE \"orders\""));
}
