//! tessera-migrate CLI
//!
//! Applies a JSON model manifest to a database.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tessera_migrate::prelude::*;

/// Dependency-ordered, additive schema migration.
#[derive(Parser)]
#[command(name = "tessera-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    database: String,

    /// JSON model manifest.
    #[arg(short, long)]
    manifest: PathBuf,

    /// Create indexes after CREATE TABLE instead of inline.
    #[arg(long)]
    create_index_after_create_table: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables, columns, constraints and indexes.
    AutoMigrate {
        /// Tables to migrate (all declared models if not specified).
        tables: Vec<String>,
    },

    /// Create tables in dependency order.
    Create {
        /// Tables to create (all declared models if not specified).
        tables: Vec<String>,
    },

    /// Drop tables in reverse dependency order.
    Drop {
        /// Tables to drop (all declared models if not specified).
        tables: Vec<String>,
    },

    /// Print the dependency order of the models.
    Order {
        /// Include referenced models that were not listed.
        #[arg(long)]
        auto_add: bool,

        /// Tables to order (all declared models if not specified).
        tables: Vec<String>,
    },

    /// Print the statements auto-migrate would issue against an empty database.
    Plan {
        /// SQL dialect to render.
        #[arg(long, value_enum, default_value_t = DialectKind::Sqlite)]
        dialect: DialectKind,

        /// Tables to plan (all declared models if not specified).
        tables: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectKind {
    Sqlite,
    Postgres,
    Mysql,
}

fn select(manifest: &std::sync::Arc<Manifest>, tables: &[String]) -> Result<Vec<ModelRef>> {
    if tables.is_empty() {
        return Ok(manifest.models());
    }
    tables.iter().map(|table| manifest.model(table)).collect()
}

async fn plan<D: MigrationDialect>(
    dialect: D,
    config: MigratorConfig,
    models: &[ModelRef],
) -> Result<()> {
    let migrator = Migrator::with_config(dialect, DryRunStore::new(), config);
    migrator.auto_migrate(models).await?;
    for statement in migrator.store().executed() {
        println!("{};", statement.inline());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manifest = Manifest::load(&cli.manifest)?;
    let config =
        MigratorConfig::new().create_index_after_create_table(cli.create_index_after_create_table);

    match cli.command {
        Commands::Order { auto_add, tables } => {
            let models = select(&manifest, &tables)?;
            for (position, model) in reorder_models(&models, auto_add)?.iter().enumerate() {
                println!("{:>3}. {}", position + 1, model.table_name());
            }
        }

        Commands::Plan { dialect, tables } => {
            let models = select(&manifest, &tables)?;
            match dialect {
                DialectKind::Sqlite => plan(SqliteDialect::new(), config, &models).await?,
                DialectKind::Postgres => plan(PostgresDialect::new(), config, &models).await?,
                DialectKind::Mysql => plan(MySqlDialect::new(), config, &models).await?,
            }
        }

        Commands::AutoMigrate { tables } => {
            let models = select(&manifest, &tables)?;
            let migrator = connect(&cli.database, config).await?;
            migrator.auto_migrate(&models).await?;
            info!(models = models.len(), "Auto-migration complete.");
        }

        Commands::Create { tables } => {
            let models = select(&manifest, &tables)?;
            let migrator = connect(&cli.database, config).await?;
            migrator.create_table(&models).await?;
            info!(models = models.len(), "Tables created.");
        }

        Commands::Drop { tables } => {
            let models = select(&manifest, &tables)?;
            let migrator = connect(&cli.database, config).await?;
            migrator.drop_table(&models).await?;
            info!(models = models.len(), "Tables dropped.");
        }
    }

    Ok(())
}

async fn connect(
    database: &str,
    config: MigratorConfig,
) -> anyhow::Result<Migrator<SqliteDialect, SqliteStore>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(database)
        .await?;
    info!(database = %database, "Connected");
    Ok(Migrator::with_config(
        SqliteDialect::new(),
        SqliteStore::new(pool),
        config,
    ))
}
