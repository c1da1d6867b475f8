//! Store adapters.
//!
//! The migrator hands every rendered statement to a [`Store`] together with
//! its bound values. [`SqliteStore`] runs them on a `sqlx` pool;
//! [`DryRunStore`] only records them.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool};
use sqlx::Row;
use tessera_sql::SqlValue;

use crate::error::{MigrateError, Result};

/// Executes rendered statements.
pub trait Store: Send + Sync {
    /// Executes a statement and returns the number of affected rows.
    fn execute(&self, sql: &str, args: &[SqlValue]) -> impl Future<Output = Result<u64>> + Send;

    /// Runs a `count(*)` query and returns the count.
    fn count(&self, sql: &str, args: &[SqlValue]) -> impl Future<Output = Result<i64>> + Send;

    /// Runs a query returning a single text value.
    fn scalar_text(
        &self,
        sql: &str,
        args: &[SqlValue],
    ) -> impl Future<Output = Result<String>> + Send;
}

/// A store backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps a pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind_all<'q>(sql: &'q str, args: &'q [SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter().fold(sqlx::query(sql), |query, value| match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Blob(bytes) => query.bind(bytes.as_slice()),
    })
}

impl Store for SqliteStore {
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        let result = bind_all(sql, args)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrateError::execution(sql, e))?;
        Ok(result.rows_affected())
    }

    async fn count(&self, sql: &str, args: &[SqlValue]) -> Result<i64> {
        let row = bind_all(sql, args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MigrateError::execution(sql, e))?;
        row.try_get::<i64, _>(0)
            .map_err(|e| MigrateError::execution(sql, e))
    }

    async fn scalar_text(&self, sql: &str, args: &[SqlValue]) -> Result<String> {
        let row = bind_all(sql, args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MigrateError::execution(sql, e))?;
        row.try_get::<String, _>(0)
            .map_err(|e| MigrateError::execution(sql, e))
    }
}

/// A statement captured by [`DryRunStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    /// Statement text with placeholders.
    pub sql: String,
    /// Bound values.
    pub args: Vec<SqlValue>,
}

impl Recorded {
    /// Renders the statement with its values inlined, for display.
    #[must_use]
    pub fn inline(&self) -> String {
        let mut args = self.args.iter();
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '?' => match args.next() {
                    Some(value) => out.push_str(&value.to_sql_inline()),
                    None => out.push('?'),
                },
                '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                    let mut digits = String::new();
                    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                        digits.push(digit);
                    }
                    let value = digits
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|n| self.args.get(n));
                    match value {
                        Some(value) => out.push_str(&value.to_sql_inline()),
                        None => {
                            out.push('$');
                            out.push_str(&digits);
                        }
                    }
                }
                other => out.push(other),
            }
        }
        out
    }
}

/// A store that records statements instead of running them.
///
/// Every probe counts zero, so a migration planned against it issues the
/// statements an empty database would need.
#[derive(Debug, Default)]
pub struct DryRunStore {
    executed: Mutex<Vec<Recorded>>,
    probes: Mutex<Vec<Recorded>>,
}

impl DryRunStore {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the statements passed to [`Store::execute`], in order.
    #[must_use]
    pub fn executed(&self) -> Vec<Recorded> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the catalog queries issued, in order.
    #[must_use]
    pub fn probes(&self) -> Vec<Recorded> {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(log: &Mutex<Vec<Recorded>>, sql: &str, args: &[SqlValue]) {
        log.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded {
                sql: sql.to_owned(),
                args: args.to_vec(),
            });
    }
}

impl Store for DryRunStore {
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        Self::record(&self.executed, sql, args);
        Ok(0)
    }

    async fn count(&self, sql: &str, args: &[SqlValue]) -> Result<i64> {
        Self::record(&self.probes, sql, args);
        Ok(0)
    }

    async fn scalar_text(&self, sql: &str, args: &[SqlValue]) -> Result<String> {
        Self::record(&self.probes, sql, args);
        Ok(String::new())
    }
}
