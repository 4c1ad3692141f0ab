//! Connection pool setup and the transactional envelope used by every
//! multi-statement write.

use futures::future::BoxFuture;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;

use crate::config::Config;
use crate::error::{StorageResultExt as _, StoreError};

/// A write transaction borrowed from the pool.
pub type Tx = Transaction<'static, Sqlite>;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Initialize a SQLite connection pool and bring the schema up to date.
pub async fn create_pool(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(config.database_url())?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout());

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections());
    if config.is_in_memory() {
        // The database disappears with its only connection.
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    MIGRATOR.run(&pool).await?;

    tracing::info!(
        max_connections = config.max_connections(),
        in_memory = config.is_in_memory(),
        "Database connection pool established"
    );

    Ok(pool)
}

/// Returns true when the database answers a trivial query.
pub async fn is_connected(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Runs `op` inside one transaction.
///
/// The transaction commits only when `op` returns `Ok`. On `Err` it is rolled
/// back and the error from `op` is returned unchanged. If the returned future
/// is dropped before completion the `sqlx` transaction guard rolls back when
/// it goes out of scope, so an abandoned request never leaves partial rows.
pub async fn with_transaction<T, F>(
    pool: &SqlitePool,
    operation: &'static str,
    op: F,
) -> Result<T, StoreError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut Tx) -> BoxFuture<'c, Result<T, StoreError>> + Send,
{
    let mut tx = pool.begin().await.during("beginning transaction")?;

    match op(&mut tx).await {
        Ok(value) => {
            tx.commit().await.during("committing transaction")?;
            tracing::debug!(operation, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(operation, error = %rollback_err, "rollback failed");
            }
            tracing::debug!(operation, error = %err, "transaction rolled back");
            Err(err)
        }
    }
}
