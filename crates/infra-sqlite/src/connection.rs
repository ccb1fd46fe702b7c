// SQLite Connection Pool Setup

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use taskbox_core::error::{AppError, Result};

/// Create the SQLite connection pool with WAL mode and a bounded busy wait.
///
/// `production` switches to the hardened options: the database file must
/// already exist and lock contention gets a longer grace period.
pub async fn create_pool(database_url: &str, production: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("invalid database url: {e}")))?
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(if production {
            Duration::from_secs(10)
        } else {
            Duration::from_secs(5)
        })
        .create_if_missing(!production);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(pool)
}
