pub mod create;
pub mod documents;
pub mod users;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

pub use create::create_tables;
pub use documents::{DocumentError, DocumentResult};
pub use users::{CredentialRecord, NewUser, find_by_username, insert_user};

/// Open the pool and make sure the schema exists.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url: {}", url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", url))?;

    create_tables(&pool)
        .await
        .context("Failed to create database tables")?;

    info!("Connected to database: {}", url);
    Ok(pool)
}

/// Fresh in-memory database with the schema applied. A single connection so
/// every query sees the same memory database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", 1).await.unwrap()
}
