//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod notifications;

/// Migrations are embedded in the binary and applied on start-up.
pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
