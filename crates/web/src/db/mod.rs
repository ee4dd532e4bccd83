//! Database operations for the site's `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `users` - Site accounts (argon2 password hashes)
//! - `stores` - Store listings (slug unique, tags as `TEXT[]`)
//! - `reviews` - Insert-only store reviews
//! - `user_hearts` - Favorite toggles, `(user_id, store_id)` primary key
//! - `password_reset_tokens` - One-hour reset tokens
//! - `sessions` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p storefinder-cli -- migrate
//! ```

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug or email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Input rejected before reaching the database (e.g., a name that
    /// produces no usable slug).
    #[error("invalid input: {0}")]
    Validation(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
