//! Database migration command.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migration files live in `crates/web/migrations/` and are embedded at
//! compile time.

use secrecy::SecretString;
use tracing::info;

use storefinder_web::db;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the site's database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if `DATABASE_URL` is unset, the connection
/// fails, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
