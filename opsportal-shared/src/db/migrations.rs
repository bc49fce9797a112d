/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root
/// and are embedded at compile time via `sqlx::migrate!`. The API binary
/// runs them on startup; integration tests run them against their test
/// database.

use sqlx::postgres::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed or a migration
/// fails to execute
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database schema up to date");

    Ok(())
}
