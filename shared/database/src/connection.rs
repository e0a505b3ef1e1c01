use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use bienestar_common::{AppError, DatabaseConfig};

pub type DbPool = Pool<Postgres>;

/// Builds the bounded connection pool shared by all request handlers.
/// Callers queue on the pool when every connection is in use.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(AppError::Database)?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(AppError::Database)?;

    tracing::info!("Database connection established");
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| AppError::Database(err.into()))?;

    tracing::info!("Database migrations completed");
    Ok(())
}
