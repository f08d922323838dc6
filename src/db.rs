//! Database module
//!
//! Connection setup and schema checks. The schema itself is managed outside
//! this service.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::storage::StorageError;

/// Open the pool and make sure one connection can be established
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect(&config.database_url)
        .await
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if the given tables exist. Names may be schema-qualified.
pub async fn check_schema(pool: &PgPool, tables: &[&str]) -> Result<(), StorageError> {
    for table in tables {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(*table)
            .fetch_one(pool)
            .await?;

        if !exists {
            return Err(StorageError::SchemaIncomplete(table.to_string()));
        }
    }

    Ok(())
}
