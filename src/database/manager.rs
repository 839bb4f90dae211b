use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Name of the partial unique index guarding nicknames of non-deleted members
pub const NICKNAME_UNIQUE_INDEX: &str = "members_nickname_active_key";

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool setup and schema bootstrap for the Postgres store
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max_connections={})", config.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Creates tables and indexes that do not exist yet. Idempotent.
    pub async fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        let mut tx = pool.begin().await?;
        for statement in schema_statements(SCHEMA_SQL) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// True when `err` is a unique violation on the given index/constraint
    pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
        err.as_database_error()
            .map(|db| db.is_unique_violation() && db.constraint() == Some(constraint))
            .unwrap_or(false)
    }
}

fn schema_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.lines().all(|l| l.trim().is_empty() || l.trim().starts_with("--")))
}
