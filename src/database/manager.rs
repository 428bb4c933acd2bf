use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::RecordStore;
use crate::config::DatabaseConfig;

/// Errors raised while opening or preparing the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a pool against `database.url`
pub async fn connect(database: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let url = database.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
    let shown = redact(url)?;

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.connection_timeout))
        .connect(url)
        .await?;

    info!("Connected to database {}", shown);
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Pick the record store for this process. Without `DATABASE_URL` only the
/// development environment may fall back to the in-memory store.
pub async fn open_store(database: &DatabaseConfig, development: bool) -> Result<Arc<dyn RecordStore>, DatabaseError> {
    if database.url.is_none() {
        if development {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            return Ok(Arc::new(MemoryStore::new()));
        }
        return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
    }

    let pool = connect(database).await?;
    if database.run_migrations {
        migrate(&pool).await?;
    }
    Ok(Arc::new(PgStore::new(pool)))
}

/// Connection string safe for logs: password removed
pub fn redact(url: &str) -> Result<String, DatabaseError> {
    let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    if parsed.password().is_some() {
        parsed.set_password(Some("***")).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    }
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(str::to_string),
            max_connections: 2,
            connection_timeout: 1,
            run_migrations: false,
        }
    }

    #[test]
    fn redacts_password() {
        let shown = redact("postgres://app:hunter2@db:5432/bizops").unwrap();
        assert_eq!(shown, "postgres://app:***@db:5432/bizops");
        assert!(matches!(redact("not a url"), Err(DatabaseError::InvalidDatabaseUrl)));
    }

    #[tokio::test]
    async fn memory_store_only_in_development() {
        let store = open_store(&database(None), true).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(matches!(
            open_store(&database(None), false).await,
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
