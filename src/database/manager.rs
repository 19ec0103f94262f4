use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation on `field`.
    #[error("A record with that {field} already exists")]
    Conflict { field: String },

    /// Foreign key violation, carrying the constraint name.
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            match db.code().as_deref() {
                Some("23505") => {
                    return DatabaseError::Conflict {
                        field: constraint_field(db.constraint().unwrap_or_default()),
                    }
                }
                Some("23503") => {
                    return DatabaseError::ForeignKey(db.constraint().unwrap_or("foreign key").to_string())
                }
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl From<crate::filter::FilterError> for DatabaseError {
    fn from(err: crate::filter::FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

/// Constraints are named `<table>_<field>_key`; anything else reports as `field`.
fn constraint_field(constraint: &str) -> String {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.split_once('_'))
        .map(|(_, field)| field.to_string())
        .unwrap_or_else(|| "field".to_string())
}

/// Pool construction, schema migration and liveness checks.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the shared pool. Connections are opened lazily so the server can
    /// start (and report 503 on `/health`) while the database is unreachable.
    pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&config.url)?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
