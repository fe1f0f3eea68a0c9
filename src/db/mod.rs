use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub mod documents;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is its own database, so in-memory
        // pools are pinned to a single connection that never expires.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .acquire_timeout(Duration::from_secs(30))
                .idle_timeout(Duration::from_secs(600))
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        let migrator = sqlx::migrate!("./migrations");
        info!("Running {} SQLx migrations", migrator.migrations.len());
        migrator.run(&self.pool).await?;
        Ok(())
    }

    /// Opens the database and brings the schema up to date.
    pub async fn connect_and_migrate(database_url: &str) -> Result<Self> {
        let db = Self::new(database_url).await?;
        db.migrate().await?;
        Ok(db)
    }
}

/// True when `err` comes from a UNIQUE constraint, e.g. a second record
/// claiming a stored filename.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}
