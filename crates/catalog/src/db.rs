//! Database connection and pool management.

use booklib_config::DatabaseConfig;
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::schema::{self, Drift};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Database connection pool for the catalogue.
///
/// This is the main entry point for interacting with the catalogue database.
/// It manages the SQLite connection pool, keeps the schema migrated, and
/// hands out [`Catalog`](crate::Catalog) repositories.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Apply the query-based PRAGMAs to EVERY pooled connection, not
            // only the first one handed out.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the catalogue database at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = Self::base_options(BUSY_TIMEOUT).filename(path).create_if_missing(true);
        let db = Self::new(options, None).await?;
        tracing::info!("Connected to catalogue database");
        Ok(db)
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options(BUSY_TIMEOUT).filename(":memory:");
        // Parallel connections to ":memory:" would each see their own empty
        // database, so the pool is limited to one connection.
        Self::new(options, Some(1)).await
    }

    /// Connect using loaded configuration.
    #[instrument(skip_all, fields(in_memory = config.in_memory))]
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        if config.in_memory {
            return Self::connect_in_memory().await;
        }
        let options = Self::base_options(Duration::from_millis(config.busy_timeout_ms))
            .filename(&config.path)
            .create_if_missing(true);
        let db = Self::new(options, Some(config.max_connections)).await?;
        tracing::info!(path = %config.path.display(), "Connected to catalogue database");
        Ok(db)
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options(busy_timeout: Duration) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Readers don't block the single writer.
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Foreign key enforcement. Ratings, comments and tag links rely
            // on it for both rejection of dangling ids and ON DELETE actions.
            .foreign_keys(true)
            // Safe under WAL; a power cut can only lose the last commits.
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout)
    }

    /// Per-connection PRAGMAs with no `SqliteConnectOptions` setter.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA recursive_triggers = OFF;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Run database migrations.
    ///
    /// This is called automatically by every constructor.
    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Compare the live database against the schema registry.
    ///
    /// Every difference is logged as a warning and returned; nothing is repaired.
    #[instrument(skip(self))]
    pub async fn verify_schema(&self) -> Result<Vec<Drift>> {
        let drift = schema::diff(schema::schema(), &self.pool).await?;
        for entry in &drift {
            tracing::warn!(drift = %entry, "Catalogue schema has drifted from its declaration");
        }
        Ok(drift)
    }

    /// The underlying pool, for queries the [`Catalog`](crate::Catalog) doesn't cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for outstanding connections and shut the pool down.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
