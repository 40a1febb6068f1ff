use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{info, warn};

pub type SqlitePool = sqlx::SqlitePool;

/// Pool sizing for read-write access on an edge gateway.
const MAX_CONNECTIONS: u32 = 8;
/// Read-only pools stay smaller; they only serve reporting queries.
const MAX_READONLY_CONNECTIONS: u32 = 4;

/// SQLite client wrapping a connection pool.
///
/// Foreign keys are enabled per connection through the connect options, so
/// every pooled connection enforces the child-table cascade, not just the
/// one that happened to run a pragma first.
#[derive(Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
    db_path: String,
}

impl SqliteClient {
    /// Open (creating if missing) a read-write database at `db_path`.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let db_path_str = db_path.to_string_lossy().to_string();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory for {db_path_str}"))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .journal_mode(SqliteJournalMode::Wal) // concurrent readers during writes
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-2000") // 2MB, negative means KB
            .pragma("page_size", "4096")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {db_path_str}"))?;

        info!("SQLite database connected: {}", db_path_str);

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    /// Open an existing database read-only.
    pub async fn new_readonly(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let db_path_str = db_path.to_string_lossy().to_string();

        if !db_path.exists() {
            warn!("Database file does not exist: {}", db_path_str);
            anyhow::bail!("Database file not found: {db_path_str}");
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_READONLY_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {db_path_str} read-only"))?;

        info!("SQLite database connected (read-only): {}", db_path_str);

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    /// In-memory database on a single connection.
    ///
    /// A pooled in-memory database would hand every connection its own
    /// empty store, so the pool is pinned to one connection. Intended for
    /// tests and short-lived tooling.
    pub async fn memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Ok(Self {
            pool,
            db_path: ":memory:".to_string(),
        })
    }

    /// Wrap an externally constructed pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            db_path: "from_pool".to_string(),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path.
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Check if the database is accessible.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get database file size in bytes.
    pub fn size(&self) -> Result<u64> {
        let metadata = std::fs::metadata(&self.db_path)
            .with_context(|| format!("Failed to stat {}", self.db_path))?;
        Ok(metadata.len())
    }

    /// Vacuum the database to reclaim space.
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        info!("Database vacuumed: {}", self.db_path);
        Ok(())
    }
}
