//! SQLite connectivity for AgriQuery
//!
//! Connection pool factory with WAL support, plus the readings schema
//! bootstrap. In production the `sensor_data` table is written by the
//! external collector; the bootstrap keeps local runs and tests
//! self-contained.


use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::error::{AgriQueryError, Result};

/// SQLite synchronous mode configuration
#[derive(Debug, Clone, Copy, Default)]
pub enum SynchronousMode {
    /// Fastest, but may lose data on crash
    Off,
    /// Balanced performance and safety
    #[default]
    Normal,
    /// Safest, but slowest
    Full,
}

/// SQLite connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path
    pub db_path: PathBuf,

    /// Maximum number of connections
    pub max_connections: u32,

    /// Minimum number of connections
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,

    /// Whether to enable WAL mode
    pub enable_wal: bool,

    /// Synchronous mode
    pub synchronous: SynchronousMode,

    /// Cache size (pages, negative means KB)
    pub cache_size: i32,

    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_path: directories::ProjectDirs::from("com", "agriquery", "AgriQuery")
                .map(|dirs| dirs.data_local_dir().join("readings.db"))
                .unwrap_or_else(|| PathBuf::from("readings.db")),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            enable_wal: cfg!(feature = "wal"),
            synchronous: SynchronousMode::Normal,
            cache_size: -64000, // 64MB cache
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig with the specified path
    pub fn with_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            ..Default::default()
        }
    }

    /// Set WAL mode
    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }

    /// Set maximum connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set synchronous mode
    pub fn with_synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }
}

/// Create a database connection pool with the given configuration
///
/// WAL mode allows the external collector to append readings while
/// queries run concurrently; it is configured via the `wal` feature.
///
/// # Errors
///
/// Returns an error if the database cannot be created or connected to
pub async fn create_database_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = config.db_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AgriQueryError::Database(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create database directory: {}", e),
            )))
        })?;
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(&config.db_path)
        .create_if_missing(true)
        // WAL mode: allows concurrent reads while the collector writes
        .journal_mode(if config.enable_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        })
        .synchronous(match config.synchronous {
            SynchronousMode::Off => SqliteSynchronous::Off,
            SynchronousMode::Normal => SqliteSynchronous::Normal,
            SynchronousMode::Full => SqliteSynchronous::Full,
        })
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms as u64))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(connect_options)
        .await
        .map_err(AgriQueryError::Database)?;

    sqlx::query(&format!("PRAGMA cache_size = {}", config.cache_size))
        .execute(&pool)
        .await
        .map_err(AgriQueryError::Database)?;

    // Memory-mapped I/O improves read performance on large histories
    sqlx::query("PRAGMA mmap_size = 268435456") // 256MB
        .execute(&pool)
        .await
        .map_err(AgriQueryError::Database)?;

    sqlx::query("PRAGMA temp_store = MEMORY")
        .execute(&pool)
        .await
        .map_err(AgriQueryError::Database)?;

    tracing::info!(
        "Database pool created: {:?} (WAL: {}, connections: {})",
        config.db_path,
        config.enable_wal,
        config.max_connections
    );

    Ok(pool)
}

/// Create the readings table and its query index when absent.
///
/// The collector owns this table in production; the statements are
/// `IF NOT EXISTS` so running against a live database is a no-op.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sensor_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sensor_type TEXT NOT NULL,
            value REAL NOT NULL,
            timestamp TEXT NOT NULL,
            location TEXT,
            unit TEXT
        )",
    )
    .execute(pool)
    .await
    .map_err(AgriQueryError::Database)?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sensor_data_type_time \
         ON sensor_data (sensor_type, timestamp)",
    )
    .execute(pool)
    .await
    .map_err(AgriQueryError::Database)?;

    Ok(())
}
