//! SQLite-backed metrics repository
//!
//! The durable record is one row: the aggregate plus the resume cursor,
//! written together so a restart always observes a consistent pair.

use crate::ingest_core::metrics::Metrics;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Database(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Load/save capability over the singleton `(aggregate, cursor)` row.
///
/// Single logical row, single writer. The ingestor's sequential design
/// guarantees saves never overlap.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Idempotently create the schema and seed the singleton row if absent.
    /// Safe to call on every process start.
    async fn init(&self) -> Result<(), StoreError>;

    /// Read the current durable state. All fields come from one row read,
    /// never a partial write.
    async fn load(&self) -> Result<Metrics, StoreError>;

    /// Atomically overwrite the singleton row.
    async fn save(&self, metrics: &Metrics) -> Result<(), StoreError>;
}

pub struct SqliteMetricsRepository {
    conn: Mutex<Connection>,
}

impl SqliteMetricsRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        // SQLite can only handle one writer at a time; WAL keeps readers out
        // of the writer's way.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl MetricsRepository for SqliteMetricsRepository {
    async fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY CHECK(id = 1),
                last_round INTEGER NOT NULL,
                count INTEGER NOT NULL,
                sum INTEGER NOT NULL,
                min INTEGER NOT NULL,
                max INTEGER NOT NULL
            )",
            [],
        )?;

        // Seed the singleton once: zero aggregate, cursor 0, min at the
        // sentinel so the first real amount replaces it.
        conn.execute(
            "INSERT OR IGNORE INTO metrics (id, last_round, count, sum, min, max)
             VALUES (1, 0, 0, 0, ?1, 0)",
            params![i64::MAX],
        )?;

        log::info!("✅ Metrics store initialized (WAL mode)");
        Ok(())
    }

    async fn load(&self) -> Result<Metrics, StoreError> {
        let conn = self.conn.lock().unwrap();

        let metrics = conn.query_row(
            "SELECT count, sum, min, max, last_round FROM metrics WHERE id = 1",
            [],
            |row| {
                Ok(Metrics {
                    count: row.get(0)?,
                    sum: row.get(1)?,
                    min: row.get(2)?,
                    max: row.get(3)?,
                    last_round: row.get(4)?,
                })
            },
        )?;

        Ok(metrics)
    }

    async fn save(&self, metrics: &Metrics) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE metrics SET count = ?1, sum = ?2, min = ?3, max = ?4, last_round = ?5
             WHERE id = 1",
            params![
                metrics.count,
                metrics.sum,
                metrics.min,
                metrics.max,
                metrics.last_round,
            ],
        )?;

        Ok(())
    }
}
