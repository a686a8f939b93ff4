//! SQLite-backed sensor reading store
//!
//! Executes compiled SELECTs against the shared pool with a hard
//! per-query timeout and at most the configured number of automatic
//! retries. A query failure is surfaced as-is; only connection loss and
//! timeouts are retried.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};

use crate::core::config::StoreConfig;
use crate::core::error::{ErrorRecovery, StoreError};

use super::{ReadingRow, SensorReadingStore};

pub struct SqliteReadingStore {
    pool: SqlitePool,
    config: StoreConfig,
}

impl SqliteReadingStore {
    pub fn new(pool: SqlitePool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    async fn run_once(&self, sql: &str, params: &[String]) -> Result<Vec<ReadingRow>, StoreError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }

        let rows = tokio::time::timeout(
            Duration::from_millis(self.config.query_timeout_ms),
            query.fetch_all(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Timeout {
            timeout_ms: self.config.query_timeout_ms,
        })?
        .map_err(StoreError::from)?;

        rows.iter().map(row_to_reading).collect()
    }
}

#[async_trait]
impl SensorReadingStore for SqliteReadingStore {
    async fn execute_select(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<ReadingRow>, StoreError> {
        let mut attempt = 0u32;
        loop {
            match self.run_once(sql, params).await {
                Ok(rows) => return Ok(rows),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = err.retry_delay_ms().unwrap_or(500);
                    tracing::warn!(error = %err, attempt, "store query failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Decode only the columns the guard allows; anything else is ignored.
fn row_to_reading(row: &SqliteRow) -> Result<ReadingRow, StoreError> {
    let mut reading = ReadingRow::default();
    for column in row.columns() {
        let idx = column.ordinal();
        match column.name() {
            "timestamp" => reading.timestamp = row.try_get(idx).map_err(StoreError::from)?,
            "sensor_type" => reading.sensor_type = row.try_get(idx).map_err(StoreError::from)?,
            "value" => reading.value = row.try_get(idx).map_err(StoreError::from)?,
            "location" => reading.location = row.try_get(idx).map_err(StoreError::from)?,
            "unit" => reading.unit = row.try_get(idx).map_err(StoreError::from)?,
            "time_period" => reading.time_period = row.try_get(idx).map_err(StoreError::from)?,
            "avg_value" => reading.avg_value = row.try_get(idx).map_err(StoreError::from)?,
            "min_value" => reading.min_value = row.try_get(idx).map_err(StoreError::from)?,
            "max_value" => reading.max_value = row.try_get(idx).map_err(StoreError::from)?,
            "data_points" => reading.data_points = row.try_get(idx).map_err(StoreError::from)?,
            _ => {}
        }
    }
    Ok(reading)
}
