//! Sensor reading store
//!
//! The readings table is written by an external collector and consumed
//! read-only here. [`SensorReadingStore`] is the execution seam the
//! service calls with compiled SQL; [`ReadingRow`] captures the result
//! columns the guard allows, nothing else.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::error::StoreError;

pub mod sqlite;
#[cfg(test)]
pub mod testing;

pub use sqlite::SqliteReadingStore;

/// One result row. Raw queries fill the reading fields; aggregate and
/// grouped queries fill the summary fields. Absent columns stay `None`
/// and are skipped on serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadingRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_points: Option<i64>,
}

impl ReadingRow {
    /// A raw reading as the collector stores it.
    pub fn raw(timestamp: DateTime<Utc>, sensor_type: &str, value: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            sensor_type: Some(sensor_type.to_string()),
            value: Some(value),
            ..Self::default()
        }
    }

    /// An aggregate summary row.
    pub fn aggregate(avg: f64, min: f64, max: f64, data_points: i64) -> Self {
        Self {
            avg_value: Some(avg),
            min_value: Some(min),
            max_value: Some(max),
            data_points: Some(data_points),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Tag with a bucket identifier or comparison period label.
    pub fn with_period(mut self, label: &str) -> Self {
        self.time_period = Some(label.to_string());
        self
    }

    /// Whether any summary column is populated.
    pub fn is_aggregate(&self) -> bool {
        self.avg_value.is_some()
            || self.min_value.is_some()
            || self.max_value.is_some()
            || self.data_points.is_some()
    }
}

/// Execution seam over the fixed readings schema.
#[async_trait]
pub trait SensorReadingStore: Send + Sync {
    /// Run one validated SELECT with its bound parameters.
    async fn execute_select(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<ReadingRow>, StoreError>;
}
