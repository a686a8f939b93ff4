//! AgriQuery - bilingual natural-language queries over sensor telemetry
//!
//! This crate turns Persian and English questions about time-series
//! agricultural sensor readings into answers:
//! - Language detection with degradable Persian-to-English translation
//! - Intent routing with unsafe-request rejection
//! - Canonical semantic descriptors built over a bilingual ontology
//! - A guarded, parameterized SQL compiler for the readings table
//! - Metrics, chart series, and localized narrative post-processing
//! - Alert-condition extraction (sensor, operator, threshold)
//! - Per-session conversation memory for follow-up questions

pub mod core;
pub mod logging;
pub mod config;
pub mod db;
pub mod ontology;
pub mod timerange;
pub mod language;
pub mod llm;
pub mod memory;
pub mod intent;
pub mod semantic;
pub mod query;
pub mod store;
pub mod postprocess;
pub mod alert;
pub mod service;

// Re-export commonly used items
pub use crate::core::config::AppConfig;
pub use crate::core::error::{AgriQueryError, Result};
pub use crate::core::types::{Intent, Language};
pub use crate::alert::{AlertSpec, ComparisonOperator};
pub use crate::db::{create_database_pool, ensure_schema, DatabaseConfig};
pub use crate::llm::TextCompletion;
pub use crate::memory::ConversationMemory;
pub use crate::ontology::Ontology;
pub use crate::service::{QueryResult, QueryService};
pub use crate::store::{ReadingRow, SensorReadingStore, SqliteReadingStore};
