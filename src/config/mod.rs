//! Configuration management for AgriQuery
//!
//! Persistent engine settings with:
//! - JSON file-based storage
//! - Automatic backups with pruning
//! - Thread-safe access
//!
//! The completion API key is deliberately absent from the persisted
//! settings; it is supplied at runtime when the client is built.

mod storage;

pub use storage::{ConfigError, ConfigResult, ConfigStore, ConfigStoreConfig};
