//! AgriQuery Core Module
//!
//! This module contains the core functionality for AgriQuery including:
//! - Configuration management
//! - Error types and handling
//! - Shared data types

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use error::{AgriQueryError, ErrorRecovery, RecoveryAction, Result};
pub use types::{Aggregation, Grouping, Intent, Language};
