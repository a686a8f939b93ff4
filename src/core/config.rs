//! Configuration module for AgriQuery
//!
//! Handles engine configuration including:
//! - Ontology behavior (synonym learning)
//! - Semantic descriptor defaults
//! - Conversation memory sizing
//! - Text-completion API settings
//! - Sensor store timeouts

use serde::{Deserialize, Serialize};

use super::types::Grouping;

/// Main engine configuration
///
/// Every section falls back to its default when absent, so a
/// hand-edited settings file only needs the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ontology behavior
    #[serde(default)]
    pub ontology: OntologyConfig,

    /// Semantic descriptor defaults
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Text-completion API settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Sensor-reading store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Ontology behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// Whether runtime synonym learning is accepted
    pub enable_synonym_learning: bool,

    /// Maximum accepted length for a learned synonym
    pub max_synonym_length: usize,
}

/// Semantic descriptor defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Grouping applied to multi-day ranges when the query has no
    /// explicit grouping word
    pub default_grouping: Grouping,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Turns retained per session
    pub depth: usize,
}

/// Text-completion API configuration.
///
/// The API key is not part of the serialized configuration; it is supplied
/// programmatically when the completion client is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Whether completion features are enabled
    pub enabled: bool,

    /// API endpoint URL
    pub endpoint: String,

    /// Model to use
    pub model: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum retries
    pub max_retries: u32,

    /// Requests per minute limit
    pub requests_per_minute: u32,

    /// Translation cache entries
    pub translation_cache_size: usize,

    /// Whether narrative text may be paraphrased by the model
    pub enable_paraphrase: bool,
}

/// Sensor-reading store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Query timeout in milliseconds
    pub query_timeout_ms: u64,

    /// Automatic retries after a timeout
    pub max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ontology: OntologyConfig::default(),
            semantic: SemanticConfig::default(),
            memory: MemoryConfig::default(),
            completion: CompletionConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            enable_synonym_learning: false,
            max_synonym_length: 64,
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            default_grouping: Grouping::ByDay,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { depth: 10 }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 5000,
            max_retries: 3,
            requests_per_minute: 60,
            translation_cache_size: 256,
            enable_paraphrase: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 3000,
            max_retries: 1,
        }
    }
}
