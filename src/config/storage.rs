//! Configuration storage implementation
//!
//! JSON file storage for [`AppConfig`] with:
//! - Atomic writes using temp file + rename
//! - Automatic backup before writes
//! - Thread-safe access via RwLock
//! - Validation before anything is persisted

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::config::{AppConfig, CompletionConfig};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration store settings
#[derive(Debug, Clone)]
pub struct ConfigStoreConfig {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Path to backup directory
    pub backup_dir: PathBuf,
    /// Maximum number of backups to keep
    pub max_backups: usize,
    /// Whether to create default config if not exists
    pub create_default: bool,
}

impl Default for ConfigStoreConfig {
    fn default() -> Self {
        let base = directories::ProjectDirs::from("com", "agriquery", "AgriQuery")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            config_path: base.join("config.json"),
            backup_dir: base.join("backups"),
            max_backups: 5,
            create_default: true,
        }
    }
}

/// Reject settings that would wedge the engine at runtime.
fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.memory.depth == 0 {
        return Err(ConfigError::Invalid(
            "memory.depth must be at least 1".to_string(),
        ));
    }
    if config.completion.timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "completion.timeout_ms must be positive".to_string(),
        ));
    }
    if config.completion.translation_cache_size == 0 {
        return Err(ConfigError::Invalid(
            "completion.translation_cache_size must be at least 1".to_string(),
        ));
    }
    if config.store.query_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "store.query_timeout_ms must be positive".to_string(),
        ));
    }
    if config.ontology.max_synonym_length == 0 {
        return Err(ConfigError::Invalid(
            "ontology.max_synonym_length must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Configuration store with thread-safe access
pub struct ConfigStore {
    config: Arc<RwLock<AppConfig>>,
    settings: ConfigStoreConfig,
}

impl ConfigStore {
    /// Create a new configuration store
    pub async fn new(settings: ConfigStoreConfig) -> ConfigResult<Self> {
        // Ensure directories exist
        if let Some(parent) = settings.config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::create_dir_all(&settings.backup_dir).await?;

        // Load or create config
        let config = if settings.config_path.exists() {
            Self::load_from_file(&settings.config_path).await?
        } else if settings.create_default {
            let default_config = AppConfig::default();
            Self::save_to_file(&settings.config_path, &default_config).await?;
            default_config
        } else {
            return Err(ConfigError::NotFound(settings.config_path.clone()));
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            settings,
        })
    }

    /// Load and validate configuration from file
    async fn load_from_file(path: &Path) -> ConfigResult<AppConfig> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = serde_json::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file with atomic write
    async fn save_to_file(path: &Path, config: &AppConfig) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(config)?;

        // Write to temp file first
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &content).await?;

        // Atomic rename
        tokio::fs::rename(&temp_path, path).await?;

        Ok(())
    }

    /// Get current configuration (read-only)
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Update configuration.
    ///
    /// The updater runs against a scratch copy; a change that fails
    /// validation leaves both the in-memory settings and the file
    /// untouched.
    pub async fn update<F>(&self, updater: F) -> ConfigResult<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().await;

        let mut updated = config.clone();
        updater(&mut updated);
        validate(&updated)?;

        // Create backup before modifying
        self.create_backup(&config).await?;

        // Save to file, then commit in memory
        Self::save_to_file(&self.settings.config_path, &updated).await?;
        *config = updated.clone();

        Ok(updated)
    }

    /// Set entire configuration
    pub async fn set(&self, new_config: AppConfig) -> ConfigResult<()> {
        validate(&new_config)?;

        let mut config = self.config.write().await;

        // Create backup before modifying
        self.create_backup(&config).await?;

        Self::save_to_file(&self.settings.config_path, &new_config).await?;
        *config = new_config;

        Ok(())
    }

    /// Create a backup of current configuration
    async fn create_backup(&self, config: &AppConfig) -> ConfigResult<()> {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_name = format!("config_backup_{}.json", timestamp);
        let backup_path = self.settings.backup_dir.join(backup_name);

        Self::save_to_file(&backup_path, config).await?;

        // Clean up old backups
        self.cleanup_old_backups().await?;

        Ok(())
    }

    /// Remove old backups exceeding max_backups limit
    async fn cleanup_old_backups(&self) -> ConfigResult<()> {
        let mut backups = self.list_backups().await?;

        // Sorted by name, which embeds the timestamp
        while backups.len() > self.settings.max_backups {
            let oldest = backups.remove(0);
            tokio::fs::remove_file(&oldest).await?;
        }

        Ok(())
    }

    /// Export configuration to a file
    pub async fn export(&self, path: &Path) -> ConfigResult<()> {
        let config = self.config.read().await;
        Self::save_to_file(path, &config).await
    }

    /// Import configuration from a file
    pub async fn import(&self, path: &Path) -> ConfigResult<AppConfig> {
        let imported = Self::load_from_file(path).await?;
        self.set(imported.clone()).await?;
        Ok(imported)
    }

    /// Reset to default configuration
    pub async fn reset(&self) -> ConfigResult<AppConfig> {
        let default_config = AppConfig::default();
        self.set(default_config.clone()).await?;
        Ok(default_config)
    }

    /// Get configuration file path
    pub fn config_path(&self) -> &Path {
        &self.settings.config_path
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.settings.backup_dir
    }

    /// List available backups, oldest first
    pub async fn list_backups(&self) -> ConfigResult<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.settings.backup_dir).await?;
        let mut backups: Vec<PathBuf> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                backups.push(path);
            }
        }

        backups.sort();
        Ok(backups)
    }

    /// Restore from a backup file
    pub async fn restore_backup(&self, backup_path: &Path) -> ConfigResult<AppConfig> {
        self.import(backup_path).await
    }
}

// Convenience methods for specific config sections
impl ConfigStore {
    /// Replace the completion API settings
    pub async fn set_completion_config(&self, completion: CompletionConfig) -> ConfigResult<AppConfig> {
        self.update(|config| {
            config.completion = completion;
        })
        .await
    }

    /// Enable or disable the completion backend.
    ///
    /// Paraphrasing rides on the backend, so disabling it also turns
    /// the paraphrase flag off.
    pub async fn set_completion_enabled(&self, enabled: bool) -> ConfigResult<AppConfig> {
        self.update(|config| {
            config.completion.enabled = enabled;
            if !enabled {
                config.completion.enable_paraphrase = false;
            }
        })
        .await
    }

    /// Enable or disable narrative paraphrasing
    pub async fn set_paraphrase_enabled(&self, enabled: bool) -> ConfigResult<AppConfig> {
        self.update(|config| {
            config.completion.enable_paraphrase = enabled;
        })
        .await
    }

    /// Set how many turns each session retains
    pub async fn set_memory_depth(&self, depth: usize) -> ConfigResult<AppConfig> {
        self.update(|config| {
            config.memory.depth = depth;
        })
        .await
    }

    /// Enable or disable runtime synonym learning
    pub async fn set_synonym_learning(&self, enabled: bool) -> ConfigResult<AppConfig> {
        self.update(|config| {
            config.ontology.enable_synonym_learning = enabled;
        })
        .await
    }
}
