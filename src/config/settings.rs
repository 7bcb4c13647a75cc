//! Configuration settings for VidGenie.

use crate::error::{Result, VidGenieError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Embedding model settings.
///
/// The model must be the one the collection was ingested with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Sentence-embedding model name.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Directory where downloaded model files are cached.
    pub cache_dir: String,
    /// Show a progress bar while the model downloads.
    pub show_download_progress: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            cache_dir: "~/.vidgenie/models".to_string(),
            show_download_progress: true,
        }
    }
}

/// Vector store backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Persistent SQLite collection file (default).
    #[default]
    Sqlite,
    /// In-process collection loaded from a JSON snapshot.
    Memory,
}

impl std::fmt::Display for VectorStoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreProvider::Sqlite => write!(f, "sqlite"),
            VectorStoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: VectorStoreProvider,
    /// Path to the SQLite collection file (for sqlite provider).
    pub sqlite_path: String,
    /// Path to a JSON snapshot (for memory provider). Empty collection if unset.
    pub snapshot_path: Option<String>,
    /// Name of the collection holding transcript chunks.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Sqlite,
            sqlite_path: "~/.vidgenie/vectors.db".to_string(),
            snapshot_path: None,
            collection: "video_metadata".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of results returned when the caller does not ask for a count.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: crate::retrieval::DEFAULT_TOP_K,
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidGenieError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Return a copy of these settings with a dotted key (e.g. `retrieval.top_k`) set.
    ///
    /// The value is parsed as a TOML literal when possible (numbers, booleans),
    /// otherwise taken as a string. The result is validated by deserializing it
    /// back into `Settings`.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let (section, field) = key.split_once('.').ok_or_else(|| {
            VidGenieError::Config(format!("Key must be of the form section.field: {}", key))
        })?;

        let mut root = toml::Value::try_from(self)
            .map_err(|e| VidGenieError::Config(e.to_string()))?;

        let table = root
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| VidGenieError::Config(format!("Unknown config section: {}", section)))?;

        if !table.contains_key(field) && !is_optional_field(section, field) {
            return Err(VidGenieError::Config(format!("Unknown config key: {}", key)));
        }

        table.insert(field.to_string(), parse_value(value));

        root.try_into()
            .map_err(|e: toml::de::Error| VidGenieError::Config(format!("Invalid value for {}: {}", key, e)))
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidgenie")
            .join("config.toml")
    }

    /// Resolve the config file in use: the `--config` override, else the default.
    pub fn config_path(override_path: Option<&str>) -> PathBuf {
        override_path
            .map(Self::expand_path)
            .unwrap_or_else(Self::default_config_path)
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded model cache directory.
    pub fn model_cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.embedding.cache_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded snapshot path, if one is configured.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.vector_store
            .snapshot_path
            .as_deref()
            .map(Self::expand_path)
    }
}

/// `None` options are omitted when serialized, so they are absent from the table.
fn is_optional_field(section: &str, field: &str) -> bool {
    matches!((section, field), ("vector_store", "snapshot_path"))
}

fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ingestion_model() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(settings.embedding.dimensions, 384);
        assert_eq!(settings.vector_store.collection, "video_metadata");
        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Sqlite);
        assert_eq!(settings.retrieval.top_k, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [vector_store]
            provider = "memory"
            snapshot_path = "/tmp/chunks.json"

            [retrieval]
            top_k = 7
            "#,
        )
        .unwrap();

        assert_eq!(settings.vector_store.provider, VectorStoreProvider::Memory);
        assert_eq!(settings.snapshot_path(), Some(PathBuf::from("/tmp/chunks.json")));
        assert_eq!(settings.vector_store.collection, "video_metadata");
        assert_eq!(settings.retrieval.top_k, 7);
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_config_path_override() {
        assert_eq!(
            Settings::config_path(Some("/etc/vidgenie.toml")),
            PathBuf::from("/etc/vidgenie.toml")
        );
        assert_eq!(Settings::config_path(None), Settings::default_config_path());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 8080;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.top_k, 3);
    }

    #[test]
    fn test_with_value() {
        let settings = Settings::default();

        let updated = settings.with_value("retrieval.top_k", "5").unwrap();
        assert_eq!(updated.retrieval.top_k, 5);

        let updated = settings.with_value("vector_store.provider", "memory").unwrap();
        assert_eq!(updated.vector_store.provider, VectorStoreProvider::Memory);

        let updated = settings
            .with_value("vector_store.snapshot_path", "/data/chunks.json")
            .unwrap();
        assert_eq!(updated.vector_store.snapshot_path.as_deref(), Some("/data/chunks.json"));

        assert!(settings.with_value("retrieval.top_k", "many").is_err());
        assert!(settings.with_value("retrieval.unknown", "1").is_err());
        assert!(settings.with_value("top_k", "1").is_err());
    }
}
