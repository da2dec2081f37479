use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::debug;

use crate::engines::Engines;
use crate::error::ConversionError;

/// Environment variable selecting the default promise engine
pub const ENGINE_ENV: &str = "PARADIGM_SHIFT_ENGINE";
/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "PARADIGM_SHIFT_LOG";

/// How promise-target wrappers run the source function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromiseEngine {
    /// Synchronously, inside the call to the wrapper
    #[default]
    Inline,
    /// On a Tokio task
    Tokio,
}

impl FromStr for PromiseEngine {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(PromiseEngine::Inline),
            "tokio" => Ok(PromiseEngine::Tokio),
            other => Err(ConversionError::Config(format!("unknown promise engine '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub promise_engine: PromiseEngine,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            promise_engine: PromiseEngine::Inline,
            log_filter: "paradigm_shift=info".to_string(),
        }
    }
}

impl ShiftConfig {
    /// Apply overrides from the process environment
    pub fn with_env(self) -> std::result::Result<Self, ConversionError> {
        self.with_overrides(std::env::var(ENGINE_ENV).ok(), std::env::var(LOG_ENV).ok())
    }

    pub fn with_overrides(
        mut self,
        engine: Option<String>,
        log_filter: Option<String>,
    ) -> std::result::Result<Self, ConversionError> {
        if let Some(engine) = engine {
            self.promise_engine = engine.parse()?;
        }
        if let Some(filter) = log_filter.filter(|f| !f.trim().is_empty()) {
            self.log_filter = filter;
        }
        Ok(self)
    }

    pub fn engines(&self) -> Engines {
        Engines::from_config(self)
    }
}

/// Loads and saves [`ShiftConfig`] as JSON, or YAML for `.yaml`/`.yml` paths
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
    }

    /// Load the config, writing the default one first if the file is missing.
    ///
    /// Read, parse and write failures are reported as [`ConversionError::Config`].
    pub async fn load(&self) -> std::result::Result<ShiftConfig, ConversionError> {
        self.read().await.map_err(config_error)
    }

    pub async fn save(&self, config: &ShiftConfig) -> std::result::Result<(), ConversionError> {
        self.write(config).await.map_err(config_error)
    }

    async fn read(&self) -> Result<ShiftConfig> {
        if !self.path.exists() {
            let default = ShiftConfig::default();
            self.write(&default).await?;
            return Ok(default);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read config at {:?}", self.path))?;
        let config: ShiftConfig = if self.is_yaml() {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config at {:?}", self.path))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config at {:?}", self.path))?
        };
        debug!("Loaded config from {:?}: {:?}", self.path, config);
        Ok(config)
    }

    async fn write(&self, config: &ShiftConfig) -> Result<()> {
        let content = if self.is_yaml() {
            serde_yaml::to_string(config)?
        } else {
            serde_json::to_string_pretty(config)?
        };
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write config at {:?}", self.path))?;
        Ok(())
    }
}

fn config_error(e: anyhow::Error) -> ConversionError {
    ConversionError::Config(format!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_gets_default() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("shift.json"));

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded, ShiftConfig::default());
        assert!(manager.path().exists());
    }

    #[tokio::test]
    async fn test_json_save_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("shift.json"));
        let config = ShiftConfig {
            promise_engine: PromiseEngine::Tokio,
            log_filter: "paradigm_shift=debug".to_string(),
        };

        manager.save(&config).await.unwrap();
        assert_eq!(manager.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_yaml_with_partial_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shift.yaml");
        tokio::fs::write(&path, "promise_engine: tokio\n").await.unwrap();

        let loaded = ConfigManager::new(path).load().await.unwrap();
        assert_eq!(loaded.promise_engine, PromiseEngine::Tokio);
        assert_eq!(loaded.log_filter, "paradigm_shift=info");
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shift.json");
        tokio::fs::write(&path, "{ \"promise_engine\": ").await.unwrap();

        let err = ConfigManager::new(path).load().await.unwrap_err();
        match err {
            ConversionError::Config(message) => assert!(message.contains("Invalid JSON config")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unwritable_path_is_a_config_error() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("missing").join("shift.yaml"));

        let err = manager.save(&ShiftConfig::default()).await.unwrap_err();
        assert!(matches!(err, ConversionError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ShiftConfig::default()
            .with_overrides(Some("Tokio".to_string()), Some("warn".to_string()))
            .unwrap();
        assert_eq!(config.promise_engine, PromiseEngine::Tokio);
        assert_eq!(config.log_filter, "warn");

        let untouched = ShiftConfig::default().with_overrides(None, Some("  ".to_string())).unwrap();
        assert_eq!(untouched, ShiftConfig::default());

        let err = ShiftConfig::default()
            .with_overrides(Some("threads".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, ConversionError::Config(_)));
    }
}
