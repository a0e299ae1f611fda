//! Configuration management with file persistence

use crate::Error;
use crate::storage::{DatabaseConfig, default_database_path};
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `get`/`set`, in listing order
pub const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "projects.active_only",
];

/// Atelier configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub projects: ProjectSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; empty means the platform default
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_connections: crate::storage::database::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Hide finished projects in listings unless asked otherwise
    pub active_only: bool,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("ATELIER_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("atelier")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(
                Error::ConfigError("database.max_connections must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database.path.clone()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "projects.active_only" => Ok(self.projects.active_only.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                self.database.path = value.trim().to_string();
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }
            "projects.active_only" => {
                self.projects.active_only = parse_bool(value)
                    .ok_or_else(|| anyhow!("Invalid active_only value: {} (use true or false)", value))?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }

    /// Database file to open; an explicit override beats the configured path
    pub fn database_path(&self, override_path: Option<&Path>) -> PathBuf {
        match override_path {
            Some(path) => path.to_path_buf(),
            None if !self.database.path.is_empty() => PathBuf::from(&self.database.path),
            None => default_database_path(),
        }
    }

    /// Storage settings derived from this configuration
    pub fn database_config(&self, override_path: Option<&Path>) -> DatabaseConfig {
        DatabaseConfig::with_path(self.database_path(override_path))
            .max_connections(self.database.max_connections)
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    Error::ConfigError(format!(
        "Unknown configuration key: {}. Use `atelier config list` to see available keys.",
        key
    ))
    .into()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_set() {
        let mut config = Config::default();
        assert_eq!(config.get("database.max_connections").unwrap(), "5");

        config.set("projects.active_only", "yes").unwrap();
        assert!(config.projects.active_only);
        config.set("database.max_connections", "2").unwrap();
        assert_eq!(config.database.max_connections, 2);

        assert!(config.set("database.max_connections", "0").is_err());
        assert!(config.set("projects.active_only", "maybe").is_err());
        let err = config.get("llm.model").unwrap_err();
        assert_eq!(err.downcast_ref::<Error>().map(Error::code), Some("E600"));
    }

    #[test]
    fn test_list_covers_every_key() {
        let listed = Config::default().list().unwrap();
        let keys: Vec<&str> = listed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, KEYS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut config = Config::default();
        config.set("database.path", "/srv/atelier/projects.db").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.database.path, "/srv/atelier/projects.db");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[projects]\nactive_only = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.projects.active_only);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_database_path_precedence() {
        let mut config = Config::default();
        assert_eq!(config.database_path(None), default_database_path());

        config.database.path = "/data/a.db".to_string();
        assert_eq!(config.database_path(None), PathBuf::from("/data/a.db"));
        assert_eq!(
            config.database_path(Some(Path::new("/tmp/b.db"))),
            PathBuf::from("/tmp/b.db")
        );
        assert_eq!(config.database_config(None).max_connections, 5);
    }
}
