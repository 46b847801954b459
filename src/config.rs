//! Studio configuration loaded from TOML
//!
//! ```toml
//! [storage]
//! root = "./mailsmith-data"
//! user = "local"
//!
//! [projects]
//! max_per_user = 25
//! max_name_length = 100
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::persistence::{FileProjectStore, ProjectLimits};

/// Errors that can occur when loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Where projects are stored and who owns them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per user
    pub root: PathBuf,
    /// User id projects are stored under
    pub user: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./mailsmith-data"),
            user: "local".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub storage: StorageConfig,
    pub projects: ProjectLimits,
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the storage root directory
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = root.into();
        self
    }

    /// Set the user id
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.storage.user = user.into();
        self
    }

    /// Set the project limits
    pub fn with_project_limits(mut self, limits: ProjectLimits) -> Self {
        self.projects = limits;
        self
    }

    /// A file store for the configured root and limits
    pub fn file_store(&self) -> FileProjectStore {
        FileProjectStore::new(&self.storage.root).with_limits(self.projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.storage.user, "local");
        assert_eq!(config.projects.max_per_user, 25);
        assert_eq!(config.projects.max_name_length, 100);
    }

    #[test]
    fn test_partial_toml() {
        let config = StudioConfig::from_toml_str(
            r#"
            [storage]
            user = "alice"

            [projects]
            max_per_user = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.user, "alice");
        assert_eq!(config.storage.root, PathBuf::from("./mailsmith-data"));
        assert_eq!(config.projects.max_per_user, 3);
        assert_eq!(config.projects.max_name_length, 100);
    }

    #[test]
    fn test_builders() {
        let config = StudioConfig::new()
            .with_storage_root("/srv/mail")
            .with_user("bob");
        assert_eq!(config.file_store().root(), Path::new("/srv/mail"));
        assert_eq!(config.storage.user, "bob");
    }

    #[test]
    fn test_invalid_toml() {
        let result = StudioConfig::from_toml_str("[storage\nuser = 1");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
