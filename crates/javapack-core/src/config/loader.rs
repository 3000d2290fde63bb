//! Configuration loader for YAML files

use crate::config::types::StagingConfig;
use crate::errors::BuildpackError;
use std::path::Path;
use tokio::fs;

/// Loads staging configuration from YAML sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<StagingConfig, BuildpackError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            BuildpackError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_str(content: &str) -> Result<StagingConfig, BuildpackError> {
        serde_yaml::from_str(content)
            .map_err(|e| BuildpackError::ConfigError(format!("Failed to parse configuration: {}", e)))
    }
}
