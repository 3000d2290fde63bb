//! Distribution download and caching
//!
//! Artifacts are addressed by name, version, and source URI. The cache key
//! folds the URI through sha256 so two repositories offering the same
//! name/version pair cannot collide on disk.

use crate::errors::BuildpackError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Downloads distribution artifacts and keeps them on disk across builds
#[derive(Debug, Clone)]
pub struct DownloadCache {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl DownloadCache {
    /// Create a cache rooted at `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Result<Self, BuildpackError> {
        let client = reqwest::Client::builder()
            .user_agent("javapack/0.1.0")
            .build()
            .map_err(|e| {
                BuildpackError::DownloadError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { cache_dir, client })
    }

    /// Default cache location under the user cache directory
    pub fn default_dir() -> Result<PathBuf, BuildpackError> {
        let cache_dir = if let Some(cache_home) = dirs::cache_dir() {
            cache_home.join("javapack").join("dist")
        } else {
            dirs::home_dir()
                .ok_or_else(|| {
                    BuildpackError::ConfigError("Unable to determine home directory".to_string())
                })?
                .join(".cache")
                .join("javapack")
                .join("dist")
        };

        Ok(cache_dir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path where the artifact for this name/version/uri is stored
    pub fn artifact_path(&self, name: &str, version: &str, uri: &str) -> PathBuf {
        self.cache_dir.join(Self::cache_key(name, version, uri))
    }

    fn cache_key(name: &str, version: &str, uri: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(uri.as_bytes());
        let hash = hasher.finalize();
        let stem: String = format!("{}-{}-{:x}", name, version, hash)
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
            .collect();
        format!("{}.tar.gz", stem)
    }

    /// Return the artifact for name/version/uri, downloading it on a cache miss
    pub async fn get(&self, name: &str, version: &str, uri: &str) -> Result<PathBuf, BuildpackError> {
        let artifact = self.artifact_path(name, version, uri);
        if artifact.exists() {
            log::debug!("Using cached distribution: {}", artifact.display());
            return Ok(artifact);
        }

        fs::create_dir_all(&self.cache_dir).await?;

        log::info!("Downloading {} {} from {}", name, version, uri);
        let response = self.client.get(uri).send().await?;
        if !response.status().is_success() {
            return Err(BuildpackError::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                uri
            )));
        }
        let bytes = response.bytes().await?;

        // Write under a partial name, then move into the final cache location
        let partial = artifact.with_extension("part");
        fs::write(&partial, &bytes).await?;
        fs::rename(&partial, &artifact).await?;

        log::debug!("Distribution cached at: {}", artifact.display());
        Ok(artifact)
    }
}
