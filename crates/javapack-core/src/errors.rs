//! Error types for staging failures
//!
//! Staging has no retry or rollback story: any failure in download, archive
//! expansion, XML rewriting, or file linking aborts the whole build, and the
//! caller is expected to discard the droplet. The variants below exist to
//! attribute the failure to a subsystem in the final report, not to drive
//! recovery logic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildpackError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Download failed: {0}")]
    DownloadError(String),
    #[error("Archive expansion failed: {0}")]
    ArchiveError(String),
    #[error("XML configuration error: {0}")]
    XmlError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for BuildpackError {
    fn from(err: std::io::Error) -> Self {
        BuildpackError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for BuildpackError {
    fn from(err: reqwest::Error) -> Self {
        BuildpackError::DownloadError(err.to_string())
    }
}
