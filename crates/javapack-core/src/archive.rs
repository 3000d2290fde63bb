//! Tarball expansion for distributions and bundled archives
//!
//! Both the container distribution and any archives bundled with the
//! application are expanded with the same recipe: gzip-compressed tar,
//! a configurable number of leading path components dropped, and an
//! optional top-level entry excluded.

use crate::errors::BuildpackError;
use flate2::read::GzDecoder;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Component, Path};
use tar::Archive;

/// Expand a gzip-compressed tarball into `target`.
///
/// `strip_components` leading path components are dropped from every entry;
/// entries fully consumed by the strip are skipped. When `exclude` is given,
/// entries whose first remaining component matches it are skipped as well.
pub fn expand_tarball(
    archive_path: &Path,
    target: &Path,
    strip_components: usize,
    exclude: Option<&str>,
) -> Result<(), BuildpackError> {
    std::fs::create_dir_all(target)?;

    let file = File::open(archive_path)?;
    let tar_gz = GzDecoder::new(file);
    let mut archive = Archive::new(tar_gz);

    let entries = archive.entries().map_err(|e| {
        BuildpackError::ArchiveError(format!(
            "Failed to read entries of {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| {
            BuildpackError::ArchiveError(format!(
                "Failed to read entry of {}: {}",
                archive_path.display(),
                e
            ))
        })?;

        let path = entry
            .path()
            .map_err(|e| {
                BuildpackError::ArchiveError(format!("Failed to read entry path: {}", e))
            })?
            .into_owned();

        let mut components = path.components();
        for _ in 0..strip_components {
            if components.next().is_none() {
                break;
            }
        }
        let stripped = components.as_path();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        // Entries must stay inside the target directory
        if stripped
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(BuildpackError::ArchiveError(format!(
                "Entry escapes target directory: {}",
                path.display()
            )));
        }

        if let Some(excluded) = exclude {
            if stripped.components().next() == Some(Component::Normal(OsStr::new(excluded))) {
                continue;
            }
        }

        let dest = target.join(stripped);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest).map_err(|e| {
            BuildpackError::ArchiveError(format!(
                "Failed to unpack {}: {}",
                dest.display(),
                e
            ))
        })?;
    }

    Ok(())
}
