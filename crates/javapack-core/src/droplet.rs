//! Droplet directory tree handles
//!
//! The droplet is the staged, deployable tree assembled for one application.
//! A component receives the droplet for the duration of one compile call and
//! assumes exclusive access; nothing here is safe for concurrent builds of
//! the same droplet.

use crate::errors::BuildpackError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Ordered collection of extra jars linked into the application at the end of staging
#[derive(Debug, Default)]
pub struct AdditionalLibraries {
    entries: Vec<PathBuf>,
}

impl AdditionalLibraries {
    pub fn push(&mut self, library: PathBuf) {
        self.entries.push(library);
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Symlink every entry into `dir`, in insertion order
    pub async fn link_to(&self, dir: &Path) -> Result<(), BuildpackError> {
        fs::create_dir_all(dir).await?;
        for library in &self.entries {
            let file_name = library.file_name().ok_or_else(|| {
                BuildpackError::IoError(format!("Library has no file name: {}", library.display()))
            })?;
            let link = dir.join(file_name);
            if fs::symlink_metadata(&link).await.is_ok() {
                fs::remove_file(&link).await?;
            }
            fs::symlink(library, &link).await?;
        }
        Ok(())
    }
}

/// The staged droplet directory tree
#[derive(Debug)]
pub struct Droplet {
    root: PathBuf,
    sandbox: PathBuf,
    pub additional_libraries: AdditionalLibraries,
}

impl Droplet {
    /// Create a droplet handle rooted at `root`; the component's sandbox
    /// lives under `.javapack/<component>`
    pub fn new(root: PathBuf, component: &str) -> Self {
        let sandbox = root.join(".javapack").join(component);
        Self {
            root,
            sandbox,
            additional_libraries: AdditionalLibraries::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sandbox(&self) -> &Path {
        &self.sandbox
    }

    /// Copy a resource overlay tree into the sandbox
    pub async fn copy_resources(&self, overlay: &Path) -> Result<(), BuildpackError> {
        if !overlay.exists() {
            log::debug!("No resource overlay at {}", overlay.display());
            return Ok(());
        }
        log::debug!(
            "Copying resources from {} into {}",
            overlay.display(),
            self.sandbox.display()
        );
        copy_recursive(overlay, &self.sandbox).await
    }
}

async fn copy_recursive(from: &Path, to: &Path) -> Result<(), BuildpackError> {
    fs::create_dir_all(to).await?;
    let mut entries = fs::read_dir(from).await?;
    while let Some(entry) = entries.next_entry().await? {
        let dest = to.join(entry.file_name());
        if entry.file_type().await?.is_dir() {
            Box::pin(copy_recursive(&entry.path(), &dest)).await?;
        } else {
            fs::copy(entry.path(), &dest).await?;
        }
    }
    Ok(())
}
