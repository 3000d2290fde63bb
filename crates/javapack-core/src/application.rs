//! Uploaded application handle

use crate::errors::BuildpackError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The set of files the end user uploaded
#[derive(Debug, Clone)]
pub struct Application {
    root: PathBuf,
}

impl Application {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level entries of the uploaded application, sorted by path
    pub async fn children(&self) -> Result<Vec<PathBuf>, BuildpackError> {
        let mut children = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            children.push(entry.path());
        }
        children.sort();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn children_lists_top_level_entries_sorted() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("index.jsp"), b"<html/>")
            .await
            .unwrap();
        fs::create_dir(temp_dir.path().join("WEB-INF")).await.unwrap();
        fs::write(temp_dir.path().join("WEB-INF/web.xml"), b"<web-app/>")
            .await
            .unwrap();

        let application = Application::new(temp_dir.path().to_path_buf());
        let children = application.children().await.unwrap();

        assert_eq!(
            children,
            vec![
                temp_dir.path().join("WEB-INF"),
                temp_dir.path().join("index.jsp"),
            ]
        );
    }
}
