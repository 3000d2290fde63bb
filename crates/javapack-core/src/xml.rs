//! On-disk XML document helpers
//!
//! The container configuration files are patched in place: parse the
//! document, mutate the tree, write it back to the same path. Attribute and
//! element names are part of the container's own configuration schema and
//! are reproduced verbatim by the callers.

use crate::errors::BuildpackError;
use std::fs::File;
use std::path::Path;
use xmltree::{Element, EmitterConfig};

/// Parse the document rooted at `path`
pub fn read_document(path: &Path) -> Result<Element, BuildpackError> {
    let file = File::open(path).map_err(|e| {
        BuildpackError::XmlError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    Element::parse(file).map_err(|e| {
        BuildpackError::XmlError(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Persist `document` back to `path`
pub fn write_document(path: &Path, document: &Element) -> Result<(), BuildpackError> {
    let file = File::create(path).map_err(|e| {
        BuildpackError::XmlError(format!("Failed to create {}: {}", path.display(), e))
    })?;
    let config = EmitterConfig::new().perform_indent(true);
    document.write_with_config(file, config).map_err(|e| {
        BuildpackError::XmlError(format!("Failed to write {}: {}", path.display(), e))
    })
}
