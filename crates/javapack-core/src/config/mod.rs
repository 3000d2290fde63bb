//! Configuration system for staging
//!
//! YAML configuration with defaults that stage a current Tomcat line out of
//! the box. Every key can be omitted; a missing file is not an error at this
//! layer (the caller decides whether to fall back to defaults).

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{StagingConfig, TomcatConfig};
