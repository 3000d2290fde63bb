//! Configuration type definitions for staging

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default)]
    pub tomcat: TomcatConfig,
}

/// Settings for the Tomcat container component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomcatConfig {
    /// Distribution version; versions below 8.0.0 get the legacy treatment
    #[serde(default = "default_version")]
    pub version: String,
    /// Distribution artifact location
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Context path override; read by the component but not currently applied
    #[serde(default)]
    pub context_path: Option<String>,
}

impl Default for TomcatConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            uri: default_uri(),
            context_path: None,
        }
    }
}

fn default_version() -> String {
    "9.0.85".to_string()
}

fn default_uri() -> String {
    "https://archive.apache.org/dist/tomcat/tomcat-9/v9.0.85/bin/apache-tomcat-9.0.85.tar.gz"
        .to_string()
}
