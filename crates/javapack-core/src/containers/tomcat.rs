//! Tomcat container component
//!
//! Downloads a Tomcat distribution into the droplet sandbox, patches its
//! configuration so the symlinked application is served, expands WAR files
//! bundled with the application, and links the application's files into the
//! webapps tree. The whole flow is sequential; a failure at any step aborts
//! the build with the underlying error.

use crate::application::Application;
use crate::archive::expand_tarball;
use crate::config::TomcatConfig;
use crate::download::DownloadCache;
use crate::droplet::Droplet;
use crate::errors::BuildpackError;
use crate::lifecycle::Component;
use crate::xml::{read_document, write_document};
use async_trait::async_trait;
use semver::Version;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::fs;
use xmltree::{Element, XMLNode};

const COMPONENT_NAME: &str = "tomcat";

/// Listener required for JSP compilation on Tomcat 7 lines
const JASPER_LISTENER_CLASS: &str = "org.apache.catalina.core.JasperListener";

const ALLOW_LINKING_ATTRIBUTE: &str = "allowLinking";

/// Stages a Tomcat distribution and wires the application into it
pub struct TomcatInstance {
    droplet: Droplet,
    application: Application,
    cache: DownloadCache,
    resources: Option<PathBuf>,
    version: Version,
    uri: String,
    /// Read from configuration; the webapps root is currently used verbatim
    #[allow(dead_code)]
    context_path: Option<String>,
}

impl TomcatInstance {
    pub fn new(
        droplet: Droplet,
        application: Application,
        configuration: &TomcatConfig,
        cache: DownloadCache,
    ) -> Result<Self, BuildpackError> {
        let version = Version::parse(&configuration.version).map_err(|e| {
            BuildpackError::ConfigError(format!(
                "Invalid Tomcat version '{}': {}",
                configuration.version, e
            ))
        })?;

        Ok(Self {
            droplet,
            application,
            cache,
            resources: None,
            version,
            uri: configuration.uri.clone(),
            context_path: configuration.context_path.clone(),
        })
    }

    /// Overlay directory copied into the sandbox after expansion
    pub fn with_resources(mut self, resources: PathBuf) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn droplet(&self) -> &Droplet {
        &self.droplet
    }

    /// Tomcat 7 lines predate the Resources element and need the legacy knobs
    fn legacy(&self) -> bool {
        self.version < Version::new(8, 0, 0)
    }

    fn webapps(&self) -> PathBuf {
        self.droplet.sandbox().join("webapps")
    }

    fn context_xml(&self) -> PathBuf {
        self.droplet.sandbox().join("conf").join("context.xml")
    }

    fn server_xml(&self) -> PathBuf {
        self.droplet.sandbox().join("conf").join("server.xml")
    }

    async fn install(&self) -> Result<(), BuildpackError> {
        let archive = self
            .cache
            .get(COMPONENT_NAME, &self.version.to_string(), &self.uri)
            .await?;
        log::info!(
            "Expanding Tomcat {} into {}",
            self.version,
            self.droplet.sandbox().display()
        );
        expand_tarball(&archive, self.droplet.sandbox(), 1, Some("webapps"))?;
        Ok(())
    }

    /// Enable symlink following so the linked application is served
    fn configure_linking(&self) -> Result<(), BuildpackError> {
        let path = self.context_xml();
        let mut document = read_document(&path)?;
        if document.name != "Context" {
            return Err(BuildpackError::XmlError(format!(
                "Expected root <Context> element in {}",
                path.display()
            )));
        }

        if self.legacy() {
            document
                .attributes
                .insert(ALLOW_LINKING_ATTRIBUTE.to_string(), "true".to_string());
        } else {
            let mut resources = Element::new("Resources");
            resources
                .attributes
                .insert(ALLOW_LINKING_ATTRIBUTE.to_string(), "true".to_string());
            document.children.push(XMLNode::Element(resources));
        }

        write_document(&path, &document)
    }

    /// Register the Jasper listener ahead of the service on legacy versions
    fn configure_jasper(&self) -> Result<(), BuildpackError> {
        if !self.legacy() {
            return Ok(());
        }

        let path = self.server_xml();
        let mut document = read_document(&path)?;
        if document.name != "Server" {
            return Err(BuildpackError::XmlError(format!(
                "Expected root <Server> element in {}",
                path.display()
            )));
        }

        let service_index = document
            .children
            .iter()
            .position(|node| matches!(node, XMLNode::Element(element) if element.name == "Service"))
            .ok_or_else(|| {
                BuildpackError::XmlError(format!("No <Service> element in {}", path.display()))
            })?;

        let mut listener = Element::new("Listener");
        listener
            .attributes
            .insert("className".to_string(), JASPER_LISTENER_CLASS.to_string());
        document
            .children
            .insert(service_index, XMLNode::Element(listener));

        write_document(&path, &document)
    }

    /// Bundled WARs; the `.war` extension match is case-sensitive
    async fn wars(&self) -> Result<BTreeSet<PathBuf>, BuildpackError> {
        let mut wars = BTreeSet::new();
        for child in self.application.children().await? {
            if child.extension().map(|extension| extension == "war").unwrap_or(false) {
                wars.insert(child);
            }
        }
        Ok(wars)
    }

    /// Expand bundled WARs into the shared webapps directory.
    ///
    /// A directory named after each WAR is created under the droplet root,
    /// but the contents land in the shared webapps directory with the same
    /// recipe as the distribution itself.
    async fn expand_wars(&self) -> Result<(), BuildpackError> {
        for war in self.wars().await? {
            let stem = war.file_stem().ok_or_else(|| {
                BuildpackError::IoError(format!("WAR has no base name: {}", war.display()))
            })?;
            fs::create_dir_all(self.droplet.root().join(stem)).await?;
            log::info!("Expanding {}", war.display());
            expand_tarball(&war, &self.webapps(), 1, Some("webapps"))?;
        }
        Ok(())
    }

    /// Link the application's top level into the webapps root
    async fn link_application(&self) -> Result<(), BuildpackError> {
        let webapps = self.webapps();
        fs::create_dir_all(&webapps).await?;
        for child in self.application.children().await? {
            let file_name = child.file_name().ok_or_else(|| {
                BuildpackError::IoError(format!("Entry has no file name: {}", child.display()))
            })?;
            let link = webapps.join(file_name);
            if fs::symlink_metadata(&link).await.is_ok() {
                fs::remove_file(&link).await?;
            }
            fs::symlink(&child, &link).await?;
        }
        Ok(())
    }

    async fn collect_additional_libraries(&mut self) -> Result<(), BuildpackError> {
        let jdbc_jar = self.droplet.sandbox().join("lib").join("tomcat-jdbc.jar");
        if fs::metadata(&jdbc_jar).await.is_ok() {
            log::debug!("Adding Tomcat JDBC datasource jar: {}", jdbc_jar.display());
            self.droplet.additional_libraries.push(jdbc_jar);
        }
        Ok(())
    }

    async fn link_additional_libraries(&self) -> Result<(), BuildpackError> {
        let web_inf_lib = self.droplet.root().join("WEB-INF").join("lib");
        self.droplet.additional_libraries.link_to(&web_inf_lib).await
    }
}

#[async_trait]
impl Component for TomcatInstance {
    fn name(&self) -> &'static str {
        COMPONENT_NAME
    }

    fn supports(&self) -> bool {
        true
    }

    async fn compile(&mut self) -> Result<(), BuildpackError> {
        self.install().await?;
        if let Some(resources) = &self.resources {
            self.droplet.copy_resources(resources).await?;
        }
        self.configure_linking()?;
        self.configure_jasper()?;
        self.expand_wars().await?;
        self.link_application().await?;
        self.collect_additional_libraries().await?;
        self.link_additional_libraries().await?;
        Ok(())
    }

    fn release(&mut self) -> Result<Option<String>, BuildpackError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::path::Path;
    use tempfile::tempdir;

    const URI: &str = "https://repository.example.com/tomcat/tomcat.tar.gz";

    fn build_tarball(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, contents.as_bytes())
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }

    fn instance(temp: &Path, version: &str) -> TomcatInstance {
        let droplet = Droplet::new(temp.join("droplet"), "tomcat");
        let application = Application::new(temp.join("app"));
        let cache = DownloadCache::new(temp.join("cache")).unwrap();
        let configuration = TomcatConfig {
            version: version.to_string(),
            uri: URI.to_string(),
            context_path: None,
        };
        TomcatInstance::new(droplet, application, &configuration, cache).unwrap()
    }

    /// Seed the download cache with a distribution tarball so compile runs offline
    fn seed_distribution(tomcat: &TomcatInstance, with_jdbc_jar: bool) {
        let mut entries = vec![
            ("apache-tomcat/conf/context.xml", "<Context/>"),
            (
                "apache-tomcat/conf/server.xml",
                "<Server port=\"-1\"><Service name=\"Catalina\"/></Server>",
            ),
            ("apache-tomcat/bin/catalina.sh", "#!/bin/sh"),
            ("apache-tomcat/webapps/docs/index.html", "<html/>"),
        ];
        if with_jdbc_jar {
            entries.push(("apache-tomcat/lib/tomcat-jdbc.jar", "jar bytes"));
        }

        let artifact = tomcat
            .cache
            .artifact_path(COMPONENT_NAME, &tomcat.version.to_string(), &tomcat.uri);
        std::fs::create_dir_all(tomcat.cache.cache_dir()).unwrap();
        build_tarball(&artifact, &entries);
    }

    fn write_context_xml(tomcat: &TomcatInstance, content: &str) {
        let path = tomcat.context_xml();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn write_server_xml(tomcat: &TomcatInstance, content: &str) {
        let path = tomcat.server_xml();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn versions_below_eight_are_legacy() {
        let temp_dir = tempdir().unwrap();

        assert!(instance(temp_dir.path(), "7.0.47").legacy());
        assert!(!instance(temp_dir.path(), "8.0.0").legacy());
        assert!(!instance(temp_dir.path(), "8.5.32").legacy());
        assert!(!instance(temp_dir.path(), "9.0.85").legacy());
    }

    #[test]
    fn rejects_versions_that_are_not_three_part() {
        let temp_dir = tempdir().unwrap();
        let droplet = Droplet::new(temp_dir.path().join("droplet"), "tomcat");
        let application = Application::new(temp_dir.path().join("app"));
        let cache = DownloadCache::new(temp_dir.path().join("cache")).unwrap();
        let configuration = TomcatConfig {
            version: "8.0".to_string(),
            uri: URI.to_string(),
            context_path: None,
        };

        let result = TomcatInstance::new(droplet, application, &configuration, cache);

        assert!(matches!(result, Err(BuildpackError::ConfigError(_))));
    }

    #[test]
    fn supports_claims_every_application() {
        let temp_dir = tempdir().unwrap();
        assert!(instance(temp_dir.path(), "9.0.85").supports());
        assert!(instance(temp_dir.path(), "7.0.47").supports());
    }

    #[test]
    fn release_contributes_nothing() {
        let temp_dir = tempdir().unwrap();
        let mut tomcat = instance(temp_dir.path(), "9.0.85");

        assert_eq!(tomcat.release().unwrap(), None);
    }

    #[tokio::test]
    async fn war_selection_is_case_sensitive() {
        let temp_dir = tempdir().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).await.unwrap();
        fs::write(app.join("app.war"), b"war").await.unwrap();
        fs::write(app.join("readme.txt"), b"text").await.unwrap();
        fs::write(app.join("lib.WAR"), b"war").await.unwrap();

        let tomcat = instance(temp_dir.path(), "9.0.85");
        let wars = tomcat.wars().await.unwrap();

        assert_eq!(wars.len(), 1);
        assert!(wars.contains(&app.join("app.war")));
    }

    #[tokio::test]
    async fn legacy_linking_sets_the_attribute_on_context() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "7.0.47");
        write_context_xml(&tomcat, "<Context/>");

        tomcat.configure_linking().unwrap();

        let document = read_document(&tomcat.context_xml()).unwrap();
        assert_eq!(
            document.attributes.get(ALLOW_LINKING_ATTRIBUTE),
            Some(&"true".to_string())
        );
        assert!(document.get_child("Resources").is_none());
    }

    #[tokio::test]
    async fn modern_linking_adds_a_resources_child() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "8.0.33");
        write_context_xml(&tomcat, "<Context/>");

        tomcat.configure_linking().unwrap();

        let document = read_document(&tomcat.context_xml()).unwrap();
        assert_eq!(document.attributes.get(ALLOW_LINKING_ATTRIBUTE), None);
        let resources = document.get_child("Resources").unwrap();
        assert_eq!(
            resources.attributes.get(ALLOW_LINKING_ATTRIBUTE),
            Some(&"true".to_string())
        );
    }

    #[tokio::test]
    async fn linking_requires_a_context_root() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "9.0.85");
        write_context_xml(&tomcat, "<Host/>");

        let result = tomcat.configure_linking();

        assert!(matches!(result, Err(BuildpackError::XmlError(_))));
    }

    #[tokio::test]
    async fn jasper_listener_lands_immediately_before_the_service() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "7.0.47");
        write_server_xml(
            &tomcat,
            "<Server port=\"-1\">\
             <Listener className=\"org.apache.catalina.core.AprLifecycleListener\"/>\
             <GlobalNamingResources/>\
             <Service name=\"Catalina\"/>\
             </Server>",
        );

        tomcat.configure_jasper().unwrap();

        let document = read_document(&tomcat.server_xml()).unwrap();
        let elements: Vec<&Element> = document
            .children
            .iter()
            .filter_map(|node| match node {
                XMLNode::Element(element) => Some(element),
                _ => None,
            })
            .collect();

        let jasper_positions: Vec<usize> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| {
                element.name == "Listener"
                    && element.attributes.get("className")
                        == Some(&JASPER_LISTENER_CLASS.to_string())
            })
            .map(|(index, _)| index)
            .collect();
        let service_position = elements
            .iter()
            .position(|element| element.name == "Service")
            .unwrap();

        assert_eq!(jasper_positions.len(), 1);
        assert_eq!(jasper_positions[0] + 1, service_position);
    }

    #[tokio::test]
    async fn jasper_requires_a_service_element() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "7.0.47");
        write_server_xml(&tomcat, "<Server port=\"-1\"/>");

        let result = tomcat.configure_jasper();

        assert!(matches!(result, Err(BuildpackError::XmlError(_))));
    }

    #[tokio::test]
    async fn jasper_leaves_modern_server_xml_untouched() {
        let temp_dir = tempdir().unwrap();
        let tomcat = instance(temp_dir.path(), "8.0.33");
        write_server_xml(&tomcat, "<Server port=\"-1\"><Service name=\"Catalina\"/></Server>");
        let before = std::fs::read(tomcat.server_xml()).unwrap();

        tomcat.configure_jasper().unwrap();

        assert_eq!(std::fs::read(tomcat.server_xml()).unwrap(), before);
    }

    #[tokio::test]
    async fn compile_stages_a_modern_distribution() {
        let temp_dir = tempdir().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).await.unwrap();
        fs::write(app.join("index.jsp"), b"<html/>").await.unwrap();
        fs::write(app.join("readme.txt"), b"text").await.unwrap();
        build_tarball(
            &app.join("app.war"),
            &[("exploded/WEB-INF/web.xml", "<web-app/>")],
        );

        let mut tomcat = instance(temp_dir.path(), "9.0.85");
        seed_distribution(&tomcat, true);

        tomcat.compile().await.unwrap();

        let sandbox = tomcat.droplet().sandbox();
        // Distribution expanded with the leading component stripped and webapps excluded
        assert!(sandbox.join("bin/catalina.sh").exists());
        assert!(!sandbox.join("webapps/docs").exists());

        // Modern linking form
        let context = read_document(&sandbox.join("conf/context.xml")).unwrap();
        assert!(context.get_child("Resources").is_some());
        assert_eq!(context.attributes.get(ALLOW_LINKING_ATTRIBUTE), None);

        // No Jasper listener on modern versions
        let server = read_document(&sandbox.join("conf/server.xml")).unwrap();
        assert!(!server.children.iter().any(|node| matches!(
            node,
            XMLNode::Element(element) if element.name == "Listener"
        )));

        // WAR expanded into the shared webapps directory, per-WAR directory created
        assert!(sandbox.join("webapps/WEB-INF/web.xml").exists());
        assert!(tomcat.droplet().root().join("app").is_dir());

        // Application top level linked into webapps
        for name in ["index.jsp", "readme.txt", "app.war"] {
            let link = sandbox.join("webapps").join(name);
            assert!(fs::symlink_metadata(&link).await.unwrap().is_symlink());
        }

        // JDBC jar collected and linked into WEB-INF/lib
        assert_eq!(
            tomcat.droplet().additional_libraries.entries(),
            &[sandbox.join("lib/tomcat-jdbc.jar")]
        );
        let jdbc_link = tomcat.droplet().root().join("WEB-INF/lib/tomcat-jdbc.jar");
        assert!(fs::symlink_metadata(&jdbc_link).await.unwrap().is_symlink());
    }

    #[tokio::test]
    async fn compile_applies_legacy_configuration() {
        let temp_dir = tempdir().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).await.unwrap();
        fs::write(app.join("index.jsp"), b"<html/>").await.unwrap();

        let mut tomcat = instance(temp_dir.path(), "7.0.47");
        seed_distribution(&tomcat, true);

        tomcat.compile().await.unwrap();

        let sandbox = tomcat.droplet().sandbox();
        let context = read_document(&sandbox.join("conf/context.xml")).unwrap();
        assert_eq!(
            context.attributes.get(ALLOW_LINKING_ATTRIBUTE),
            Some(&"true".to_string())
        );
        assert!(context.get_child("Resources").is_none());

        let server = read_document(&sandbox.join("conf/server.xml")).unwrap();
        let listeners: Vec<&Element> = server
            .children
            .iter()
            .filter_map(|node| match node {
                XMLNode::Element(element) if element.name == "Listener" => Some(element),
                _ => None,
            })
            .collect();
        assert_eq!(listeners.len(), 1);
        assert_eq!(
            listeners[0].attributes.get("className"),
            Some(&JASPER_LISTENER_CLASS.to_string())
        );
    }

    #[tokio::test]
    async fn compile_skips_the_jdbc_jar_when_absent() {
        let temp_dir = tempdir().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).await.unwrap();
        fs::write(app.join("index.jsp"), b"<html/>").await.unwrap();

        let mut tomcat = instance(temp_dir.path(), "9.0.85");
        seed_distribution(&tomcat, false);

        tomcat.compile().await.unwrap();

        assert!(tomcat.droplet().additional_libraries.entries().is_empty());
        assert!(!tomcat
            .droplet()
            .root()
            .join("WEB-INF/lib/tomcat-jdbc.jar")
            .exists());
    }

    #[tokio::test]
    async fn compile_copies_the_resource_overlay_before_patching() {
        let temp_dir = tempdir().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).await.unwrap();
        fs::write(app.join("index.jsp"), b"<html/>").await.unwrap();

        let overlay = temp_dir.path().join("overlay");
        fs::create_dir_all(overlay.join("conf")).await.unwrap();
        fs::write(
            overlay.join("conf/context.xml"),
            "<Context><WatchedResource>WEB-INF/web.xml</WatchedResource></Context>",
        )
        .await
        .unwrap();

        let mut tomcat = instance(temp_dir.path(), "9.0.85").with_resources(overlay);
        seed_distribution(&tomcat, false);

        tomcat.compile().await.unwrap();

        // The patched document is the overlay copy, not the distribution default
        let context = read_document(&tomcat.droplet().sandbox().join("conf/context.xml")).unwrap();
        assert!(context.get_child("WatchedResource").is_some());
        assert!(context.get_child("Resources").is_some());
    }
}
