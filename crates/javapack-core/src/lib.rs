//! Staging library for Java web application droplets.
//!
//! This crate assembles a deployable droplet for an uploaded Java web
//! application: it downloads a servlet container distribution, expands it
//! into a sandbox inside the droplet, patches the container configuration,
//! and wires the application's files into the container's webapps tree.
//!
//! # Architecture Overview
//!
//! The library is organized around a small number of subsystems:
//!
//! - **Lifecycle**: the `detect`/`compile`/`release` contract implemented by
//!   staging components and driven by the [`lifecycle::Staging`] orchestrator
//! - **Containers**: concrete components contributing a web runtime, today
//!   only [`containers::tomcat`]
//! - **Download cache**: content-addressed distribution downloads
//! - **Archive expansion**: the gzip-tar recipe shared by distributions and
//!   bundled archives
//! - **Configuration system**: YAML configuration with sensible defaults

pub mod application;
pub mod archive;
pub mod config;
pub mod containers;
pub mod download;
pub mod droplet;
pub mod errors;
pub mod lifecycle;
pub mod xml;

pub use application::Application;
pub use config::{ConfigLoader, StagingConfig, TomcatConfig};
pub use containers::TomcatInstance;
pub use download::DownloadCache;
pub use droplet::Droplet;
pub use errors::BuildpackError;
pub use lifecycle::{Component, Staging};
