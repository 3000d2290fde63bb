//! Container components wiring a web runtime into the droplet

pub mod tomcat;

pub use tomcat::TomcatInstance;
