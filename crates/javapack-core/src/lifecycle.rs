//! Lifecycle contract for staging components
//!
//! Components implement the three-operation buildpack contract and are
//! registered into a [`Staging`] instance, which the host iterates in
//! registration order. There is no dynamic discovery: the caller decides
//! which components exist for a given build.

use crate::errors::BuildpackError;
use async_trait::async_trait;

/// A component that may contribute to the droplet build
#[async_trait]
pub trait Component: Send + Sync {
    /// Human-readable component name
    fn name(&self) -> &'static str;

    /// Whether this component applies to the application being staged
    fn supports(&self) -> bool;

    /// Contribute the component's files to the droplet; invoked once per build
    async fn compile(&mut self) -> Result<(), BuildpackError>;

    /// Contribute a launch command fragment, if any
    fn release(&mut self) -> Result<Option<String>, BuildpackError>;
}

/// Drives registered components through the staging lifecycle in order
#[derive(Default)]
pub struct Staging {
    components: Vec<Box<dyn Component>>,
}

impl Staging {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn register(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Names of the components that claim the application
    pub fn detect(&self) -> Vec<&'static str> {
        self.components
            .iter()
            .filter(|component| component.supports())
            .map(|component| component.name())
            .collect()
    }

    /// Compile every supporting component, aborting on the first failure
    pub async fn compile(&mut self) -> Result<(), BuildpackError> {
        for component in &mut self.components {
            if !component.supports() {
                log::debug!("Component {} does not apply, skipping", component.name());
                continue;
            }
            log::info!("Compiling component: {}", component.name());
            component.compile().await?;
        }
        Ok(())
    }

    /// Collect launch command fragments from supporting components
    pub fn release(&mut self) -> Result<Vec<String>, BuildpackError> {
        let mut commands = Vec::new();
        for component in &mut self.components {
            if !component.supports() {
                continue;
            }
            if let Some(command) = component.release()? {
                commands.push(command);
            }
        }
        Ok(commands)
    }
}
