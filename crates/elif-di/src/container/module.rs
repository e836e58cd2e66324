use crate::container::registry::ContextConfig;
use crate::errors::InjectError;

/// A reusable group of bindings
///
/// Modules bind instances, implementations and scopes into a [`ContextConfig`]
/// through [`ContextConfig::install`].
///
/// ```rust
/// use std::sync::Arc;
/// use elif_di::{ContextConfig, InjectError, Module, Tag};
///
/// struct SettingsModule;
///
/// impl Module for SettingsModule {
///     fn configure(&self, config: &mut ContextConfig) -> Result<(), InjectError> {
///         let dsn = Arc::new("postgres://localhost".to_string());
///         config.bind_instance_tagged(dsn, vec![Tag::named("dsn")])?;
///         Ok(())
///     }
/// }
///
/// let mut config = ContextConfig::new();
/// config.install(&SettingsModule).unwrap();
/// assert_eq!(config.len(), 1);
/// ```
pub trait Module: Send + Sync {
    /// Get module name (defaults to type name)
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Register this module's bindings
    fn configure(&self, config: &mut ContextConfig) -> Result<(), InjectError>;
}

/// Module built from a closure
pub struct FnModule<F> {
    name: &'static str,
    configure: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut ContextConfig) -> Result<(), InjectError> + Send + Sync,
{
    pub fn new(name: &'static str, configure: F) -> Self {
        Self { name, configure }
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(&mut ContextConfig) -> Result<(), InjectError> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn configure(&self, config: &mut ContextConfig) -> Result<(), InjectError> {
        (self.configure)(config)
    }
}
