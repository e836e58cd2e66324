//! Component resolution with validated dependency graphs
//!
//! Bindings are collected in a [`ContextConfig`], validated for missing and
//! cyclic dependencies, and frozen into a read-only [`Context`].
//!
//! ```rust
//! use std::sync::Arc;
//! use elif_di::{ComponentDescriptor, ContextConfig, Initializer, Injectable, Param, Tag};
//!
//! struct Greeter {
//!     greeting: Arc<String>,
//! }
//!
//! impl Injectable for Greeter {
//!     fn descriptor() -> ComponentDescriptor<Self> {
//!         ComponentDescriptor::new().constructor(
//!             Initializer::new(|arguments| Ok(Greeter { greeting: arguments.next::<String>()? }))
//!                 .param(Param::of::<String>().named("greeting")),
//!         )
//!     }
//! }
//!
//! let mut config = ContextConfig::new();
//! config
//!     .bind_instance_tagged(Arc::new("hello".to_string()), vec![Tag::named("greeting")])?
//!     .bind::<Greeter, Greeter>()?;
//!
//! let context = config.build_context()?;
//! let greeter = context.get::<Greeter>()?.expect("greeter is bound");
//! assert_eq!(greeter.greeting.as_str(), "hello");
//! # Ok::<(), elif_di::InjectError>(())
//! ```

pub mod config;
pub mod container;
pub mod errors;

pub use config::{ConfigError, ConfigSource, InjectSettings, SourceMap};
pub use container::{
    Arguments, Component, ComponentDescriptor, ComponentProvider, ComponentRef, ComponentType,
    Context, ContextConfig, Deferred, DependencyResolver, DependencyVisualizer, Field, FnModule,
    Implements, Initializer, InjectProvider, Injectable, Layer, Method, Module, Param, Pooled,
    PooledProvider, Qualifier, ScopeTag, Singleton, Tag, VisualizationFormat, VisualizationStyle,
};
pub use errors::{IllegalComponentReason, InjectError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
