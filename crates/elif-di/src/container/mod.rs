pub mod autowiring;
pub mod binding;
pub mod context;
pub mod descriptor;
pub mod injection;
pub mod module;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod visualization;

pub use autowiring::{
    downcast, erase, Arguments, ComponentDescriptor, DependencyResolver, Field, Initializer,
    Injectable, Instance, Layer, Method, Param, Resolved,
};
pub use binding::Tag;
pub use context::{Context, Deferred, DeferredInstance};
pub use descriptor::{Component, ComponentRef, ComponentType, Container, Qualifier};
pub use injection::{InjectProvider, InjectionPoints, InjectionSite, SiteKind};
pub use module::{FnModule, Module};
pub use provider::{ComponentProvider, FactoryProvider, Implements, InstanceProvider};
pub use registry::ContextConfig;
pub use resolver::{DependencyValidator, ResolutionPath};
pub use scope::{
    Pooled, PooledProvider, ScopeFactory, ScopeRegistry, ScopeTag, Singleton, SingletonProvider,
};
pub use visualization::{
    DependencyVisualizer, GraphEdge, GraphNode, GraphSnapshot, VisualizationFormat,
    VisualizationStyle,
};
