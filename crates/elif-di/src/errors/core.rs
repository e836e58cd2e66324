use thiserror::Error;

use crate::config::ConfigError;
use crate::container::descriptor::{Component, ComponentRef};

/// Core error type for component binding, validation and resolution
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Illegal component '{component}': {reason}")]
    IllegalComponent {
        component: String,
        reason: IllegalComponentReason,
    },

    #[error("Duplicated binding: {component}")]
    DuplicateBinding { component: Component },

    #[error("Dependency {dependency} required by {component} not found")]
    DependencyNotFound {
        dependency: Component,
        component: Component,
    },

    #[error("Cyclic dependencies found: {}", cycle_path(.components))]
    CyclicDependency { components: Vec<Component> },

    #[error("Dependency {dependency} could not be resolved while constructing '{implementation}'")]
    UnresolvedDependency {
        dependency: ComponentRef,
        implementation: &'static str,
    },

    #[error("Argument mismatch in '{implementation}': expected {expected}, found {found}")]
    ArgumentMismatch {
        implementation: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Initializer of '{implementation}' requested more arguments than it declared")]
    ArgumentsExhausted { implementation: &'static str },

    #[error("Component {component} cannot be resolved as {requested}")]
    TypeMismatch {
        component: Component,
        requested: &'static str,
    },

    #[error("Context owning {component} has been dropped")]
    ContextDropped { component: Component },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("Component initialization failed for '{implementation}': {source}")]
    InitializationFailed {
        implementation: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why a binding or an implementation was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalComponentReason {
    #[error("abstract types cannot be instantiated")]
    Abstract,

    #[error("{count} designated initializers declared, expected at most one")]
    MultipleInitializers { count: usize },

    #[error("no designated initializer and no no-argument initializer")]
    MissingInitializer,

    #[error("injected field '{field}' is immutable")]
    ImmutableField { field: &'static str },

    #[error("injected method '{method}' declares type parameters")]
    GenericMethod { method: &'static str },

    #[error("{count} qualifiers declared on '{site}'")]
    MultipleQualifiers { site: String, count: usize },

    #[error("multiple scopes declared: {}", .scopes.join(", "))]
    MultipleScopes { scopes: Vec<String> },

    #[error("unknown scope: {scope}")]
    UnknownScope { scope: String },

    #[error("unqualified tags: {}", .tags.join(", "))]
    UnqualifiedTags { tags: Vec<String> },
}

fn cycle_path(components: &[Component]) -> String {
    let mut path: Vec<String> = components.iter().map(ToString::to_string).collect();
    if let Some(first) = components.first() {
        path.push(first.to_string());
    }
    path.join(" -> ")
}

impl InjectError {
    /// Create a new illegal component error
    pub fn illegal(component: impl Into<String>, reason: IllegalComponentReason) -> Self {
        Self::IllegalComponent {
            component: component.into(),
            reason,
        }
    }

    /// Wrap a failure raised by user construction code
    pub fn initialization(
        implementation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::InitializationFailed {
            implementation,
            source: source.into(),
        }
    }

    /// Create a lock error for a poisoned scope cache
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Check if the error rejects a binding or an implementation
    pub fn is_illegal_component(&self) -> bool {
        matches!(self, Self::IllegalComponent { .. })
    }

    /// Check if the error is a duplicated binding
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateBinding { .. })
    }

    /// Check if the error is a missing dependency found during validation
    pub fn is_dependency_not_found(&self) -> bool {
        matches!(self, Self::DependencyNotFound { .. })
    }

    /// Check if the error is a dependency cycle
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }

    /// Reason of an illegal component error
    pub fn illegal_reason(&self) -> Option<&IllegalComponentReason> {
        match self {
            Self::IllegalComponent { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Components forming a dependency cycle, in walk order
    pub fn cycle(&self) -> Option<&[Component]> {
        match self {
            Self::CyclicDependency { components } => Some(components),
            _ => None,
        }
    }
}
