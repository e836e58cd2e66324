//! Declaration surface for auto-wired components
//!
//! Implementations describe their injection sites explicitly through
//! [`Injectable::descriptor`]: designated initializers, fields and methods on
//! their own layer, and the layers of the types they embed as ancestors. The
//! extractor in [`crate::container::injection`] turns a descriptor into
//! validated injection points.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::container::context::{Deferred, DeferredInstance};
use crate::container::descriptor::{Component, ComponentRef, ComponentType, Container, Qualifier};
use crate::container::scope::ScopeTag;
use crate::errors::InjectError;

/// Type-erased component instance, always holding an `Arc<T>`
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erase a shared component so it can be stored by providers
pub fn erase<T: ?Sized + Send + Sync + 'static>(component: Arc<T>) -> Instance {
    Arc::new(component)
}

/// Recover the shared component stored by [`erase`]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned()
}

/// Outcome of a successful lookup
#[derive(Clone)]
pub enum Resolved {
    /// The component itself
    Instance(Instance),
    /// An indirection performing the lookup when invoked
    Deferred(DeferredInstance),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Instance(_) => write!(f, "Instance(<component>)"),
            Resolved::Deferred(deferred) => write!(f, "Deferred({})", deferred.component()),
        }
    }
}

/// Object-safe lookup seam used by providers while constructing components
pub trait DependencyResolver {
    /// Resolve a reference; `None` when nothing is bound or the container is unsupported
    fn lookup(&self, reference: &ComponentRef) -> Result<Option<Resolved>, InjectError>;
}

/// Trait for implementations that the registry can construct and populate
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Declare the injection sites of this implementation
    fn descriptor() -> ComponentDescriptor<Self>;
}

/// Declared type of an injected parameter or field
#[derive(Debug, Clone)]
pub struct Param {
    component_type: ComponentType,
    container: Option<ComponentType>,
    qualifiers: Vec<Qualifier>,
}

impl Param {
    /// Parameter receiving `Arc<T>`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            component_type: ComponentType::of::<T>(),
            container: None,
            qualifiers: Vec::new(),
        }
    }

    /// Parameter receiving a `Deferred<T>` handle
    pub fn deferred<T: ?Sized + 'static>() -> Self {
        Self::contained::<Deferred<T>>()
    }

    /// Parameter declared through a wrapper container
    pub fn contained<C: Container>() -> Self {
        Self {
            component_type: ComponentType::of::<C::Component>(),
            container: Some(C::container_type()),
            qualifiers: Vec::new(),
        }
    }

    /// Add a qualifier; more than one is rejected by the extractor
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Shorthand for a `Qualifier::Named` qualifier
    pub fn named(self, name: impl Into<String>) -> Self {
        self.qualified(Qualifier::named(name))
    }

    pub(crate) fn reference(&self, site: &str) -> Result<ComponentRef, InjectError> {
        if self.qualifiers.len() > 1 {
            return Err(InjectError::illegal(
                self.component_type.type_name(),
                crate::errors::IllegalComponentReason::MultipleQualifiers {
                    site: site.to_string(),
                    count: self.qualifiers.len(),
                },
            ));
        }

        let component = Component::new(self.component_type, self.qualifiers.first().cloned());
        let reference = ComponentRef::new(component);
        Ok(match self.container {
            Some(container) => reference.within(container),
            None => reference,
        })
    }

    /// Declared type as used for override matching; qualifiers do not count
    pub(crate) fn signature(&self) -> (ComponentType, Option<ComponentType>) {
        (self.component_type, self.container)
    }
}

pub(crate) type Build<T> = Arc<dyn Fn(&mut Arguments) -> Result<T, InjectError> + Send + Sync>;
pub(crate) type Apply<T> =
    Arc<dyn Fn(&mut T, &mut Arguments) -> Result<(), InjectError> + Send + Sync>;

/// Initializer producing the instance from its resolved parameters
pub struct Initializer<T> {
    pub(crate) params: Vec<Param>,
    pub(crate) build: Build<T>,
}

impl<T: 'static> Initializer<T> {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, InjectError> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            build: Arc::new(build),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

/// Directly assigned field receiving exactly one dependency
pub struct Field<T> {
    pub(crate) name: &'static str,
    pub(crate) param: Param,
    pub(crate) immutable: bool,
    pub(crate) assign: Apply<T>,
}

impl<T: 'static> Field<T> {
    pub fn new<F>(name: &'static str, param: Param, assign: F) -> Self
    where
        F: Fn(&mut T, &mut Arguments) -> Result<(), InjectError> + Send + Sync + 'static,
    {
        Self {
            name,
            param,
            immutable: false,
            assign: Arc::new(assign),
        }
    }

    /// Mark the field as immutable; the extractor rejects injected immutable fields
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    fn lift<S: 'static>(self, project: fn(&mut S) -> &mut T) -> Field<S> {
        let assign = self.assign;
        Field {
            name: self.name,
            param: self.param,
            immutable: self.immutable,
            assign: Arc::new(move |outer: &mut S, arguments: &mut Arguments| {
                assign(project(outer), arguments)
            }),
        }
    }
}

/// Post-construction method, injected or merely overriding an ancestor's
pub struct Method<T> {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<Param>,
    pub(crate) type_parameters: Vec<&'static str>,
    pub(crate) invoke: Option<Apply<T>>,
}

impl<T: 'static> Method<T> {
    /// Method marked for injection
    pub fn new<F>(name: &'static str, invoke: F) -> Self
    where
        F: Fn(&mut T, &mut Arguments) -> Result<(), InjectError> + Send + Sync + 'static,
    {
        Self {
            name,
            params: Vec::new(),
            type_parameters: Vec::new(),
            invoke: Some(Arc::new(invoke)),
        }
    }

    /// Unmarked method that overrides an ancestor method of the same signature
    pub fn overriding(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
            type_parameters: Vec::new(),
            invoke: None,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declare a generic type parameter on the method
    pub fn type_parameter(mut self, name: &'static str) -> Self {
        self.type_parameters.push(name);
        self
    }

    pub fn is_injected(&self) -> bool {
        self.invoke.is_some()
    }

    pub(crate) fn overrides(&self, other: &Method<T>) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(mine, theirs)| mine.signature() == theirs.signature())
    }

    fn lift<S: 'static>(self, project: fn(&mut S) -> &mut T) -> Method<S> {
        Method {
            name: self.name,
            params: self.params,
            type_parameters: self.type_parameters,
            invoke: self.invoke.map(|invoke| -> Apply<S> {
                Arc::new(move |outer: &mut S, arguments: &mut Arguments| {
                    invoke(project(outer), arguments)
                })
            }),
        }
    }
}

/// Fields and methods declared by one type of an inheritance chain
pub struct Layer<T> {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<Field<T>>,
    pub(crate) methods: Vec<Method<T>>,
}

impl<T: 'static> Layer<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: Method<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Re-target this layer onto a type embedding `T`
    pub fn lift<S: 'static>(self, project: fn(&mut S) -> &mut T) -> Layer<S> {
        Layer {
            name: self.name,
            fields: self.fields.into_iter().map(|field| field.lift(project)).collect(),
            methods: self.methods.into_iter().map(|method| method.lift(project)).collect(),
        }
    }
}

/// Everything an implementation declares about its construction
///
/// Ancestor layers are added with [`extends`](Self::extends), nearest ancestor
/// first, mirroring a walk from the implementation up to the root.
pub struct ComponentDescriptor<T> {
    pub(crate) implementation: &'static str,
    pub(crate) is_abstract: bool,
    pub(crate) initializers: Vec<Initializer<T>>,
    pub(crate) fallback: Option<Initializer<T>>,
    pub(crate) layers: Vec<Layer<T>>,
    pub(crate) scopes: Vec<ScopeTag>,
}

impl<T: 'static> ComponentDescriptor<T> {
    pub fn new() -> Self {
        let implementation = std::any::type_name::<T>();
        Self {
            implementation,
            is_abstract: false,
            initializers: Vec::new(),
            fallback: None,
            layers: vec![Layer::new(implementation)],
            scopes: Vec::new(),
        }
    }

    /// Add a designated initializer
    pub fn constructor(mut self, initializer: Initializer<T>) -> Self {
        self.initializers.push(initializer);
        self
    }

    /// No-argument initializer used when none is designated
    pub fn default_constructor<F>(mut self, build: F) -> Self
    where
        F: Fn() -> Result<T, InjectError> + Send + Sync + 'static,
    {
        self.fallback = Some(Initializer::new(move |_| build()));
        self
    }

    /// Declare the implementation as not instantiable
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declare a scope on the implementation type itself
    pub fn scope(mut self, scope: ScopeTag) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn scoped<S: 'static>(self) -> Self {
        self.scope(ScopeTag::of::<S>())
    }

    /// Add an injected field on the implementation's own layer
    pub fn field(mut self, field: Field<T>) -> Self {
        self.layers[0].fields.push(field);
        self
    }

    /// Add a method on the implementation's own layer
    pub fn method(mut self, method: Method<T>) -> Self {
        self.layers[0].methods.push(method);
        self
    }

    /// Append the next ancestor layer
    pub fn extends(mut self, layer: Layer<T>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl<T: Default + 'static> ComponentDescriptor<T> {
    /// Descriptor whose no-argument initializer is `T::default`
    pub fn default_constructible() -> Self {
        Self::new().default_constructor(|| Ok(T::default()))
    }
}

impl<T: 'static> Default for ComponentDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved values handed to initializers, fields and methods in declaration order
pub struct Arguments {
    implementation: &'static str,
    values: VecDeque<(ComponentRef, Resolved)>,
}

impl Arguments {
    pub fn new(implementation: &'static str, values: Vec<(ComponentRef, Resolved)>) -> Self {
        Self {
            implementation,
            values: values.into(),
        }
    }

    /// Resolve every reference eagerly; a missing one fails the construction
    pub(crate) fn resolve(
        implementation: &'static str,
        required: &[ComponentRef],
        resolver: &dyn DependencyResolver,
    ) -> Result<Self, InjectError> {
        let mut values = VecDeque::with_capacity(required.len());
        for reference in required {
            let resolved = resolver.lookup(reference)?.ok_or_else(|| {
                InjectError::UnresolvedDependency {
                    dependency: reference.clone(),
                    implementation,
                }
            })?;
            values.push_back((reference.clone(), resolved));
        }
        Ok(Self {
            implementation,
            values,
        })
    }

    /// Take the next argument as a shared component
    pub fn next<U: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<U>, InjectError> {
        let (reference, resolved) = self.pop()?;
        match resolved {
            Resolved::Instance(instance) => {
                downcast::<U>(&instance).ok_or_else(|| self.mismatch::<Arc<U>>(&reference))
            }
            Resolved::Deferred(_) => Err(self.mismatch::<Arc<U>>(&reference)),
        }
    }

    /// Take the next argument as a deferred handle
    pub fn next_deferred<U: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Deferred<U>, InjectError> {
        let (reference, resolved) = self.pop()?;
        match resolved {
            Resolved::Deferred(deferred) if deferred.component().component_type().is::<U>() => {
                Ok(Deferred::new(deferred))
            }
            _ => Err(self.mismatch::<Deferred<U>>(&reference)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn pop(&mut self) -> Result<(ComponentRef, Resolved), InjectError> {
        self.values
            .pop_front()
            .ok_or(InjectError::ArgumentsExhausted {
                implementation: self.implementation,
            })
    }

    fn mismatch<E: ?Sized>(&self, reference: &ComponentRef) -> InjectError {
        InjectError::ArgumentMismatch {
            implementation: self.implementation,
            expected: std::any::type_name::<E>(),
            found: reference.to_string(),
        }
    }
}
