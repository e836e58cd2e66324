//! Injection point extraction and the injection-based provider
//!
//! [`InjectionPoints`] validates a [`ComponentDescriptor`] and flattens it into
//! one initializer site followed by field and method sites, all ordered from
//! the root ancestor down to the implementation. [`InjectProvider`] drives
//! construction from those points.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::autowiring::{
    erase, Apply, Arguments, Build, ComponentDescriptor, DependencyResolver, Injectable, Instance,
    Method,
};
use crate::container::descriptor::ComponentRef;
use crate::container::provider::{ComponentProvider, Implements};
use crate::container::scope::ScopeTag;
use crate::errors::{IllegalComponentReason, InjectError};

/// Kind of an injection site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Initializer,
    Field,
    Method,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKind::Initializer => write!(f, "initializer"),
            SiteKind::Field => write!(f, "field"),
            SiteKind::Method => write!(f, "method"),
        }
    }
}

/// A location receiving resolved dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSite {
    pub kind: SiteKind,
    /// Declaring layer, i.e. the implementation or one of its ancestors
    pub layer: &'static str,
    pub name: &'static str,
    pub dependencies: Vec<ComponentRef>,
}

/// Validated injection metadata of an implementation type
pub struct InjectionPoints<T> {
    implementation: &'static str,
    initializer: (InjectionSite, Build<T>),
    fields: Vec<(InjectionSite, Apply<T>)>,
    methods: Vec<(InjectionSite, Apply<T>)>,
    required: Vec<ComponentRef>,
    scopes: Vec<ScopeTag>,
}

impl<T: Injectable> InjectionPoints<T> {
    /// Extract the injection points declared by `T`
    pub fn of() -> Result<Self, InjectError> {
        Self::extract(T::descriptor())
    }
}

impl<T: 'static> InjectionPoints<T> {
    /// Validate a descriptor and flatten it into ordered sites
    pub fn extract(descriptor: ComponentDescriptor<T>) -> Result<Self, InjectError> {
        let ComponentDescriptor {
            implementation,
            is_abstract,
            mut initializers,
            fallback,
            layers,
            scopes,
        } = descriptor;

        let illegal = |reason| InjectError::illegal(implementation, reason);

        if is_abstract {
            return Err(illegal(IllegalComponentReason::Abstract));
        }

        let initializer = match initializers.len() {
            0 => fallback.ok_or_else(|| illegal(IllegalComponentReason::MissingInitializer))?,
            1 => initializers.remove(0),
            count => return Err(illegal(IllegalComponentReason::MultipleInitializers { count })),
        };

        let initializer_site = InjectionSite {
            kind: SiteKind::Initializer,
            layer: implementation,
            name: "new",
            dependencies: initializer
                .params
                .iter()
                .map(|param| param.reference(&format!("{}::new", implementation)))
                .collect::<Result<_, _>>()?,
        };

        // Leaf to root: a method survives only if nothing below it shares its signature
        let mut seen: Vec<&Method<T>> = Vec::new();
        let mut effective: Vec<Vec<bool>> = Vec::with_capacity(layers.len());
        for layer in &layers {
            effective.push(
                layer
                    .methods
                    .iter()
                    .map(|method| {
                        method.is_injected() && !seen.iter().any(|other| other.overrides(method))
                    })
                    .collect(),
            );
            seen.extend(layer.methods.iter());
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        for (layer, keep) in layers.into_iter().zip(effective).rev() {
            for field in layer.fields {
                if field.immutable {
                    return Err(illegal(IllegalComponentReason::ImmutableField {
                        field: field.name,
                    }));
                }
                let site = InjectionSite {
                    kind: SiteKind::Field,
                    layer: layer.name,
                    name: field.name,
                    dependencies: vec![field
                        .param
                        .reference(&format!("{}.{}", layer.name, field.name))?],
                };
                fields.push((site, field.assign));
            }

            for (method, keep) in layer.methods.into_iter().zip(keep) {
                let Some(invoke) = method.invoke.filter(|_| keep) else {
                    continue;
                };
                if !method.type_parameters.is_empty() {
                    return Err(illegal(IllegalComponentReason::GenericMethod {
                        method: method.name,
                    }));
                }
                let site = InjectionSite {
                    kind: SiteKind::Method,
                    layer: layer.name,
                    name: method.name,
                    dependencies: method
                        .params
                        .iter()
                        .map(|param| param.reference(&format!("{}::{}", layer.name, method.name)))
                        .collect::<Result<_, _>>()?,
                };
                methods.push((site, invoke));
            }
        }

        let required = std::iter::once(&initializer_site)
            .chain(fields.iter().map(|(site, _)| site))
            .chain(methods.iter().map(|(site, _)| site))
            .flat_map(|site| site.dependencies.iter().cloned())
            .collect();

        tracing::trace!(
            implementation,
            fields = fields.len(),
            methods = methods.len(),
            "Extracted injection points"
        );

        Ok(Self {
            implementation,
            initializer: (initializer_site, initializer.build),
            fields,
            methods,
            required,
            scopes,
        })
    }

    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    /// Every site in execution order
    pub fn sites(&self) -> impl Iterator<Item = &InjectionSite> {
        std::iter::once(&self.initializer.0)
            .chain(self.fields.iter().map(|(site, _)| site))
            .chain(self.methods.iter().map(|(site, _)| site))
    }

    /// Dependencies of the initializer, then fields, then methods
    pub fn required(&self) -> &[ComponentRef] {
        &self.required
    }

    /// Scope tags declared on the implementation type
    pub fn scopes(&self) -> &[ScopeTag] {
        &self.scopes
    }

    /// Build and populate a new instance
    pub fn construct(&self, resolver: &dyn DependencyResolver) -> Result<T, InjectError> {
        let (site, build) = &self.initializer;
        let mut arguments = Arguments::resolve(self.implementation, &site.dependencies, resolver)?;
        let mut instance = build(&mut arguments)?;

        for (site, apply) in self.fields.iter().chain(&self.methods) {
            let mut arguments =
                Arguments::resolve(self.implementation, &site.dependencies, resolver)?;
            apply(&mut instance, &mut arguments)?;
        }

        Ok(instance)
    }
}

impl<T> fmt::Debug for InjectionPoints<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoints")
            .field("implementation", &self.implementation)
            .field("initializer", &self.initializer.0)
            .field("fields", &self.fields.iter().map(|(site, _)| site).collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|(site, _)| site).collect::<Vec<_>>())
            .finish()
    }
}

/// Provider constructing `T` and handing it out as `I`
pub struct InjectProvider<T, I: ?Sized = T> {
    points: Arc<InjectionPoints<T>>,
    _marker: PhantomData<fn() -> Arc<I>>,
}

impl<T, I> InjectProvider<T, I>
where
    T: Injectable + Implements<I>,
    I: ?Sized + Send + Sync + 'static,
{
    pub fn new() -> Result<Self, InjectError> {
        InjectionPoints::of().map(|points| Self::with_points(Arc::new(points)))
    }

    /// Reuse already extracted metadata
    pub fn with_points(points: Arc<InjectionPoints<T>>) -> Self {
        Self {
            points,
            _marker: PhantomData,
        }
    }

    pub fn points(&self) -> &InjectionPoints<T> {
        &self.points
    }
}

impl<T, I> ComponentProvider for InjectProvider<T, I>
where
    T: Injectable + Implements<I>,
    I: ?Sized + Send + Sync + 'static,
{
    fn get(&self, resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        tracing::trace!(implementation = self.points.implementation, "Constructing component");
        let instance = Arc::new(self.points.construct(resolver)?);
        Ok(erase(<T as Implements<I>>::upcast(instance)))
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.points.required.clone()
    }
}
