use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::autowiring::{downcast, DependencyResolver, Instance, Resolved};
use crate::container::descriptor::{Component, ComponentRef, Qualifier};
use crate::container::provider::ComponentProvider;
use crate::errors::InjectError;

type Thunk = Arc<dyn Fn() -> Result<Instance, InjectError> + Send + Sync>;

/// Type-erased deferred handle
#[derive(Clone)]
pub struct DeferredInstance {
    component: Component,
    thunk: Thunk,
}

impl DeferredInstance {
    pub fn new<F>(component: Component, thunk: F) -> Self
    where
        F: Fn() -> Result<Instance, InjectError> + Send + Sync + 'static,
    {
        Self {
            component,
            thunk: Arc::new(thunk),
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Perform the lookup now
    pub fn get(&self) -> Result<Instance, InjectError> {
        (self.thunk)()
    }
}

impl fmt::Debug for DeferredInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredInstance")
            .field("component", &self.component)
            .finish()
    }
}

/// Handle resolving `T` only when asked to
///
/// Requesting a `Deferred<T>` never takes part in cycle detection, which makes
/// it the way to wire components that refer back to each other. The handle
/// does not keep the context alive.
pub struct Deferred<T: ?Sized> {
    inner: DeferredInstance,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Deferred<T> {
    pub(crate) fn new(inner: DeferredInstance) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn component(&self) -> &Component {
        self.inner.component()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Deferred<T> {
    /// Resolve the component through the owning context
    pub fn get(&self) -> Result<Arc<T>, InjectError> {
        let instance = self.inner.get()?;
        downcast::<T>(&instance).ok_or_else(|| InjectError::TypeMismatch {
            component: self.inner.component().clone(),
            requested: std::any::type_name::<T>(),
        })
    }
}

impl<T: ?Sized> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<T: ?Sized> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Deferred").field(self.inner.component()).finish()
    }
}

pub(crate) type ProviderMap = HashMap<Component, Arc<dyn ComponentProvider>>;

struct ContextInner {
    name: String,
    components: ProviderMap,
}

/// Read-only view over a validated registry
///
/// Cloning is cheap; every clone shares the same providers and scope caches.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub(crate) fn new(name: impl Into<String>, components: ProviderMap) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                components,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Resolve a reference
    ///
    /// Returns `Ok(None)` when the component is not bound or when the reference
    /// asks for a container other than [`Deferred`].
    pub fn lookup(&self, reference: &ComponentRef) -> Result<Option<Resolved>, InjectError> {
        tracing::trace!(context = %self.inner.name, reference = %reference, "lookup");

        if reference.is_container() && !reference.is_deferred() {
            return Ok(None);
        }

        let Some(provider) = self.inner.components.get(reference.component()).cloned() else {
            return Ok(None);
        };

        if reference.is_deferred() {
            let weak = Arc::downgrade(&self.inner);
            let component = reference.component().clone();
            return Ok(Some(Resolved::Deferred(DeferredInstance::new(
                component.clone(),
                move || resolve_deferred(&weak, &component, provider.as_ref()),
            ))));
        }

        provider.get(self).map(|instance| Some(Resolved::Instance(instance)))
    }

    /// Resolve an unqualified component
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, InjectError> {
        self.get_ref(&ComponentRef::of::<T>())
    }

    /// Resolve a qualified component
    pub fn get_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Qualifier,
    ) -> Result<Option<Arc<T>>, InjectError> {
        self.get_ref(&ComponentRef::qualified::<T>(qualifier))
    }

    /// Resolve a direct reference to `T`
    pub fn get_ref<T: ?Sized + Send + Sync + 'static>(
        &self,
        reference: &ComponentRef,
    ) -> Result<Option<Arc<T>>, InjectError> {
        match self.lookup(reference)? {
            None => Ok(None),
            Some(Resolved::Instance(instance)) => downcast::<T>(&instance)
                .map(Some)
                .ok_or_else(|| self.type_mismatch::<Arc<T>>(reference)),
            Some(Resolved::Deferred(_)) => Err(self.type_mismatch::<Arc<T>>(reference)),
        }
    }

    /// Obtain a deferred handle to an unqualified component
    pub fn deferred<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Deferred<T>>, InjectError> {
        self.deferred_ref(&ComponentRef::deferred::<T>())
    }

    /// Obtain a deferred handle to a qualified component
    pub fn deferred_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Qualifier,
    ) -> Result<Option<Deferred<T>>, InjectError> {
        self.deferred_ref(&ComponentRef::deferred::<T>().with_qualifier(qualifier))
    }

    fn deferred_ref<T: ?Sized + Send + Sync + 'static>(
        &self,
        reference: &ComponentRef,
    ) -> Result<Option<Deferred<T>>, InjectError> {
        match self.lookup(reference)? {
            None => Ok(None),
            Some(Resolved::Deferred(deferred)) => Ok(Some(Deferred::new(deferred))),
            Some(Resolved::Instance(_)) => Err(self.type_mismatch::<Deferred<T>>(reference)),
        }
    }

    /// Check if a component is bound
    pub fn contains(&self, component: &Component) -> bool {
        self.inner.components.contains_key(component)
    }

    /// All bound components, in no particular order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.inner.components.keys()
    }

    /// Declared dependencies of a bound component
    pub fn dependencies_of(&self, component: &Component) -> Option<Vec<ComponentRef>> {
        self.inner
            .components
            .get(component)
            .map(|provider| provider.dependencies())
    }

    pub fn len(&self) -> usize {
        self.inner.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.components.is_empty()
    }

    fn type_mismatch<E: ?Sized>(&self, reference: &ComponentRef) -> InjectError {
        InjectError::TypeMismatch {
            component: reference.component().clone(),
            requested: std::any::type_name::<E>(),
        }
    }
}

fn resolve_deferred(
    context: &Weak<ContextInner>,
    component: &Component,
    provider: &dyn ComponentProvider,
) -> Result<Instance, InjectError> {
    let inner = context.upgrade().ok_or_else(|| InjectError::ContextDropped {
        component: component.clone(),
    })?;
    provider.get(&Context { inner })
}

impl DependencyResolver for Context {
    fn lookup(&self, reference: &ComponentRef) -> Result<Option<Resolved>, InjectError> {
        Context::lookup(self, reference)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("components", &self.inner.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::autowiring::erase;
    use crate::container::provider::InstanceProvider;

    trait Dependency: Send + Sync {}
    struct Owner;
    impl Dependency for Owner {}

    fn context_with_owner() -> (Context, Arc<dyn Dependency>) {
        let instance: Arc<dyn Dependency> = Arc::new(Owner);
        let mut components: ProviderMap = HashMap::new();
        components.insert(
            Component::of::<dyn Dependency>(),
            Arc::new(InstanceProvider::new(erase(instance.clone()))),
        );
        (Context::new("test", components), instance)
    }

    #[test]
    fn test_get_returns_bound_instance() {
        let (context, instance) = context_with_owner();
        let resolved = context.get::<dyn Dependency>().unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &instance));
        assert!(context.get::<String>().unwrap().is_none());
    }

    #[test]
    fn test_unsupported_container_is_absent() {
        let (context, _) = context_with_owner();
        let listed = ComponentRef::contained::<Vec<Arc<dyn Dependency>>>(None);
        assert!(context.lookup(&listed).unwrap().is_none());
    }

    #[test]
    fn test_deferred_resolves_later() {
        let (context, instance) = context_with_owner();
        let deferred = context.deferred::<dyn Dependency>().unwrap().unwrap();
        assert_eq!(deferred.component(), &Component::of::<dyn Dependency>());
        assert!(Arc::ptr_eq(&deferred.get().unwrap(), &instance));
    }

    #[test]
    fn test_deferred_after_context_dropped() {
        let (context, _) = context_with_owner();
        let deferred = context.deferred::<dyn Dependency>().unwrap().unwrap();
        drop(context);

        assert!(matches!(
            deferred.get(),
            Err(InjectError::ContextDropped { .. })
        ));
    }

    #[test]
    fn test_direct_lookup_through_wrong_type() {
        let (context, _) = context_with_owner();
        let result = context.get_ref::<String>(&ComponentRef::of::<dyn Dependency>());
        assert!(matches!(result, Err(InjectError::TypeMismatch { .. })));
    }
}
