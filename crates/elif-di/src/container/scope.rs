//! Lifecycle scopes decorating a base provider
//!
//! A scope is identified by a zero-sized marker type. The registry keeps one
//! [`ScopeFactory`] per marker and wraps every provider bound under that scope.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::container::autowiring::{DependencyResolver, Instance};
use crate::container::descriptor::{ComponentRef, ComponentType};
use crate::container::provider::ComponentProvider;
use crate::errors::InjectError;

/// Marker for the single-shared-instance scope, registered by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Singleton;

/// Marker for the pooled rotating scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pooled;

/// Comparable scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeTag(ComponentType);

impl ScopeTag {
    pub fn of<S: 'static>() -> Self {
        Self(ComponentType::of::<S>())
    }

    /// Short marker name, e.g. `Singleton`
    pub fn name(&self) -> &'static str {
        self.0.short_name()
    }

    pub fn marker_type(&self) -> ComponentType {
        self.0
    }
}

impl fmt::Display for ScopeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Wraps a base provider into a scoped one
pub type ScopeFactory =
    Arc<dyn Fn(Arc<dyn ComponentProvider>) -> Arc<dyn ComponentProvider> + Send + Sync>;

/// Scope markers and the factories decorating providers bound under them
#[derive(Clone)]
pub struct ScopeRegistry {
    factories: HashMap<ScopeTag, ScopeFactory>,
}

impl ScopeRegistry {
    /// Registry with the singleton scope pre-registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register::<Singleton, _>(|provider| -> Arc<dyn ComponentProvider> {
            Arc::new(SingletonProvider::new(provider))
        });
        registry
    }

    /// Register or replace the factory for scope marker `S`
    pub fn register<S, F>(&mut self, factory: F)
    where
        S: 'static,
        F: Fn(Arc<dyn ComponentProvider>) -> Arc<dyn ComponentProvider> + Send + Sync + 'static,
    {
        self.register_tag(ScopeTag::of::<S>(), Arc::new(factory));
    }

    pub fn register_tag(&mut self, tag: ScopeTag, factory: ScopeFactory) {
        if self.factories.insert(tag, factory).is_some() {
            tracing::debug!(scope = %tag, "Replaced scope factory");
        } else {
            tracing::debug!(scope = %tag, "Registered scope");
        }
    }

    pub fn contains(&self, tag: &ScopeTag) -> bool {
        self.factories.contains_key(tag)
    }

    /// Decorate `provider` with the scope registered for `tag`
    pub fn create(
        &self,
        tag: &ScopeTag,
        provider: Arc<dyn ComponentProvider>,
    ) -> Option<Arc<dyn ComponentProvider>> {
        self.factories.get(tag).map(|factory| factory(provider))
    }

    pub fn tags(&self) -> impl Iterator<Item = &ScopeTag> {
        self.factories.keys()
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// Caches the first instance and hands it out on every later lookup
pub struct SingletonProvider {
    provider: Arc<dyn ComponentProvider>,
    instance: Mutex<Option<Instance>>,
}

impl SingletonProvider {
    pub fn new(provider: Arc<dyn ComponentProvider>) -> Self {
        Self {
            provider,
            instance: Mutex::new(None),
        }
    }
}

impl ComponentProvider for SingletonProvider {
    fn get(&self, resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        let mut slot = self
            .instance
            .lock()
            .map_err(|_| InjectError::lock("singleton instance"))?;

        if let Some(instance) = slot.as_ref() {
            return Ok(instance.clone());
        }

        let instance = self.provider.get(resolver)?;
        *slot = Some(instance.clone());
        Ok(instance)
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.provider.dependencies()
    }
}

struct Pool {
    instances: Vec<Instance>,
    cursor: usize,
}

/// Creates instances until the pool is full, then rotates through them
pub struct PooledProvider {
    provider: Arc<dyn ComponentProvider>,
    capacity: NonZeroUsize,
    pool: Mutex<Pool>,
}

impl PooledProvider {
    pub fn new(provider: Arc<dyn ComponentProvider>, capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            capacity,
            pool: Mutex::new(Pool {
                instances: Vec::with_capacity(capacity.get()),
                cursor: 0,
            }),
        }
    }

    /// Scope factory producing pools of the given capacity
    pub fn factory(capacity: NonZeroUsize) -> ScopeFactory {
        Arc::new(
            move |provider: Arc<dyn ComponentProvider>| -> Arc<dyn ComponentProvider> {
                Arc::new(PooledProvider::new(provider, capacity))
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl ComponentProvider for PooledProvider {
    fn get(&self, resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        let mut pool = self
            .pool
            .lock()
            .map_err(|_| InjectError::lock("instance pool"))?;

        if pool.instances.len() < self.capacity.get() {
            let instance = self.provider.get(resolver)?;
            pool.instances.push(instance.clone());
            return Ok(instance);
        }

        let index = pool.cursor % self.capacity.get();
        pool.cursor = pool.cursor.wrapping_add(1);
        Ok(pool.instances[index].clone())
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.provider.dependencies()
    }
}
