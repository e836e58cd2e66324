use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::config::{ConfigError, InjectSettings};
use crate::container::autowiring::{erase, Injectable};
use crate::container::binding::{Bindings, Tag};
use crate::container::context::{Context, ProviderMap};
use crate::container::descriptor::{Component, ComponentType};
use crate::container::injection::{InjectProvider, InjectionPoints};
use crate::container::module::Module;
use crate::container::provider::{ComponentProvider, FactoryProvider, Implements, InstanceProvider};
use crate::container::resolver::DependencyValidator;
use crate::container::scope::{Pooled, PooledProvider, ScopeFactory, ScopeRegistry, ScopeTag};
use crate::errors::{IllegalComponentReason, InjectError};

/// Write-only registry of bindings, frozen into a [`Context`] once validated
pub struct ContextConfig {
    name: String,
    components: ProviderMap,
    order: Vec<Component>,
    scopes: ScopeRegistry,
    points: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::with_scopes(ScopeRegistry::new())
    }

    /// Start from a prepared set of scopes
    pub fn with_scopes(scopes: ScopeRegistry) -> Self {
        Self {
            name: "default".to_string(),
            components: HashMap::new(),
            order: Vec::new(),
            scopes,
            points: HashMap::new(),
        }
    }

    /// Apply validated settings
    pub fn with_settings(settings: &InjectSettings) -> Result<Self, InjectError> {
        settings.validate()?;

        let mut config = Self::new();
        config.name = settings.name.clone();

        if settings.register_pooled {
            let capacity = NonZeroUsize::new(settings.pool_capacity).ok_or_else(|| {
                ConfigError::invalid_value("pool_capacity", "0", "positive integer")
            })?;
            config.scope_tag(ScopeTag::of::<Pooled>(), PooledProvider::factory(capacity));
        }

        Ok(config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register the factory decorating providers bound under scope `S`
    pub fn scope<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: 'static,
        F: Fn(Arc<dyn ComponentProvider>) -> Arc<dyn ComponentProvider> + Send + Sync + 'static,
    {
        self.scope_tag(ScopeTag::of::<S>(), Arc::new(factory))
    }

    pub fn scope_tag(&mut self, tag: ScopeTag, factory: ScopeFactory) -> &mut Self {
        self.scopes.register_tag(tag, factory);
        self
    }

    /// Bind a shared instance without qualifier
    pub fn bind_instance<T>(&mut self, instance: Arc<T>) -> Result<&mut Self, InjectError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind_instance_tagged(instance, Vec::new())
    }

    /// Bind a shared instance under each qualifier tag; other tags are illegal
    pub fn bind_instance_tagged<T>(
        &mut self,
        instance: Arc<T>,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Result<&mut Self, InjectError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let component_type = ComponentType::of::<T>();
        let bindings = self.reject(Bindings::instance(
            component_type.type_name(),
            tags.into_iter().collect(),
        ))?;

        let provider: Arc<dyn ComponentProvider> = Arc::new(InstanceProvider::new(erase(instance)));
        self.register(bindings.components(component_type), provider)
    }

    /// Bind interface `I` to implementation `T` using the tags declared by `T`
    pub fn bind<I, T>(&mut self) -> Result<&mut Self, InjectError>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<I>,
    {
        self.bind_tagged::<I, T>(Vec::new())
    }

    /// Bind interface `I` to implementation `T` with qualifier and scope tags
    pub fn bind_tagged<I, T>(
        &mut self,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Result<&mut Self, InjectError>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<I>,
    {
        let points = self.points::<T>();
        let points = self.reject(points)?;
        let implementation = points.implementation();
        let bindings = self.reject(Bindings::component(
            implementation,
            tags.into_iter().collect(),
        ))?;
        let scope = self.reject(bindings.scope(implementation, points.scopes()))?;

        let provider: Arc<dyn ComponentProvider> =
            Arc::new(InjectProvider::<T, I>::with_points(points));
        let provider = self.reject(self.scoped(implementation, scope, provider))?;

        self.register(bindings.components(ComponentType::of::<I>()), provider)
    }

    /// Bind `T` to a factory called on every lookup, unless a scope caches it
    pub fn bind_factory<T, F>(
        &mut self,
        tags: impl IntoIterator<Item = Tag>,
        factory: F,
    ) -> Result<&mut Self, InjectError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<T>, InjectError> + Send + Sync + 'static,
    {
        let component_type = ComponentType::of::<T>();
        let owner = component_type.type_name();
        let bindings = self.reject(Bindings::component(owner, tags.into_iter().collect()))?;
        let scope = self.reject(bindings.scope(owner, &[]))?;

        let provider: Arc<dyn ComponentProvider> = Arc::new(FactoryProvider::new(factory));
        let provider = self.reject(self.scoped(owner, scope, provider))?;

        self.register(bindings.components(component_type), provider)
    }

    /// Bind a hand-written provider to a single identity
    pub fn bind_provider(
        &mut self,
        component: Component,
        provider: Arc<dyn ComponentProvider>,
    ) -> Result<&mut Self, InjectError> {
        self.register(vec![component], provider)
    }

    /// Apply the bindings of a module
    pub fn install(&mut self, module: &dyn Module) -> Result<&mut Self, InjectError> {
        tracing::debug!(context = %self.name, module = module.name(), "Installing module");
        module.configure(self)?;
        Ok(self)
    }

    pub fn is_bound(&self, component: &Component) -> bool {
        self.components.contains_key(component)
    }

    pub fn has_scope(&self, tag: &ScopeTag) -> bool {
        self.scopes.contains(tag)
    }

    /// Bound identities in registration order
    pub fn components(&self) -> &[Component] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate the dependency graph and freeze the registry
    pub fn build_context(self) -> Result<Context, InjectError> {
        tracing::info!(
            context = %self.name,
            components = self.order.len(),
            "Building context"
        );

        if let Err(error) = DependencyValidator::new(&self.components).validate(&self.order) {
            tracing::warn!(context = %self.name, error = %error, "Context validation failed");
            return Err(error);
        }

        Ok(Context::new(self.name, self.components))
    }

    fn points<T: Injectable>(&mut self) -> Result<Arc<InjectionPoints<T>>, InjectError> {
        let key = TypeId::of::<T>();
        if let Some(points) = self
            .points
            .get(&key)
            .and_then(|cached| cached.clone().downcast::<InjectionPoints<T>>().ok())
        {
            return Ok(points);
        }

        let points = Arc::new(InjectionPoints::<T>::of()?);
        self.points.insert(key, points.clone());
        Ok(points)
    }

    fn scoped(
        &self,
        owner: &str,
        scope: Option<ScopeTag>,
        provider: Arc<dyn ComponentProvider>,
    ) -> Result<Arc<dyn ComponentProvider>, InjectError> {
        let Some(tag) = scope else {
            return Ok(provider);
        };

        self.scopes.create(&tag, provider).ok_or_else(|| {
            InjectError::illegal(
                owner,
                IllegalComponentReason::UnknownScope {
                    scope: tag.to_string(),
                },
            )
        })
    }

    fn register(
        &mut self,
        components: Vec<Component>,
        provider: Arc<dyn ComponentProvider>,
    ) -> Result<&mut Self, InjectError> {
        let mut requested = HashSet::with_capacity(components.len());
        if let Some(bound) = components.iter().find(|component| {
            self.components.contains_key(*component) || !requested.insert(*component)
        }) {
            let error = InjectError::DuplicateBinding {
                component: bound.clone(),
            };
            tracing::warn!(context = %self.name, error = %error, "Rejected binding");
            return Err(error);
        }

        for component in components {
            tracing::debug!(context = %self.name, component = %component, "Bound component");
            self.components.insert(component.clone(), provider.clone());
            self.order.push(component);
        }

        Ok(self)
    }

    fn reject<V>(&self, result: Result<V, InjectError>) -> Result<V, InjectError> {
        result.map_err(|error| {
            tracing::warn!(context = %self.name, error = %error, "Rejected binding");
            error
        })
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextConfig")
            .field("name", &self.name)
            .field("components", &self.order)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::autowiring::{ComponentDescriptor, Initializer, Param};
    use crate::container::descriptor::Qualifier;
    use crate::container::scope::Singleton;

    trait Clock: Send + Sync {}

    #[derive(Default)]
    struct SystemClock;
    impl Clock for SystemClock {}

    crate::implements!(SystemClock => dyn Clock);

    impl Injectable for SystemClock {
        fn descriptor() -> ComponentDescriptor<Self> {
            ComponentDescriptor::default_constructible()
        }
    }

    struct Reporter;

    impl Injectable for Reporter {
        fn descriptor() -> ComponentDescriptor<Self> {
            ComponentDescriptor::new().constructor(
                Initializer::new(|arguments| {
                    arguments.next::<dyn Clock>()?;
                    Ok(Reporter)
                })
                .param(Param::of::<dyn Clock>()),
            )
        }
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut config = ContextConfig::new();
        config.bind::<dyn Clock, SystemClock>().unwrap();

        let error = config.bind::<dyn Clock, SystemClock>().unwrap_err();
        assert!(error.is_duplicate());
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_qualifiers_share_one_registration_call() {
        let mut config = ContextConfig::new();
        config
            .bind_tagged::<dyn Clock, SystemClock>(vec![Tag::named("utc"), Tag::named("local")])
            .unwrap();

        assert!(config.is_bound(&Component::qualified::<dyn Clock>(Qualifier::named("utc"))));
        assert!(config.is_bound(&Component::qualified::<dyn Clock>(Qualifier::named("local"))));
        assert!(!config.is_bound(&Component::of::<dyn Clock>()));
    }

    #[test]
    fn test_duplicate_in_tag_list_leaves_registry_untouched() {
        let mut config = ContextConfig::new();
        config
            .bind_tagged::<dyn Clock, SystemClock>(vec![Tag::named("utc")])
            .unwrap();

        let result = config
            .bind_tagged::<dyn Clock, SystemClock>(vec![Tag::named("local"), Tag::named("utc")]);
        assert!(result.unwrap_err().is_duplicate());
        assert!(!config.is_bound(&Component::qualified::<dyn Clock>(Qualifier::named("local"))));
    }

    #[test]
    fn test_repeated_qualifier_in_one_call_rejected() {
        let mut config = ContextConfig::new();
        let error = config
            .bind_instance_tagged(Arc::new(1u32), vec![Tag::named("a"), Tag::named("a")])
            .unwrap_err();
        match error {
            InjectError::DuplicateBinding { component } => {
                assert_eq!(component, Component::qualified::<u32>(Qualifier::named("a")));
            }
            other => panic!("Expected DuplicateBinding, got {:?}", other),
        }
        assert!(config.is_empty());

        let result = config.bind_tagged::<dyn Clock, SystemClock>(vec![
            Tag::named("utc"),
            Tag::named("local"),
            Tag::named("utc"),
        ]);
        assert!(result.unwrap_err().is_duplicate());
        assert!(config.is_empty());
        assert!(config.components().is_empty());
    }

    #[test]
    fn test_unknown_scope_rejected_at_bind_time() {
        let mut config = ContextConfig::new();
        let error = config
            .bind_tagged::<SystemClock, SystemClock>(vec![Tag::scope::<Pooled>()])
            .unwrap_err();
        assert!(matches!(
            error.illegal_reason(),
            Some(IllegalComponentReason::UnknownScope { .. })
        ));
        assert!(config.is_empty());
    }

    #[test]
    fn test_settings_register_pooled_scope() {
        let settings = InjectSettings {
            name: "reports".to_string(),
            pool_capacity: 3,
            register_pooled: true,
        };
        let config = ContextConfig::with_settings(&settings).unwrap();

        assert_eq!(config.name(), "reports");
        assert!(config.has_scope(&ScopeTag::of::<Pooled>()));
        assert!(config.has_scope(&ScopeTag::of::<Singleton>()));
    }

    #[test]
    fn test_metadata_cached_per_implementation() {
        let mut config = ContextConfig::new();
        config.bind::<SystemClock, SystemClock>().unwrap();
        config.bind::<dyn Clock, SystemClock>().unwrap();
        assert_eq!(config.points.len(), 1);
    }

    #[test]
    fn test_build_context_reports_missing_dependency() {
        let mut config = ContextConfig::new();
        config.bind::<Reporter, Reporter>().unwrap();

        match config.build_context() {
            Err(InjectError::DependencyNotFound { dependency, component }) => {
                assert_eq!(dependency, Component::of::<dyn Clock>());
                assert_eq!(component, Component::of::<Reporter>());
            }
            other => panic!("Expected DependencyNotFound, got {:?}", other.map(|_| ())),
        }
    }
}
