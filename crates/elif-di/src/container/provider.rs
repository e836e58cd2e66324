use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::autowiring::{erase, DependencyResolver, Instance};
use crate::container::descriptor::ComponentRef;
use crate::errors::InjectError;

/// Executable unit producing a component and declaring what it depends on
pub trait ComponentProvider: Send + Sync {
    /// Produce an instance, resolving dependencies through `resolver`
    fn get(&self, resolver: &dyn DependencyResolver) -> Result<Instance, InjectError>;

    /// References this provider resolves when producing an instance
    fn dependencies(&self) -> Vec<ComponentRef> {
        Vec::new()
    }
}

/// Upcast from an implementation to the interface it is bound as
///
/// Every type implements it for itself; trait objects are wired with the
/// [`implements!`](crate::implements) macro.
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declare that an implementation may be bound as one or more trait objects
///
/// ```rust
/// use elif_di::implements;
///
/// trait Mailer: Send + Sync {}
/// struct SmtpMailer;
/// impl Mailer for SmtpMailer {}
///
/// implements!(SmtpMailer => dyn Mailer);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($interface:ty),+ $(,)?) => {
        $(
            impl $crate::container::Implements<$interface> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
                    self
                }
            }
        )+
    };
}

/// Provider handing out a pre-built instance
pub struct InstanceProvider {
    instance: Instance,
}

impl InstanceProvider {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

impl ComponentProvider for InstanceProvider {
    fn get(&self, _resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        Ok(self.instance.clone())
    }
}

/// Provider calling a factory function on every resolution
pub struct FactoryProvider<T: ?Sized> {
    factory: Box<dyn Fn() -> Result<Arc<T>, InjectError> + Send + Sync>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> FactoryProvider<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<T>, InjectError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> ComponentProvider for FactoryProvider<T> {
    fn get(&self, _resolver: &dyn DependencyResolver) -> Result<Instance, InjectError> {
        (self.factory)().map(erase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::autowiring::{downcast, Resolved};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyResolver;

    impl DependencyResolver for EmptyResolver {
        fn lookup(&self, _reference: &ComponentRef) -> Result<Option<Resolved>, InjectError> {
            Ok(None)
        }
    }

    trait Mailer: Send + Sync {
        fn transport(&self) -> &'static str;
    }

    struct SmtpMailer;

    impl Mailer for SmtpMailer {
        fn transport(&self) -> &'static str {
            "smtp"
        }
    }

    crate::implements!(SmtpMailer => dyn Mailer);

    #[test]
    fn test_instance_provider_returns_same_instance() {
        let provider = InstanceProvider::new(erase(Arc::new(SmtpMailer)));
        let first = downcast::<SmtpMailer>(&provider.get(&EmptyResolver).unwrap()).unwrap();
        let second = downcast::<SmtpMailer>(&provider.get(&EmptyResolver).unwrap()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(provider.dependencies().is_empty());
    }

    #[test]
    fn test_factory_provider_calls_factory_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let provider = FactoryProvider::<dyn Mailer>::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Implements::<dyn Mailer>::upcast(Arc::new(SmtpMailer)))
        });

        let mailer = downcast::<dyn Mailer>(&provider.get(&EmptyResolver).unwrap()).unwrap();
        provider.get(&EmptyResolver).unwrap();

        assert_eq!(mailer.transport(), "smtp");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_upcast_to_self() {
        let mailer = Arc::new(SmtpMailer);
        let same = Implements::<SmtpMailer>::upcast(mailer.clone());
        assert!(Arc::ptr_eq(&mailer, &same));
    }
}
