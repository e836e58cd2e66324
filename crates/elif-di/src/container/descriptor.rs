use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::container::context::Deferred;

/// Runtime identity of a requested type
///
/// Equality and hashing only consider the `TypeId`; the type name is carried
/// for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ComponentType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentType {
    /// Identity of `T`, which may be unsized (`dyn Trait`)
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, generic arguments kept
    pub fn short_name(&self) -> &'static str {
        let head = self.type_name.split('<').next().unwrap_or(self.type_name);
        match head.rfind("::") {
            Some(index) => &self.type_name[index + 2..],
            None => self.type_name,
        }
    }

    /// Type name without module path nor generic arguments
    pub fn raw_name(&self) -> &'static str {
        let head = self.type_name.split('<').next().unwrap_or(self.type_name);
        match head.rfind("::") {
            Some(index) => &head[index + 2..],
            None => head,
        }
    }

    /// Check if this is the identity of `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Comparable marker disambiguating several bindings of the same type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Literal name, the equivalent of `@Named("...")`
    Named(String),
    /// Parameterless marker identified by a zero-sized type
    Marker(ComponentType),
}

impl Qualifier {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn marker<M: 'static>() -> Self {
        Self::Marker(ComponentType::of::<M>())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Named(name) => write!(f, "@Named(\"{}\")", name),
            Qualifier::Marker(marker) => write!(f, "@{}", marker.short_name()),
        }
    }
}

/// Component identifier combining type and optional qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    component_type: ComponentType,
    qualifier: Option<Qualifier>,
}

impl Component {
    pub fn new(component_type: ComponentType, qualifier: Option<Qualifier>) -> Self {
        Self {
            component_type,
            qualifier,
        }
    }

    /// Create an unqualified component for a type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(ComponentType::of::<T>(), None)
    }

    /// Create a qualified component for a type
    pub fn qualified<T: ?Sized + 'static>(qualifier: Qualifier) -> Self {
        Self::new(ComponentType::of::<T>(), Some(qualifier))
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.component_type.type_name()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} {}", qualifier, self.component_type),
            None => write!(f, "{}", self.component_type),
        }
    }
}

/// Wrapper type that carries a single component type
///
/// Implemented for the outer type of a parameterized declaration; `Raw` erases
/// the inner argument so that every `Vec<_>` shares one container identity.
pub trait Container: 'static {
    /// The wrapped component type
    type Component: ?Sized + 'static;

    /// Erased outer type identifying the container
    type Raw: 'static;

    fn container_type() -> ComponentType {
        ComponentType::of::<Self::Raw>()
    }
}

impl<T: ?Sized + 'static> Container for Deferred<T> {
    type Component = T;
    type Raw = Deferred<()>;
}

impl<T: 'static> Container for Vec<T> {
    type Component = T;
    type Raw = Vec<()>;
}

impl<T: 'static> Container for Option<T> {
    type Component = T;
    type Raw = Option<()>;
}

/// Request for a component, directly or through a wrapper container
///
/// Two references are equal only if both the component and the container are;
/// the container never takes part in the component identity itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    component: Component,
    container: Option<ComponentType>,
}

impl ComponentRef {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            container: None,
        }
    }

    /// Direct, unqualified reference to `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Component::of::<T>())
    }

    /// Direct, qualified reference to `T`
    pub fn qualified<T: ?Sized + 'static>(qualifier: Qualifier) -> Self {
        Self::new(Component::qualified::<T>(qualifier))
    }

    /// Reference declared through a wrapper container such as `Deferred<T>`
    pub fn contained<C: Container>(qualifier: Option<Qualifier>) -> Self {
        Self {
            component: Component::new(ComponentType::of::<C::Component>(), qualifier),
            container: Some(C::container_type()),
        }
    }

    /// Unqualified reference to a deferred handle of `T`
    pub fn deferred<T: ?Sized + 'static>() -> Self {
        Self::contained::<Deferred<T>>(None)
    }

    pub(crate) fn within(mut self, container: ComponentType) -> Self {
        self.container = Some(container);
        self
    }

    /// Replace the qualifier of the referenced component
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.component.qualifier = Some(qualifier);
        self
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_type(&self) -> ComponentType {
        self.component.component_type()
    }

    pub fn container(&self) -> Option<ComponentType> {
        self.container
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    /// Check if the reference asks for a deferred handle
    pub fn is_deferred(&self) -> bool {
        self.container
            .map(|container| container.is::<Deferred<()>>())
            .unwrap_or(false)
    }
}

impl From<Component> for ComponentRef {
    fn from(component: Component) -> Self {
        Self::new(component)
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            Some(container) => write!(f, "{}<{}>", container.raw_name(), self.component),
            None => write!(f, "{}", self.component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Dependency: Send + Sync {}
    struct SkyWalker;
    struct Other;

    #[test]
    fn test_component_identity_is_structural() {
        assert_eq!(Component::of::<dyn Dependency>(), Component::of::<dyn Dependency>());
        assert_eq!(
            Component::qualified::<dyn Dependency>(Qualifier::named("ChosenOne")),
            Component::qualified::<dyn Dependency>(Qualifier::named("ChosenOne"))
        );
        assert_ne!(
            Component::qualified::<dyn Dependency>(Qualifier::named("ChosenOne")),
            Component::qualified::<dyn Dependency>(Qualifier::named("Owner"))
        );
        assert_ne!(
            Component::of::<dyn Dependency>(),
            Component::qualified::<dyn Dependency>(Qualifier::marker::<SkyWalker>())
        );
        assert_eq!(Qualifier::marker::<SkyWalker>(), Qualifier::marker::<SkyWalker>());
        assert_ne!(Qualifier::marker::<SkyWalker>(), Qualifier::marker::<Other>());
    }

    #[test]
    fn test_container_detected_from_declared_type() {
        let reference = ComponentRef::contained::<Deferred<dyn Dependency>>(None);

        assert!(reference.is_container());
        assert!(reference.is_deferred());
        assert_eq!(reference.component(), &Component::of::<dyn Dependency>());
        assert_eq!(reference, ComponentRef::deferred::<dyn Dependency>());
    }

    #[test]
    fn test_container_does_not_change_component_identity() {
        let direct = ComponentRef::of::<String>();
        let deferred = ComponentRef::deferred::<String>();
        let listed = ComponentRef::contained::<Vec<String>>(None);

        assert_ne!(direct, deferred);
        assert_ne!(deferred, listed);
        assert_eq!(direct.component(), deferred.component());
        assert_eq!(direct.component(), listed.component());
        assert!(!listed.is_deferred());
        assert_eq!(
            ComponentRef::contained::<Vec<String>>(None).container(),
            ComponentRef::contained::<Vec<u8>>(None).container()
        );
    }

    #[test]
    fn test_display() {
        let reference =
            ComponentRef::deferred::<String>().with_qualifier(Qualifier::named("Owner"));
        assert_eq!(reference.to_string(), "Deferred<@Named(\"Owner\") alloc::string::String>");
        assert_eq!(Qualifier::marker::<SkyWalker>().to_string(), "@SkyWalker");
        assert_eq!(ComponentType::of::<Vec<String>>().short_name(), "Vec<alloc::string::String>");
    }
}
