use std::fmt;

use crate::container::descriptor::{Component, ComponentType, Qualifier};
use crate::container::scope::ScopeTag;
use crate::errors::{IllegalComponentReason, InjectError};

/// Tag attached to a binding call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Binds the component under a qualified identity
    Qualifier(Qualifier),
    /// Selects the lifecycle scope of the binding
    Scope(ScopeTag),
    /// A marker that is neither a qualifier nor a scope; always rejected
    Marker(ComponentType),
}

impl Tag {
    pub fn named(name: impl Into<String>) -> Self {
        Tag::Qualifier(Qualifier::named(name))
    }

    pub fn qualifier(qualifier: Qualifier) -> Self {
        Tag::Qualifier(qualifier)
    }

    pub fn scope<S: 'static>() -> Self {
        Tag::Scope(ScopeTag::of::<S>())
    }

    pub fn marker<M: 'static>() -> Self {
        Tag::Marker(ComponentType::of::<M>())
    }
}

impl From<Qualifier> for Tag {
    fn from(qualifier: Qualifier) -> Self {
        Tag::Qualifier(qualifier)
    }
}

impl From<ScopeTag> for Tag {
    fn from(scope: ScopeTag) -> Self {
        Tag::Scope(scope)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Qualifier(qualifier) => write!(f, "{}", qualifier),
            Tag::Scope(scope) => write!(f, "{}", scope),
            Tag::Marker(marker) => write!(f, "@{}", marker.short_name()),
        }
    }
}

/// Tags of one binding call, grouped by kind
#[derive(Debug, Clone)]
pub(crate) struct Bindings {
    qualifiers: Vec<Qualifier>,
    scopes: Vec<ScopeTag>,
}

impl Bindings {
    /// Component bindings accept qualifier and scope tags
    pub(crate) fn component(implementation: &str, tags: Vec<Tag>) -> Result<Self, InjectError> {
        Self::parse(implementation, tags, true)
    }

    /// Instance bindings accept qualifier tags only
    pub(crate) fn instance(component_type: &str, tags: Vec<Tag>) -> Result<Self, InjectError> {
        Self::parse(component_type, tags, false)
    }

    fn parse(owner: &str, tags: Vec<Tag>, allow_scopes: bool) -> Result<Self, InjectError> {
        let mut qualifiers = Vec::new();
        let mut scopes = Vec::new();
        let mut illegal = Vec::new();

        for tag in tags {
            match tag {
                Tag::Qualifier(qualifier) => qualifiers.push(qualifier),
                Tag::Scope(scope) if allow_scopes => scopes.push(scope),
                other => illegal.push(other.to_string()),
            }
        }

        if !illegal.is_empty() {
            return Err(InjectError::illegal(
                owner,
                IllegalComponentReason::UnqualifiedTags { tags: illegal },
            ));
        }

        Ok(Self { qualifiers, scopes })
    }

    /// Identities registered by the call: unqualified when no qualifier was given
    pub(crate) fn components(&self, component_type: ComponentType) -> Vec<Component> {
        if self.qualifiers.is_empty() {
            return vec![Component::new(component_type, None)];
        }
        self.qualifiers
            .iter()
            .map(|qualifier| Component::new(component_type, Some(qualifier.clone())))
            .collect()
    }

    /// Effective scope; binding-time tags take precedence over the type's own
    pub(crate) fn scope(
        &self,
        owner: &str,
        declared: &[ScopeTag],
    ) -> Result<Option<ScopeTag>, InjectError> {
        let scopes: &[ScopeTag] = if self.scopes.is_empty() {
            declared
        } else {
            &self.scopes
        };

        if scopes.len() > 1 {
            return Err(InjectError::illegal(
                owner,
                IllegalComponentReason::MultipleScopes {
                    scopes: scopes.iter().map(ToString::to_string).collect(),
                },
            ));
        }

        Ok(scopes.first().copied())
    }
}
