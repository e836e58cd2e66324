use std::collections::HashSet;

use crate::container::context::ProviderMap;
use crate::container::descriptor::Component;
use crate::errors::InjectError;

/// Components currently being walked, root first
#[derive(Debug, Clone, Default)]
pub struct ResolutionPath {
    pub components: Vec<Component>,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn pop(&mut self) -> Option<Component> {
        self.components.pop()
    }

    /// Components from the first occurrence of `component` to the top of the path
    pub fn cycle_from(&self, component: &Component) -> Option<&[Component]> {
        self.components
            .iter()
            .position(|visiting| visiting == component)
            .map(|start| &self.components[start..])
    }

}

/// Depth-first check of a frozen binding map
///
/// Every direct dependency must be bound and must not lead back to a component
/// on the current path. Deferred references need a binding but are not followed.
pub struct DependencyValidator<'a> {
    components: &'a ProviderMap,
    verified: HashSet<Component>,
}

impl<'a> DependencyValidator<'a> {
    pub fn new(components: &'a ProviderMap) -> Self {
        Self {
            components,
            verified: HashSet::new(),
        }
    }

    /// Validate every root in order, stopping at the first failure
    pub fn validate<'c>(
        &mut self,
        roots: impl IntoIterator<Item = &'c Component>,
    ) -> Result<(), InjectError> {
        for root in roots {
            let mut path = ResolutionPath::new();
            path.push(root.clone());
            self.visit(root, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        component: &Component,
        path: &mut ResolutionPath,
    ) -> Result<(), InjectError> {
        if self.verified.contains(component) {
            return Ok(());
        }

        let components = self.components;
        let Some(provider) = components.get(component) else {
            return Ok(());
        };

        for dependency in provider.dependencies() {
            let target = dependency.component();
            if !components.contains_key(target) {
                return Err(InjectError::DependencyNotFound {
                    dependency: target.clone(),
                    component: component.clone(),
                });
            }

            if dependency.is_container() {
                continue;
            }

            if let Some(cycle) = path.cycle_from(target) {
                return Err(InjectError::CyclicDependency {
                    components: cycle.to_vec(),
                });
            }

            path.push(target.clone());
            self.visit(target, path)?;
            path.pop();
        }

        self.verified.insert(component.clone());
        Ok(())
    }
}
