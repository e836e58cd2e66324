use serde::Serialize;

use crate::container::context::Context;
use crate::container::descriptor::Component;
use crate::errors::InjectError;

/// Dependency graph visualization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON representation of a [`GraphSnapshot`]
    Json,
}

/// Visualization style configuration
#[derive(Debug, Clone)]
pub struct VisualizationStyle {
    /// Include edges of deferred references
    pub show_deferred: bool,
    /// Keep only components whose type name contains one of these
    pub filter_types: Option<Vec<String>>,
}

impl Default for VisualizationStyle {
    fn default() -> Self {
        Self {
            show_deferred: true,
            filter_types: None,
        }
    }
}

/// Bound component in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub component_type: String,
    pub qualifier: Option<String>,
}

/// Declared dependency between two bound components
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub deferred: bool,
    pub container: Option<String>,
}

/// Serializable view of a validated context, sorted by node id
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub context: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn from_context(context: &Context) -> Self {
        let mut components: Vec<&Component> = context.components().collect();
        components.sort_by_key(|component| component.to_string());

        let nodes = components
            .iter()
            .map(|component| GraphNode {
                id: component.to_string(),
                component_type: component.type_name().to_string(),
                qualifier: component.qualifier().map(ToString::to_string),
            })
            .collect();

        let edges = components
            .iter()
            .flat_map(|component| {
                context
                    .dependencies_of(component)
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |dependency| GraphEdge {
                        from: component.to_string(),
                        to: dependency.component().to_string(),
                        deferred: dependency.is_deferred(),
                        container: dependency
                            .container()
                            .map(|container| container.raw_name().to_string()),
                    })
            })
            .collect();

        Self {
            context: context.name().to_string(),
            nodes,
            edges,
        }
    }

    fn filtered(&self, style: &VisualizationStyle) -> Self {
        let keep = |component_type: &str| match &style.filter_types {
            Some(filter) => filter.iter().any(|f| component_type.contains(f.as_str())),
            None => true,
        };

        let nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|node| keep(&node.component_type))
            .cloned()
            .collect();
        let kept = |id: &str| nodes.iter().any(|node| node.id == id);
        let edges = self
            .edges
            .iter()
            .filter(|edge| style.show_deferred || !edge.deferred)
            .filter(|edge| kept(&edge.from))
            .cloned()
            .collect();

        Self {
            context: self.context.clone(),
            nodes,
            edges,
        }
    }
}

/// Renders the dependency graph of a context
pub struct DependencyVisualizer {
    snapshot: GraphSnapshot,
}

impl DependencyVisualizer {
    pub fn new(context: &Context) -> Self {
        Self::from_snapshot(GraphSnapshot::from_context(context))
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn visualize(
        &self,
        format: VisualizationFormat,
        style: VisualizationStyle,
    ) -> Result<String, InjectError> {
        let snapshot = self.snapshot.filtered(&style);
        match format {
            VisualizationFormat::Dot => Ok(generate_dot(&snapshot)),
            VisualizationFormat::Json => Ok(serde_json::to_string_pretty(&snapshot)?),
        }
    }
}

fn generate_dot(snapshot: &GraphSnapshot) -> String {
    let mut dot = String::new();
    dot.push_str(&format!("digraph \"{}\" {{\n", escape(&snapshot.context)));
    dot.push_str("    rankdir=TB;\n");
    dot.push_str("    node [shape=rectangle];\n\n");

    for node in &snapshot.nodes {
        dot.push_str(&format!("    \"{}\";\n", escape(&node.id)));
    }

    if !snapshot.edges.is_empty() {
        dot.push('\n');
    }

    for edge in &snapshot.edges {
        let style = if edge.deferred { " [style=dashed]" } else { "" };
        dot.push_str(&format!(
            "    \"{}\" -> \"{}\"{};\n",
            escape(&edge.from),
            escape(&edge.to),
            style
        ));
    }

    dot.push_str("}\n");
    dot
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}
