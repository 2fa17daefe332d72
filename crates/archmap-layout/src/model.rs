//! Output of a layout computation, as read by the rendering layer.

use archmap_core::{
    Component, Container, ContainerInstance, Entity, EntityKind, Person, SemanticLayer,
    SoftwareSystem,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Person,
    System,
    Container,
    Component,
    DeploymentGroup,
    DeploymentNode,
    Instance,
}

impl From<EntityKind> for NodeKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Person => Self::Person,
            EntityKind::System => Self::System,
            EntityKind::Container => Self::Container,
            EntityKind::Component => Self::Component,
        }
    }
}

/// Hints for the host about what a node reacts to. Wiring them up is the host's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interaction {
    Select,
    DrillDown,
}

/// An owned copy of the entity a node was created from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementData {
    Person(Person),
    System(SoftwareSystem),
    Container(Container),
    Component(Component),
}

impl From<Entity<'_>> for ElementData {
    fn from(entity: Entity<'_>) -> Self {
        match entity {
            Entity::Person(p) => Self::Person(p.clone()),
            Entity::System(s) => Self::System(s.clone()),
            Entity::Container(c) => Self::Container(c.clone()),
            Entity::Component(c) => Self::Component(c.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPayload {
    pub element: ElementData,
    pub layer: SemanticLayer,
    /// Only ever set on the system a view is focused on.
    pub is_focus: bool,
    /// The view's free-text filter does not match this element.
    pub dimmed: bool,
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technology: Vec<String>,
    pub depth: usize,
    pub child_count: usize,
    /// Instances kept after filtering. Instance nodes are only drawn for nodes without children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<ContainerInstance>,
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePayload {
    pub name: String,
    pub container_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    pub depth: usize,
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodePayload {
    Element(ElementPayload),
    Deployment(DeploymentPayload),
    Instance(InstancePayload),
}

/// A positioned node. Children of a deployment group are positioned relative to their parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    pub size: Size,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub payload: NodePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technology: Vec<String>,
    /// Routed bend points; empty when the grid fallback placed the nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub payload: EdgePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutOutput {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutOutput {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// What a [`crate::LayoutSession`] publishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub is_layouting: bool,
}
