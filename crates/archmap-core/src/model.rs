//! Architecture model as exported by the modelling tool.
//!
//! Every collection defaults to empty and unknown fields are ignored, so partial documents load.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchitectureModel {
    pub persons: Vec<Person>,
    pub systems: Vec<SoftwareSystem>,
    pub containers: Vec<Container>,
    pub components: Vec<Component>,
    pub relationships: Vec<Relationship>,
    pub flows: Vec<Flow>,
    pub deployments: Vec<Deployment>,
}

impl ArchitectureModel {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Persons, systems, containers, then components, each in document order.
    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.persons
            .iter()
            .map(Entity::Person)
            .chain(self.systems.iter().map(Entity::System))
            .chain(self.containers.iter().map(Entity::Container))
            .chain(self.components.iter().map(Entity::Component))
    }

    pub fn system(&self, id: &str) -> Option<&SoftwareSystem> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn containers_of<'a>(&'a self, system_id: &str) -> impl Iterator<Item = &'a Container> {
        self.containers
            .iter()
            .filter(move |c| c.system_id == system_id)
    }

    pub fn deployment(&self, id: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftwareSystem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub external: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(
        deserialize_with = "technology",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub technology: Vec<String>,
    pub system_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(
        deserialize_with = "technology",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub technology: Vec<String>,
    pub system_id: String,
    pub container_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        deserialize_with = "technology",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub technology: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<FlowStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowStep {
    pub seq: u32,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        deserialize_with = "technology",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub technology: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<DeploymentNode>,
}

/// A node of the infrastructure tree (region, zone, cluster, host, ...).
///
/// When both `children` and `instances` are present, `children` wins: the instances are only
/// drawn for nodes without children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentNode {
    pub id: String,
    pub name: String,
    #[serde(
        deserialize_with = "technology",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub technology: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeploymentNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<ContainerInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerInstance {
    /// Simple (`api`) or dotted (`shop.api`) container reference.
    pub container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

/// `"Rust, Axum"` and `["Rust", "Axum"]` both load as a list; `null` and `""` load as empty.
fn technology<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Repr::List(values)) => values,
        Some(Repr::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    System,
    Container,
    Component,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::System => "system",
            Self::Container => "container",
            Self::Component => "component",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed view of one person, system, container or component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity<'a> {
    Person(&'a Person),
    System(&'a SoftwareSystem),
    Container(&'a Container),
    Component(&'a Component),
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Person(_) => EntityKind::Person,
            Self::System(_) => EntityKind::System,
            Self::Container(_) => EntityKind::Container,
            Self::Component(_) => EntityKind::Component,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            Self::Person(p) => &p.id,
            Self::System(s) => &s.id,
            Self::Container(c) => &c.id,
            Self::Component(c) => &c.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Person(p) => &p.name,
            Self::System(s) => &s.name,
            Self::Container(c) => &c.name,
            Self::Component(c) => &c.name,
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        match self {
            Self::Person(p) => p.description.as_deref(),
            Self::System(s) => s.description.as_deref(),
            Self::Container(c) => c.description.as_deref(),
            Self::Component(c) => c.description.as_deref(),
        }
    }

    pub fn tags(&self) -> &'a [String] {
        match self {
            Self::Person(p) => &p.tags,
            Self::System(s) => &s.tags,
            Self::Container(c) => &c.tags,
            Self::Component(c) => &c.tags,
        }
    }

    /// Empty for persons and systems.
    pub fn technology(&self) -> &'a [String] {
        match self {
            Self::Person(_) | Self::System(_) => &[],
            Self::Container(c) => &c.technology,
            Self::Component(c) => &c.technology,
        }
    }
}
