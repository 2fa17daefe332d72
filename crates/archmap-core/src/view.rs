//! View descriptors and the entities each flat view shows.

use crate::error::{Error, Result};
use crate::ids;
use crate::model::{ArchitectureModel, Entity};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Landscape,
    Context,
    Container,
    Component,
    Deployment,
    /// Anything a host sends that this engine does not know; shows nothing.
    #[serde(other)]
    Unknown,
}

impl FromStr for ViewKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "landscape" => Self::Landscape,
            "context" => Self::Context,
            "container" => Self::Container,
            "component" => Self::Component,
            "deployment" => Self::Deployment,
            _ => {
                return Err(Error::UnknownView {
                    kind: s.to_string(),
                });
            }
        })
    }
}

/// What the host wants to look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct View {
    pub kind: ViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl View {
    pub fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn with_selected(mut self, selected: impl Into<String>) -> Self {
        self.selected = Some(selected.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The focus id, treating an empty string as no focus.
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref().filter(|f| !f.is_empty())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref().filter(|s| !s.is_empty())
    }
}

/// Entities shown by a flat view, in drawing order. Deployment and unknown views show none.
pub fn visible_entities<'m>(
    model: &'m ArchitectureModel,
    kind: ViewKind,
    focus: Option<&str>,
) -> Vec<Entity<'m>> {
    match (kind, focus) {
        (ViewKind::Landscape, _) | (ViewKind::Context, None) => people_and_systems(model).collect(),
        (ViewKind::Context, Some(focus)) => context(model, focus),
        (ViewKind::Container, Some(focus)) => container(model, focus),
        (ViewKind::Component, Some(focus)) => component(model, focus),
        (ViewKind::Container | ViewKind::Component, None)
        | (ViewKind::Deployment | ViewKind::Unknown, _) => Vec::new(),
    }
}

fn people_and_systems(model: &ArchitectureModel) -> impl Iterator<Item = Entity<'_>> {
    model
        .persons
        .iter()
        .map(Entity::Person)
        .chain(model.systems.iter().map(Entity::System))
}

/// The focus plus its direct neighbours, by raw endpoint equality.
fn context<'m>(model: &'m ArchitectureModel, focus: &str) -> Vec<Entity<'m>> {
    let mut related: Vec<&str> = vec![focus];
    for r in &model.relationships {
        if r.from == focus {
            related.push(&r.to);
        }
        if r.to == focus {
            related.push(&r.from);
        }
    }
    people_and_systems(model)
        .filter(|e| related.contains(&e.id()))
        .collect()
}

/// True when a relationship links the simple id `id` with any entity of `inside`.
fn linked_to_any(model: &ArchitectureModel, id: &str, inside: &[Entity<'_>]) -> bool {
    model.relationships.iter().any(|r| {
        (r.from == id && inside.iter().any(|e| ids::matches(&r.to, e)))
            || (r.to == id && inside.iter().any(|e| ids::matches(&r.from, e)))
    })
}

fn container<'m>(model: &'m ArchitectureModel, system_id: &str) -> Vec<Entity<'m>> {
    let containers: Vec<Entity<'m>> = model
        .containers_of(system_id)
        .map(Entity::Container)
        .collect();
    let mut out: Vec<Entity<'m>> = people_and_systems(model)
        .filter(|e| linked_to_any(model, e.id(), &containers))
        .collect();
    out.extend(containers);
    out
}

fn component<'m>(model: &'m ArchitectureModel, container_id: &str) -> Vec<Entity<'m>> {
    let components: Vec<Entity<'m>> = model
        .components
        .iter()
        .filter(|c| c.container_id == container_id)
        .map(Entity::Component)
        .collect();
    let Some(focused) = model.container(container_id) else {
        return components;
    };

    if components.is_empty() {
        let focused_ids = ids::ids_of(&Entity::Container(focused));
        let mut connected: Vec<&str> = Vec::new();
        for r in &model.relationships {
            if focused_ids.contains(&r.from) {
                connected.push(&r.to);
            }
            if focused_ids.contains(&r.to) {
                connected.push(&r.from);
            }
        }
        let is_connected =
            |e: &Entity<'_>| ids::ids_of(e).iter().any(|id| connected.contains(&id.as_str()));

        let mut out = vec![Entity::Container(focused)];
        out.extend(people_and_systems(model).filter(|e| is_connected(e)));
        out.extend(
            model
                .containers
                .iter()
                .filter(|c| c.id != focused.id)
                .map(Entity::Container)
                .filter(|e| is_connected(e)),
        );
        return out;
    }

    // Sibling containers related to one of the components, by simple id only.
    let component_ids: Vec<&str> = components.iter().map(|e| e.id()).collect();
    let mut out: Vec<Entity<'m>> = model
        .containers_of(&focused.system_id)
        .filter(|c| {
            model.relationships.iter().any(|r| {
                (r.from == c.id && component_ids.contains(&r.to.as_str()))
                    || (r.to == c.id && component_ids.contains(&r.from.as_str()))
            })
        })
        .map(Entity::Container)
        .collect();
    out.extend(components);
    out
}
