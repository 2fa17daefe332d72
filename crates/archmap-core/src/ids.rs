//! Id forms of an entity.
//!
//! Relationships and deployment instances address containers and components either by their
//! simple id (`api`) or by the dotted path through their parents (`shop.api`,
//! `shop.api.handler`). Resolution is structural only: nothing here looks at relationships or
//! siblings.

use crate::model::Entity;
use rustc_hash::FxHashMap as HashMap;

/// Every id an endpoint may use for `entity`. The simple id always comes first.
pub fn ids_of(entity: &Entity<'_>) -> Vec<String> {
    let mut ids = vec![entity.id().to_string()];
    match entity {
        Entity::Container(c) if !c.system_id.is_empty() => {
            ids.push(format!("{}.{}", c.system_id, c.id));
        }
        Entity::Component(c) if !c.system_id.is_empty() && !c.container_id.is_empty() => {
            ids.push(format!("{}.{}.{}", c.system_id, c.container_id, c.id));
        }
        _ => {}
    }
    ids
}

pub fn matches(endpoint: &str, entity: &Entity<'_>) -> bool {
    if endpoint == entity.id() {
        return true;
    }
    ids_of(entity).iter().any(|id| id == endpoint)
}

/// Case-insensitive substring search over name, description and tags. An empty query matches
/// everything.
pub fn matches_query(entity: &Entity<'_>, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    let hit = |text: &str| text.to_lowercase().contains(&query);
    hit(entity.name())
        || entity.description().is_some_and(hit)
        || entity.tags().iter().any(|tag| hit(tag))
}

/// Maps every id form of a set of entities to the entity's simple id.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    by_form: HashMap<String, String>,
}

impl IdIndex {
    /// Later entities overwrite earlier ones when two of them share an id form.
    pub fn build<'a, 'm: 'a>(entities: impl IntoIterator<Item = &'a Entity<'m>>) -> Self {
        let mut by_form = HashMap::default();
        for entity in entities {
            for form in ids_of(entity) {
                by_form.insert(form, entity.id().to_string());
            }
        }
        Self { by_form }
    }

    pub fn resolve(&self, endpoint: &str) -> Option<&str> {
        self.by_form.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_form.is_empty()
    }
}
