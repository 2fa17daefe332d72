//! Semantic layers: a top-to-bottom reading order for architecture diagrams.

use crate::model::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SemanticLayer {
    People = 0,
    ExternalSystems = 1,
    EntryPoints = 2,
    Services = 3,
    DataStores = 4,
}

impl SemanticLayer {
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl From<SemanticLayer> for u8 {
    fn from(layer: SemanticLayer) -> Self {
        layer.index()
    }
}

impl TryFrom<u8> for SemanticLayer {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::People,
            1 => Self::ExternalSystems,
            2 => Self::EntryPoints,
            3 => Self::Services,
            4 => Self::DataStores,
            other => return Err(format!("semantic layer out of range: {other}")),
        })
    }
}

/// Keyword rules for containers and components, checked in order; the first rule with a keyword
/// contained in the haystack wins. Data stores come first so `api-gateway-cache` is a store.
pub const KEYWORD_RULES: &[(SemanticLayer, &[&str])] = &[
    (
        SemanticLayer::DataStores,
        &[
            "database",
            "db",
            "postgres",
            "postgresql",
            "mysql",
            "mongodb",
            "mongo",
            "redis",
            "cache",
            "memcached",
            "elasticsearch",
            "elastic",
            "kafka",
            "queue",
            "rabbitmq",
            "sqs",
            "pubsub",
            "kinesis",
            "stream",
            "storage",
            "s3",
            "blob",
            "bucket",
            "warehouse",
            "redshift",
            "bigquery",
            "dragonfly",
            "dynamodb",
            "cassandra",
            "cockroach",
            "timescale",
        ],
    ),
    (
        SemanticLayer::EntryPoints,
        &[
            "gateway",
            "api-gateway",
            "frontend",
            "web",
            "mobile",
            "app",
            "load-balancer",
            "proxy",
            "nginx",
            "cdn",
            "edge",
            "ingress",
            "graphql",
            "rest-api",
            "bff",
            "router",
        ],
    ),
];

pub fn classify(entity: &Entity<'_>) -> SemanticLayer {
    match entity {
        Entity::Person(_) => SemanticLayer::People,
        Entity::System(s) if s.external => SemanticLayer::ExternalSystems,
        Entity::System(_) => SemanticLayer::Services,
        Entity::Container(_) | Entity::Component(_) => {
            let haystack = haystack(entity);
            KEYWORD_RULES
                .iter()
                .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
                .map_or(SemanticLayer::Services, |(layer, _)| *layer)
        }
    }
}

/// Lowercased name, description, tags and technology joined by spaces.
fn haystack(entity: &Entity<'_>) -> String {
    let mut parts: Vec<&str> = vec![entity.name(), entity.description().unwrap_or_default()];
    parts.extend(entity.tags().iter().map(String::as_str));
    parts.extend(entity.technology().iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Person, SoftwareSystem};

    fn container(name: &str, technology: &[&str]) -> Container {
        Container {
            id: "c".to_string(),
            name: name.to_string(),
            technology: technology.iter().map(|t| t.to_string()).collect(),
            system_id: "sys".to_string(),
            ..Container::default()
        }
    }

    #[test]
    fn classify_people_and_systems() {
        let p = Person::default();
        assert_eq!(classify(&Entity::Person(&p)), SemanticLayer::People);

        let mut s = SoftwareSystem {
            external: true,
            ..SoftwareSystem::default()
        };
        assert_eq!(classify(&Entity::System(&s)), SemanticLayer::ExternalSystems);
        s.external = false;
        assert_eq!(classify(&Entity::System(&s)), SemanticLayer::Services);
    }

    #[test]
    fn classify_prefers_data_store_keywords() {
        let c = container("api-gateway-cache", &[]);
        assert_eq!(classify(&Entity::Container(&c)), SemanticLayer::DataStores);
    }

    #[test]
    fn classify_reads_technology_and_tags() {
        let c = container("Orders", &["PostgreSQL"]);
        assert_eq!(classify(&Entity::Container(&c)), SemanticLayer::DataStores);

        let mut c = container("Checkout", &[]);
        c.tags = vec!["Frontend".to_string()];
        assert_eq!(classify(&Entity::Container(&c)), SemanticLayer::EntryPoints);

        let c = container("Billing worker", &["Rust"]);
        assert_eq!(classify(&Entity::Container(&c)), SemanticLayer::Services);
    }

    #[test]
    fn semantic_layer_serializes_as_index() {
        assert_eq!(serde_json::to_string(&SemanticLayer::DataStores).unwrap(), "4");
        assert!(serde_json::from_str::<SemanticLayer>("7").is_err());
    }
}
