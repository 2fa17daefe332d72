#![forbid(unsafe_code)]

//! Architecture model and structural helpers (headless).
//!
//! The model addresses nested entities two ways: simple ids (`api`) and dotted paths
//! (`shop.api`). [`ids`] turns an entity into every form an endpoint may use, [`classify`] assigns
//! the semantic layer used as a placement hint and [`view`] picks the entities a flat view shows.

pub mod centrality;
pub mod classify;
pub mod error;
pub mod ids;
pub mod model;
pub mod view;

pub use classify::{SemanticLayer, classify};
pub use error::{Error, Result};
pub use ids::{IdIndex, ids_of, matches, matches_query};
pub use model::{
    ArchitectureModel, Component, Container, ContainerInstance, Deployment, DeploymentNode,
    Entity, EntityKind, Flow, FlowStep, Person, Relationship, SoftwareSystem,
};
pub use view::{View, ViewKind, visible_entities};
