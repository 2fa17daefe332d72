#![forbid(unsafe_code)]

//! Headless layout for architecture diagrams.
//!
//! Flat views (landscape, context, container, component) go through the layered algorithm of
//! [`dugong`] with a grid fallback; deployment views are laid out as nested boxes. The
//! [`LayoutSession`] keeps the latest result and drops superseded ones.
//!
//! All APIs are runtime-agnostic: the only suspension point is the [`LayeredEngine`] future.

pub mod config;
pub mod deployment;
pub mod error;
pub mod flat;
pub mod model;
pub mod orchestrator;

pub use config::{
    DeploymentConfig, EdgeRouting, GridConfig, LayerHintMode, LayeredConfig, LayoutConfig,
    NodeDimensions,
};
pub use error::{Error, Result};
pub use flat::{
    DugongEngine, FlatLayout, LayerConstraint, LayeredEdge, LayeredEngine, LayeredGraph,
    LayeredNode, LayeredResult, build_graph, grid_layout, layout_flat, orthogonalize,
};
pub use model::{
    DeploymentPayload, EdgePayload, ElementData, ElementPayload, InstancePayload, Interaction,
    LayoutEdge, LayoutNode, LayoutOutput, LayoutState, NodeKind, NodePayload, Position, Size,
};
pub use orchestrator::{Computed, Generations, LayoutSession, Orchestrator, Ticket};
