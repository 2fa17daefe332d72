//! Layered layout of flat entity graphs, with a grid fallback.

use crate::config::{EdgeRouting, GridConfig, LayerHintMode, LayeredConfig, LayoutConfig};
use crate::error::{Error, Result};
use crate::model::Position;
use archmap_core::{Entity, IdIndex, Relationship, SemanticLayer, classify};
use dugong::graphlib::{Graph, GraphOptions};
use dugong::{EdgeLabel, GraphLabel, NodeLabel};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::future::Future;

/// Where a node must sit relative to the nodes it is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerConstraint {
    #[default]
    None,
    /// No edge may enter the node.
    First,
    /// No edge may leave the node.
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayeredNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub layer_constraint: LayerConstraint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayeredEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Input of the layered algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredGraph {
    pub nodes: Vec<LayeredNode>,
    pub edges: Vec<LayeredEdge>,
}

/// Output of the layered algorithm: top-left corners per node id and points per edge id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredResult {
    pub positions: IndexMap<String, Position>,
    pub routes: IndexMap<String, Vec<Position>>,
    pub width: f64,
    pub height: f64,
}

/// The layered graph drawing algorithm, behind a future so hosts can run it off-thread or load
/// it lazily.
pub trait LayeredEngine {
    type Error: std::error::Error;

    fn layout<'a>(
        &'a self,
        graph: &'a LayeredGraph,
        config: &'a LayeredConfig,
    ) -> impl Future<Output = std::result::Result<LayeredResult, Self::Error>> + 'a;
}

/// Runs [`dugong::layout`] inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DugongEngine;

impl DugongEngine {
    pub fn run(&self, graph: &LayeredGraph, config: &LayeredConfig) -> Result<LayeredResult> {
        validate(graph)?;

        let mut g = Graph::<NodeLabel, EdgeLabel, GraphLabel>::new(GraphOptions {
            directed: true,
            multigraph: true,
            compound: false,
        });
        g.set_graph(config.graph_label());
        for node in &graph.nodes {
            g.set_node(
                node.id.clone(),
                NodeLabel {
                    width: node.width,
                    height: node.height,
                    ..Default::default()
                },
            );
        }
        for edge in &graph.edges {
            let label = EdgeLabel {
                width: 0.0,
                height: 0.0,
                minlen: 1,
                weight: 1.0,
                ..Default::default()
            };
            g.set_edge_named(
                edge.source.clone(),
                edge.target.clone(),
                Some(edge.id.clone()),
                Some(label),
            );
        }

        dugong::layout(&mut g)?;

        let positions = graph
            .nodes
            .iter()
            .map(|node| {
                let center = g
                    .node(&node.id)
                    .map(|n| (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0)))
                    .unwrap_or_default();
                let corner = Position::new(
                    center.0 - node.width / 2.0,
                    center.1 - node.height / 2.0,
                );
                (node.id.clone(), corner)
            })
            .collect();
        let routes = graph
            .edges
            .iter()
            .map(|edge| {
                let points: Vec<Position> = g
                    .edge(&edge.source, &edge.target, Some(edge.id.as_str()))
                    .map(|e| e.points.iter().map(|p| Position::new(p.x, p.y)).collect())
                    .unwrap_or_default();
                let points = match config.edge_routing {
                    EdgeRouting::Orthogonal => orthogonalize(&points),
                    EdgeRouting::Polyline => points,
                };
                (edge.id.clone(), points)
            })
            .collect();

        Ok(LayeredResult {
            positions,
            routes,
            width: g.graph().width,
            height: g.graph().height,
        })
    }
}

impl LayeredEngine for DugongEngine {
    type Error = Error;

    fn layout<'a>(
        &'a self,
        graph: &'a LayeredGraph,
        config: &'a LayeredConfig,
    ) -> impl Future<Output = Result<LayeredResult>> + 'a {
        std::future::ready(self.run(graph, config))
    }
}

fn validate(graph: &LayeredGraph) -> Result<()> {
    let mut constraints: HashMap<&str, LayerConstraint> = HashMap::default();
    for node in &graph.nodes {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(node.width) || !valid(node.height) {
            return Err(Error::InvalidNodeSize {
                id: node.id.clone(),
                width: node.width,
                height: node.height,
            });
        }
        if constraints
            .insert(node.id.as_str(), node.layer_constraint)
            .is_some()
        {
            return Err(Error::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }

    let mut edge_ids: HashSet<&str> = HashSet::default();
    for edge in &graph.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(Error::DuplicateEdge {
                id: edge.id.clone(),
            });
        }
        let constraint_of = |node: &str| {
            constraints
                .get(node)
                .copied()
                .ok_or_else(|| Error::MissingEndpoint {
                    edge: edge.id.clone(),
                    node: node.to_string(),
                })
        };
        let source = constraint_of(&edge.source)?;
        let target = constraint_of(&edge.target)?;
        if edge.source == edge.target {
            continue;
        }
        let violated = if target == LayerConstraint::First {
            Some(&edge.target)
        } else if source == LayerConstraint::Last {
            Some(&edge.source)
        } else {
            None
        };
        if let Some(node) = violated {
            return Err(Error::LayerConstraint {
                edge: edge.id.clone(),
                node: node.clone(),
            });
        }
    }
    Ok(())
}

/// Replaces every diagonal step with a vertical-horizontal-vertical elbow at mid height.
pub fn orthogonalize(points: &[Position]) -> Vec<Position> {
    const EPS: f64 = 1e-6;
    let mut out: Vec<Position> = Vec::with_capacity(points.len() * 2);
    for &p in points {
        let Some(&last) = out.last() else {
            out.push(p);
            continue;
        };
        if (last.x - p.x).abs() > EPS && (last.y - p.y).abs() > EPS {
            let mid = (last.y + p.y) / 2.0;
            out.push(Position::new(last.x, mid));
            out.push(Position::new(p.x, mid));
        }
        if out
            .last()
            .is_none_or(|q| (q.x - p.x).abs() > EPS || (q.y - p.y).abs() > EPS)
        {
            out.push(p);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatLayout {
    /// Top-left corner per entity id, in entity order.
    pub positions: IndexMap<String, Position>,
    /// Routed points per relationship index.
    pub routes: HashMap<usize, Vec<Position>>,
    pub width: f64,
    pub height: f64,
    pub fallback: bool,
}

/// One relationship whose endpoints both resolve to an entity: `(index, source id, target id)`.
///
/// Endpoints go through [`IdIndex`], so every caller projects an endpoint onto the same entity.
pub fn resolve_relationships<'i>(
    index: &'i IdIndex,
    relationships: &[Relationship],
) -> Vec<(usize, &'i str, &'i str)> {
    relationships
        .iter()
        .enumerate()
        .filter_map(|(i, r)| Some((i, index.resolve(&r.from)?, index.resolve(&r.to)?)))
        .collect()
}

/// Builds the algorithm input: one node per entity and one edge `e{index}` per relationship
/// whose endpoints both resolve to an entity of `entities`.
pub fn build_graph(
    entities: &[Entity<'_>],
    relationships: &[Relationship],
    config: &LayoutConfig,
) -> LayeredGraph {
    let nodes = entities
        .iter()
        .map(|e| {
            let size = config.dimensions.of(e.kind());
            LayeredNode {
                id: e.id().to_string(),
                width: size.width,
                height: size.height,
                layer_constraint: layer_constraint(classify(e), config.layer_hints),
            }
        })
        .collect();

    let index = IdIndex::build(entities);
    let edges = resolve_relationships(&index, relationships)
        .into_iter()
        .map(|(i, source, target)| LayeredEdge {
            id: format!("e{i}"),
            source: source.to_string(),
            target: target.to_string(),
        })
        .collect();

    LayeredGraph { nodes, edges }
}

fn layer_constraint(layer: SemanticLayer, mode: LayerHintMode) -> LayerConstraint {
    match (mode, layer) {
        (LayerHintMode::None, _) => LayerConstraint::None,
        (LayerHintMode::Strict, SemanticLayer::People) => LayerConstraint::First,
        (LayerHintMode::Strict, SemanticLayer::DataStores) => LayerConstraint::Last,
        (LayerHintMode::Strict, _) => LayerConstraint::None,
    }
}

/// Row-major grid in entity order.
pub fn grid_layout(entities: &[Entity<'_>], grid: &GridConfig) -> FlatLayout {
    let columns = grid.columns.max(1);
    let positions = entities
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let (row, col) = (i / columns, i % columns);
            (
                e.id().to_string(),
                Position::new(col as f64 * grid.spacing_x, row as f64 * grid.spacing_y),
            )
        })
        .collect();

    FlatLayout {
        positions,
        routes: HashMap::default(),
        width: entities.len().min(columns) as f64 * grid.spacing_x,
        height: entities.len().div_ceil(columns) as f64 * grid.spacing_y,
        fallback: true,
    }
}

/// Lays out `entities`. Never fails: algorithm errors are logged and answered with
/// [`grid_layout`]. An empty entity list never reaches the algorithm.
pub async fn layout_flat<E: LayeredEngine>(
    engine: &E,
    entities: &[Entity<'_>],
    relationships: &[Relationship],
    config: &LayoutConfig,
) -> FlatLayout {
    if entities.is_empty() {
        return FlatLayout::default();
    }

    let graph = build_graph(entities, relationships, config);
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "layered layout: start"
    );

    match engine.layout(&graph, &config.layered).await {
        Ok(result) => from_result(result),
        Err(err) => {
            tracing::warn!(
                error = %err,
                nodes = graph.nodes.len(),
                edges = graph.edges.len(),
                "layered layout failed; using grid fallback"
            );
            grid_layout(entities, &config.grid)
        }
    }
}

fn from_result(result: LayeredResult) -> FlatLayout {
    let routes = result
        .routes
        .into_iter()
        .filter_map(|(id, points)| {
            let index = id.strip_prefix('e')?.parse::<usize>().ok()?;
            Some((index, points))
        })
        .collect();

    FlatLayout {
        positions: result.positions,
        routes,
        width: result.width,
        height: result.height,
        fallback: false,
    }
}
