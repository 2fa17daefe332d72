//! Degree centrality over the relationship graph.
//!
//! Endpoints are reduced to their last dotted segment, so `shop.api` counts for `api`.

use crate::model::{ArchitectureModel, EntityKind};
use indexmap::IndexMap;
use serde::Serialize;

const TOP_NODES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeCentrality {
    pub incoming: usize,
    pub outgoing: usize,
}

impl NodeCentrality {
    pub fn degree(&self) -> usize {
        self.incoming + self.outgoing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub score: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CentralityReport {
    pub centrality: IndexMap<String, NodeCentrality>,
    pub top_nodes: Vec<TopNode>,
    /// Flow ids per entity, in first-seen order.
    pub flow_participation: IndexMap<String, Vec<String>>,
    /// Containers per system and components per container.
    pub children_count: IndexMap<String, usize>,
}

fn last_segment(endpoint: &str) -> &str {
    endpoint
        .rsplit('.')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(endpoint)
}

pub fn calculate(model: &ArchitectureModel) -> CentralityReport {
    let mut centrality: IndexMap<String, NodeCentrality> = model
        .entities()
        .map(|e| (e.id().to_string(), NodeCentrality::default()))
        .collect();

    for r in &model.relationships {
        if let Some(c) = centrality.get_mut(last_segment(&r.from)) {
            c.outgoing += 1;
        }
        if let Some(c) = centrality.get_mut(last_segment(&r.to)) {
            c.incoming += 1;
        }
    }

    let mut flow_participation: IndexMap<String, Vec<String>> = IndexMap::new();
    for flow in &model.flows {
        for step in &flow.steps {
            for endpoint in [&step.from, &step.to] {
                let flows = flow_participation
                    .entry(last_segment(endpoint).to_string())
                    .or_default();
                if !flows.contains(&flow.id) {
                    flows.push(flow.id.clone());
                }
            }
        }
    }

    let mut children_count: IndexMap<String, usize> = IndexMap::new();
    for s in &model.systems {
        children_count.insert(s.id.clone(), model.containers_of(&s.id).count());
    }
    for c in &model.containers {
        let components = model
            .components
            .iter()
            .filter(|comp| comp.container_id == c.id)
            .count();
        children_count.insert(c.id.clone(), components);
    }

    let mut top_nodes: Vec<TopNode> = model
        .entities()
        .map(|e| TopNode {
            id: e.id().to_string(),
            name: e.name().to_string(),
            kind: e.kind(),
            score: centrality.get(e.id()).map_or(0, NodeCentrality::degree),
        })
        .filter(|n| n.score > 0)
        .collect();
    top_nodes.sort_by(|a, b| b.score.cmp(&a.score));
    top_nodes.truncate(TOP_NODES);
    tracing::trace!(
        entities = centrality.len(),
        flows = model.flows.len(),
        "centrality calculated"
    );

    CentralityReport {
        centrality,
        top_nodes,
        flow_participation,
        children_count,
    }
}
