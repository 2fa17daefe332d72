//! Entry point: picks a strategy per view, runs it and projects the result into output nodes and
//! edges.
//!
//! Computations may suspend inside the layered engine. A newer request does not cancel an older
//! one; instead every request carries a [`Ticket`] and only the result holding the latest ticket
//! is published.

use crate::config::LayoutConfig;
use crate::deployment::layout_deployment;
use crate::flat::{DugongEngine, FlatLayout, LayeredEngine, layout_flat, resolve_relationships};
use crate::model::{
    EdgePayload, ElementData, ElementPayload, Interaction, LayoutEdge, LayoutNode, LayoutOutput,
    LayoutState, NodeKind, NodePayload, Position,
};
use archmap_core::{
    ArchitectureModel, Entity, EntityKind, IdIndex, View, ViewKind, classify, matches_query,
    visible_entities,
};
use std::cell::{Cell, Ref, RefCell};

/// Identifies one layout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Issues tickets and remembers the latest one.
#[derive(Debug, Default)]
pub struct Generations {
    latest: Cell<u64>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new ticket. Every ticket issued earlier stops being current.
    pub fn issue(&self) -> Ticket {
        let next = self.latest.get() + 1;
        self.latest.set(next);
        Ticket(next)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest.get()
    }
}

/// A finished computation, tagged with the ticket it was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub ticket: Ticket,
    pub output: LayoutOutput,
}

#[derive(Debug, Clone, Default)]
pub struct Orchestrator<E = DugongEngine> {
    engine: E,
    config: LayoutConfig,
}

impl Orchestrator {
    pub fn with_config(config: LayoutConfig) -> Self {
        Self::new(DugongEngine, config)
    }
}

impl<E: LayeredEngine> Orchestrator<E> {
    pub fn new(engine: E, config: LayoutConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Lays out `view` of `model`. Never fails; an absent model yields an empty output.
    pub async fn compute(
        &self,
        model: Option<&ArchitectureModel>,
        view: &View,
        ticket: Ticket,
    ) -> Computed {
        let output = match model {
            None => LayoutOutput::default(),
            Some(model) if view.kind == ViewKind::Deployment => LayoutOutput {
                nodes: layout_deployment(model, view, &self.config),
                edges: Vec::new(),
            },
            Some(model) => self.compute_flat(model, view).await,
        };
        tracing::debug!(
            ticket = ticket.get(),
            view = ?view.kind,
            nodes = output.nodes.len(),
            edges = output.edges.len(),
            "layout computed"
        );
        Computed { ticket, output }
    }

    async fn compute_flat(&self, model: &ArchitectureModel, view: &View) -> LayoutOutput {
        let entities = visible_entities(model, view.kind, view.focus());
        if entities.is_empty() {
            return LayoutOutput::default();
        }

        let flat = layout_flat(&self.engine, &entities, &model.relationships, &self.config).await;
        LayoutOutput {
            nodes: entities
                .iter()
                .map(|entity| self.project_node(entity, view, &flat))
                .collect(),
            edges: project_edges(model, &entities, &flat),
        }
    }

    fn project_node(&self, entity: &Entity<'_>, view: &View, flat: &FlatLayout) -> LayoutNode {
        let kind = entity.kind();
        let mut interactions = vec![Interaction::Select];
        if matches!(kind, EntityKind::System | EntityKind::Container) {
            interactions.push(Interaction::DrillDown);
        }
        let dimmed = view
            .filter
            .as_deref()
            .is_some_and(|query| !query.is_empty() && !matches_query(entity, query));

        LayoutNode {
            id: entity.id().to_string(),
            kind: NodeKind::from(kind),
            position: flat
                .positions
                .get(entity.id())
                .copied()
                .unwrap_or_default(),
            size: self.config.dimensions.of(kind),
            parent_id: None,
            payload: NodePayload::Element(ElementPayload {
                element: ElementData::from(*entity),
                layer: classify(entity),
                is_focus: kind == EntityKind::System && view.focus() == Some(entity.id()),
                dimmed,
                interactions,
            }),
        }
    }
}

/// One edge per relationship whose endpoints both resolve to a visible entity, using the same
/// resolution as the layered graph.
fn project_edges(
    model: &ArchitectureModel,
    entities: &[Entity<'_>],
    flat: &FlatLayout,
) -> Vec<LayoutEdge> {
    let index = IdIndex::build(entities);
    resolve_relationships(&index, &model.relationships)
        .into_iter()
        .map(|(i, source, target)| {
            let r = &model.relationships[i];
            let points: Vec<Position> = flat.routes.get(&i).cloned().unwrap_or_default();
            LayoutEdge {
                id: format!("{}-{}-{i}", r.from, r.to),
                source: source.to_string(),
                target: target.to_string(),
                payload: EdgePayload {
                    description: r.description.clone(),
                    technology: r.technology.clone(),
                    points,
                },
            }
        })
        .collect()
}

/// Couples an orchestrator with a generation counter and the published state.
///
/// Single-threaded: interior mutability only, and no borrow is held across an await.
#[derive(Debug, Default)]
pub struct LayoutSession<E = DugongEngine> {
    orchestrator: Orchestrator<E>,
    generations: Generations,
    state: RefCell<LayoutState>,
}

impl<E: LayeredEngine> LayoutSession<E> {
    pub fn new(orchestrator: Orchestrator<E>) -> Self {
        Self {
            orchestrator,
            generations: Generations::new(),
            state: RefCell::new(LayoutState::default()),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<E> {
        &self.orchestrator
    }

    /// Recomputes the layout and publishes it unless a newer refresh started meanwhile.
    ///
    /// Returns whether this call's result was published.
    pub async fn refresh(&self, model: Option<&ArchitectureModel>, view: &View) -> bool {
        let ticket = self.generations.issue();

        let Some(model) = model else {
            *self.state.borrow_mut() = LayoutState::default();
            return true;
        };

        self.state.borrow_mut().is_layouting = true;
        let computed = self.orchestrator.compute(Some(model), view, ticket).await;

        if !self.generations.is_current(computed.ticket) {
            tracing::debug!(
                ticket = computed.ticket.get(),
                "dropping stale layout result"
            );
            return false;
        }

        *self.state.borrow_mut() = LayoutState {
            nodes: computed.output.nodes,
            edges: computed.output.edges,
            is_layouting: false,
        };
        true
    }

    pub fn state(&self) -> Ref<'_, LayoutState> {
        self.state.borrow()
    }

    pub fn snapshot(&self) -> LayoutState {
        self.state.borrow().clone()
    }

    pub fn is_layouting(&self) -> bool {
        self.state.borrow().is_layouting
    }
}
