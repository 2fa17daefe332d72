use archmap_core::{
    ArchitectureModel, Container, Entity, Person, Relationship, SemanticLayer, SoftwareSystem, View,
    ViewKind, visible_entities,
};
use archmap_layout::{
    DugongEngine, Generations, GridConfig, Interaction, LayeredConfig, LayeredEngine,
    LayeredGraph, LayeredResult, LayoutConfig, LayoutSession, NodeKind, NodePayload, Orchestrator,
    grid_layout,
};
use futures::channel::oneshot;
use futures::executor::block_on;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn shop() -> ArchitectureModel {
    let path = workspace_root().join("fixtures/models/shop.json");
    let text = std::fs::read_to_string(&path).expect("read fixture");
    ArchitectureModel::from_json_str(&text).expect("parse fixture")
}

/// Always fails.
struct FailingEngine;

impl LayeredEngine for FailingEngine {
    type Error = std::fmt::Error;

    fn layout<'a>(
        &'a self,
        _graph: &'a LayeredGraph,
        _config: &'a LayeredConfig,
    ) -> impl Future<Output = Result<LayeredResult, Self::Error>> + 'a {
        std::future::ready(Err(std::fmt::Error))
    }
}

/// Each call waits for the next queued gate before running dugong.
#[derive(Default)]
struct GatedEngine {
    gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
}

impl GatedEngine {
    fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }
}

impl LayeredEngine for GatedEngine {
    type Error = archmap_layout::Error;

    fn layout<'a>(
        &'a self,
        graph: &'a LayeredGraph,
        config: &'a LayeredConfig,
    ) -> impl Future<Output = Result<LayeredResult, Self::Error>> + 'a {
        let gate = self.gates.borrow_mut().pop_front();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            DugongEngine.run(graph, config)
        }
    }
}

fn node_ids(session: &LayoutSession<impl LayeredEngine>) -> Vec<String> {
    session.state().nodes.iter().map(|n| n.id.clone()).collect()
}

#[test]
fn person_and_external_systems_without_relationships() {
    let model = ArchitectureModel {
        persons: vec![Person {
            id: "user".to_string(),
            name: "User".to_string(),
            ..Person::default()
        }],
        systems: ["billing", "crm"]
            .iter()
            .map(|id| SoftwareSystem {
                id: id.to_string(),
                name: id.to_string(),
                external: true,
                ..SoftwareSystem::default()
            })
            .collect(),
        ..ArchitectureModel::default()
    };
    let orchestrator = Orchestrator::with_config(LayoutConfig::default());
    let generations = Generations::new();
    let computed = block_on(orchestrator.compute(
        Some(&model),
        &View::new(ViewKind::Landscape),
        generations.issue(),
    ));

    assert_eq!(computed.output.nodes.len(), 3);
    assert!(computed.output.edges.is_empty());
    let layers: Vec<SemanticLayer> = computed
        .output
        .nodes
        .iter()
        .map(|n| match &n.payload {
            NodePayload::Element(p) => p.layer,
            other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(
        layers,
        [
            SemanticLayer::People,
            SemanticLayer::ExternalSystems,
            SemanticLayer::ExternalSystems
        ]
    );
}

#[test]
fn dotted_endpoints_resolve_to_visible_containers() {
    let container = |id: &str| Container {
        id: id.to_string(),
        name: id.to_string(),
        system_id: "sys1".to_string(),
        ..Container::default()
    };
    let model = ArchitectureModel {
        systems: vec![SoftwareSystem {
            id: "sys1".to_string(),
            name: "System".to_string(),
            ..SoftwareSystem::default()
        }],
        containers: vec![container("api"), container("db")],
        relationships: vec![Relationship {
            from: "sys1.api".to_string(),
            to: "sys1.db".to_string(),
            ..Relationship::default()
        }],
        ..ArchitectureModel::default()
    };
    let orchestrator = Orchestrator::with_config(LayoutConfig::default());
    let computed = block_on(orchestrator.compute(
        Some(&model),
        &View::new(ViewKind::Container).with_focus("sys1"),
        Generations::new().issue(),
    ));

    let nodes: Vec<&str> = computed.output.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, ["api", "db"]);
    assert_eq!(computed.output.edges.len(), 1);
    let edge = &computed.output.edges[0];
    assert_eq!(edge.id, "sys1.api-sys1.db-0");
    assert_eq!((edge.source.as_str(), edge.target.as_str()), ("api", "db"));
    assert!(!edge.payload.points.is_empty());
}

#[test]
fn failing_engine_falls_back_to_the_grid() {
    let model = shop();
    let view = View::new(ViewKind::Container).with_focus("shop");
    let session = LayoutSession::new(Orchestrator::new(FailingEngine, LayoutConfig::default()));

    assert!(block_on(session.refresh(Some(&model), &view)));
    assert!(!session.is_layouting());

    let entities: Vec<Entity<'_>> = visible_entities(&model, view.kind, view.focus());
    let grid = grid_layout(&entities, &GridConfig::default());
    let state = session.snapshot();
    assert_eq!(state.nodes.len(), grid.positions.len());
    for node in &state.nodes {
        assert_eq!(node.position, grid.positions[node.id.as_str()]);
    }
    // Edges survive without routed points.
    assert_eq!(state.edges.len(), 5);
    assert!(state.edges.iter().all(|e| e.payload.points.is_empty()));
}

#[test]
fn edges_never_leave_the_view() {
    let model = shop();
    let orchestrator = Orchestrator::with_config(LayoutConfig::default());
    let generations = Generations::new();
    let views = [
        View::new(ViewKind::Landscape),
        View::new(ViewKind::Context).with_focus("payments"),
        View::new(ViewKind::Container).with_focus("shop"),
        View::new(ViewKind::Component).with_focus("api"),
    ];
    for view in &views {
        let output = block_on(orchestrator.compute(Some(&model), view, generations.issue())).output;
        for edge in &output.edges {
            assert!(output.node(&edge.source).is_some(), "{view:?}: {}", edge.id);
            assert!(output.node(&edge.target).is_some(), "{view:?}: {}", edge.id);
        }
    }

    let context = block_on(orchestrator.compute(
        Some(&model),
        &View::new(ViewKind::Context).with_focus("payments"),
        generations.issue(),
    ))
    .output;
    let edges: Vec<&str> = context.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edges, ["shop-payments-7"]);

    let component = block_on(orchestrator.compute(
        Some(&model),
        &View::new(ViewKind::Component).with_focus("api"),
        generations.issue(),
    ))
    .output;
    let edges: Vec<&str> = component.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edges, ["handler-repo-8", "repo-db-9", "web-handler-10"]);
}

#[test]
fn payload_carries_focus_filter_and_interactions() {
    let model = shop();
    let orchestrator = Orchestrator::with_config(LayoutConfig::default());
    let view = View::new(ViewKind::Context)
        .with_focus("shop")
        .with_filter("pay");
    let output = block_on(orchestrator.compute(Some(&model), &view, Generations::new().issue()))
        .output;

    let payload = |id: &str| match &output.node(id).expect(id).payload {
        NodePayload::Element(p) => p.clone(),
        other => panic!("unexpected payload {other:?}"),
    };
    assert!(payload("shop").is_focus);
    assert!(!payload("payments").is_focus);
    assert!(payload("shop").dimmed);
    assert!(!payload("payments").dimmed);
    assert_eq!(
        payload("shop").interactions,
        [Interaction::Select, Interaction::DrillDown]
    );
    assert_eq!(payload("customer").interactions, [Interaction::Select]);
    assert_eq!(output.node("customer").map(|n| n.kind), Some(NodeKind::Person));
}

#[test]
fn deployment_views_have_no_edges() {
    let model = shop();
    let orchestrator = Orchestrator::with_config(LayoutConfig::default());
    let output = block_on(orchestrator.compute(
        Some(&model),
        &View::new(ViewKind::Deployment).with_focus("staging"),
        Generations::new().issue(),
    ))
    .output;
    assert_eq!(output.nodes.len(), 3);
    assert!(output.edges.is_empty());
}

#[test]
fn absent_model_clears_the_state() {
    let model = shop();
    let session = LayoutSession::new(Orchestrator::with_config(LayoutConfig::default()));
    let view = View::new(ViewKind::Landscape);

    assert!(block_on(session.refresh(Some(&model), &view)));
    assert_eq!(node_ids(&session).len(), 5);

    assert!(block_on(session.refresh(None, &view)));
    let state = session.snapshot();
    assert!(state.nodes.is_empty());
    assert!(state.edges.is_empty());
    assert!(!state.is_layouting);
}

#[test]
fn stale_results_never_reach_the_state() {
    let model = shop();
    let engine = GatedEngine::default();
    let first_gate = engine.gate();
    let second_gate = engine.gate();
    let session = LayoutSession::new(Orchestrator::new(engine, LayoutConfig::default()));

    let landscape = View::new(ViewKind::Landscape);
    let containers = View::new(ViewKind::Container).with_focus("shop");

    let (first, second, ()) = block_on(async {
        futures::join!(
            session.refresh(Some(&model), &landscape),
            session.refresh(Some(&model), &containers),
            async move {
                // Release the newer request first.
                let _ = second_gate.send(());
                let _ = first_gate.send(());
            },
        )
    });

    assert!(!first);
    assert!(second);
    assert!(!session.is_layouting());
    assert_eq!(
        node_ids(&session),
        ["customer", "payments", "email", "web", "api", "db", "worker"]
    );
}

#[test]
fn superseded_request_leaves_the_session_busy() {
    let model = shop();
    let engine = GatedEngine::default();
    let first_gate = engine.gate();
    let _second_gate = engine.gate();
    let session = LayoutSession::new(Orchestrator::new(engine, LayoutConfig::default()));
    let view = View::new(ViewKind::Landscape);

    let first = session.refresh(Some(&model), &view);
    let second = session.refresh(Some(&model), &view);
    futures::pin_mut!(first, second);

    // Start both, then let only the first finish.
    let waker = futures::task::noop_waker();
    let mut cx = std::task::Context::from_waker(&waker);
    assert!(first.as_mut().poll(&mut cx).is_pending());
    assert!(second.as_mut().poll(&mut cx).is_pending());
    let _ = first_gate.send(());
    assert_eq!(first.as_mut().poll(&mut cx), std::task::Poll::Ready(false));
    assert!(session.is_layouting());
    assert!(session.state().nodes.is_empty());
}
