use archmap_core::{
    ArchitectureModel, Container, Entity, Person, Relationship, ViewKind, visible_entities,
};
use archmap_layout::{
    DugongEngine, GridConfig, LayeredConfig, LayeredEngine, LayeredGraph, LayeredResult,
    LayoutConfig, Position, grid_layout, layout_flat,
};
use futures::executor::block_on;
use std::cell::Cell;
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

/// Counts invocations and then defers to dugong.
#[derive(Default)]
struct CountingEngine {
    calls: Cell<usize>,
}

impl LayeredEngine for CountingEngine {
    type Error = archmap_layout::Error;

    fn layout<'a>(
        &'a self,
        graph: &'a LayeredGraph,
        config: &'a LayeredConfig,
    ) -> impl Future<Output = Result<LayeredResult, Self::Error>> + 'a {
        self.calls.set(self.calls.get() + 1);
        std::future::ready(DugongEngine.run(graph, config))
    }
}

#[test]
fn container_view_is_laid_out_in_layers() {
    let model = shop();
    let entities = visible_entities(&model, ViewKind::Container, Some("shop"));
    let engine = CountingEngine::default();
    let flat = block_on(layout_flat(
        &engine,
        &entities,
        &model.relationships,
        &LayoutConfig::default(),
    ));

    assert_eq!(engine.calls.get(), 1);
    assert!(!flat.fallback);
    assert_eq!(flat.positions.len(), entities.len());
    for e in &entities {
        assert!(flat.positions.contains_key(e.id()), "missing {}", e.id());
    }

    // customer -> web -> api -> db runs top to bottom.
    let y = |id: &str| flat.positions[id].y;
    assert!(y("customer") < y("web"));
    assert!(y("web") < y("api"));
    assert!(y("api") < y("db"));

    // Relationships 0..=4 connect visible entities; the rest do not.
    let mut routed: Vec<usize> = flat.routes.keys().copied().collect();
    routed.sort_unstable();
    assert_eq!(routed, [0, 1, 2, 3, 4]);
    assert!(flat.routes.values().all(|points| points.len() >= 2));
    for points in flat.routes.values() {
        let axis_parallel = |a: &Position, b: &Position| {
            (a.x - b.x).abs() < 1e-6 || (a.y - b.y).abs() < 1e-6
        };
        assert!(points.windows(2).all(|w| axis_parallel(&w[0], &w[1])));
    }

    // Padding keeps every node away from the origin.
    assert!(flat.positions.values().all(|p| p.x >= 50.0 && p.y >= 50.0));
}

#[test]
fn empty_input_skips_the_engine() {
    let engine = CountingEngine::default();
    let flat = block_on(layout_flat(&engine, &[], &[], &LayoutConfig::default()));
    assert_eq!(engine.calls.get(), 0);
    assert!(flat.positions.is_empty());
    assert!(!flat.fallback);
}

#[test]
fn grid_fallback_is_deterministic() {
    let people: Vec<Person> = ["c", "a", "b", "e", "d", "f"]
        .iter()
        .map(|id| Person {
            id: id.to_string(),
            name: id.to_uppercase(),
            ..Person::default()
        })
        .collect();
    let entities: Vec<Entity<'_>> = people.iter().map(Entity::Person).collect();
    let grid = GridConfig::default();

    let first = grid_layout(&entities, &grid);
    let second = grid_layout(&entities, &grid);
    assert_eq!(first, second);

    let order: Vec<&str> = first.positions.keys().map(String::as_str).collect();
    assert_eq!(order, ["c", "a", "b", "e", "d", "f"]);
    assert_eq!(first.positions["e"], Position::new(960.0, 0.0));
    assert_eq!(first.positions["d"], Position::new(0.0, 200.0));
    assert_eq!(first.positions["f"], Position::new(320.0, 200.0));
}

#[test]
fn large_models_stay_on_the_layered_path() {
    let containers: Vec<Container> = (0..300)
        .map(|i| Container {
            id: format!("c{i}"),
            name: format!("Service {i}"),
            system_id: "big".to_string(),
            ..Container::default()
        })
        .collect();
    let entities: Vec<Entity<'_>> = containers.iter().map(Entity::Container).collect();

    // Deterministic pseudo-random edges, cycles included.
    let mut state: u64 = 0x5eed;
    let mut next = |bound: u64| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) % bound
    };
    let mut relationships = Vec::new();
    while relationships.len() < 600 {
        let (from, to) = (next(300), next(300));
        if from == to {
            continue;
        }
        relationships.push(Relationship {
            from: format!("c{from}"),
            to: format!("big.c{to}"),
            ..Relationship::default()
        });
    }

    let config = LayoutConfig::default();
    let flat = block_on(layout_flat(&DugongEngine, &entities, &relationships, &config));
    assert!(!flat.fallback);
    assert_eq!(flat.positions.len(), 300);
    assert_eq!(flat.routes.len(), 600);

    let size = config.dimensions.container;
    let boxes: Vec<Position> = flat.positions.values().copied().collect();
    for (i, a) in boxes.iter().enumerate() {
        assert!(a.x.is_finite() && a.y.is_finite());
        assert!(a.x >= 50.0 - 1e-6 && a.y >= 50.0 - 1e-6);
        for b in &boxes[i + 1..] {
            let apart = a.x + size.width <= b.x + 1e-6
                || b.x + size.width <= a.x + 1e-6
                || a.y + size.height <= b.y + 1e-6
                || b.y + size.height <= a.y + 1e-6;
            assert!(apart, "{a:?} overlaps {b:?}");
        }
    }
}
