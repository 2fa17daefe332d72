//! Nested layout of deployment trees.
//!
//! The tree is flattened parent-first, indexed into an arena, sized bottom-up and then positioned
//! top-down. Every child's position is relative to its parent's top-left corner.

use crate::config::{DeploymentConfig, LayoutConfig};
use crate::model::{
    DeploymentPayload, InstancePayload, Interaction, LayoutNode, NodeKind, NodePayload, Position,
    Size,
};
use archmap_core::{ArchitectureModel, ContainerInstance, DeploymentNode, View};
use indexmap::IndexSet;
use rustc_hash::FxHashMap as HashMap;

/// A flattened deployment node or synthesized instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatElement {
    pub id: String,
    pub name: String,
    /// Roots are at depth 0.
    pub depth: usize,
    pub parent_id: Option<String>,
    pub kind: FlatKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlatKind {
    Node {
        technology: Vec<String>,
        /// Instances left after filtering.
        instances: Vec<ContainerInstance>,
        /// Has children or retained instances; drawn as a containing box.
        is_group: bool,
        /// Children, or retained instances for nodes without children.
        child_count: usize,
    },
    Instance {
        container_ref: String,
        replicas: Option<u32>,
    },
}

impl FlatElement {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, FlatKind::Node { is_group: true, .. })
    }
}

/// Bidirectional substring containment between an instance's container reference and a
/// requested reference.
///
/// Over-matches short ids: `api` also matches `shop.api-gateway`.
pub fn reference_matches(container: &str, reference: &str) -> bool {
    container.contains(reference) || reference.contains(container)
}

/// Flattens `nodes` depth-first, parents before descendants.
///
/// With a `container_filter`, instances only survive when they match one of the references.
pub fn flatten(nodes: &[DeploymentNode], container_filter: Option<&[String]>) -> Vec<FlatElement> {
    let mut out = Vec::new();
    flatten_into(nodes, 0, None, container_filter, &mut out);
    out
}

fn flatten_into(
    nodes: &[DeploymentNode],
    depth: usize,
    parent_id: Option<&str>,
    container_filter: Option<&[String]>,
    out: &mut Vec<FlatElement>,
) {
    for node in nodes {
        let has_children = !node.children.is_empty();
        let instances: Vec<ContainerInstance> = node
            .instances
            .iter()
            .filter(|inst| {
                container_filter.is_none_or(|refs| {
                    refs.iter()
                        .any(|r| reference_matches(&inst.container, r))
                })
            })
            .cloned()
            .collect();
        let child_count = if has_children {
            node.children.len()
        } else {
            instances.len()
        };

        out.push(FlatElement {
            id: node.id.clone(),
            name: node.name.clone(),
            depth,
            parent_id: parent_id.map(str::to_string),
            kind: FlatKind::Node {
                technology: node.technology.clone(),
                is_group: has_children || !instances.is_empty(),
                child_count,
                instances: instances.clone(),
            },
        });

        if has_children {
            flatten_into(
                &node.children,
                depth + 1,
                Some(&node.id),
                container_filter,
                out,
            );
            continue;
        }

        for inst in instances {
            out.push(FlatElement {
                id: format!("{}-instance-{}", node.id, inst.container.replace('.', "-")),
                name: inst.container.clone(),
                depth: depth + 1,
                parent_id: Some(node.id.clone()),
                kind: FlatKind::Instance {
                    container_ref: inst.container,
                    replicas: inst.replicas,
                },
            });
        }
    }
}

/// Ids of every node hosting an instance that matches `container_ref`, plus all their ancestors.
pub fn find_ancestry_of(nodes: &[DeploymentNode], container_ref: &str) -> IndexSet<String> {
    let mut found = IndexSet::new();
    let mut path: Vec<&str> = Vec::new();
    collect_ancestry(nodes, container_ref, &mut path, &mut found);
    found
}

fn collect_ancestry<'a>(
    nodes: &'a [DeploymentNode],
    container_ref: &str,
    path: &mut Vec<&'a str>,
    found: &mut IndexSet<String>,
) {
    for node in nodes {
        path.push(&node.id);
        if node
            .instances
            .iter()
            .any(|inst| reference_matches(&inst.container, container_ref))
        {
            found.extend(path.iter().map(|id| id.to_string()));
        }
        collect_ancestry(&node.children, container_ref, path, found);
        path.pop();
    }
}

/// Keeps only nodes whose id is in `allowed`, at every level.
pub fn prune_tree(nodes: &[DeploymentNode], allowed: &IndexSet<String>) -> Vec<DeploymentNode> {
    nodes
        .iter()
        .filter(|node| allowed.contains(&node.id))
        .map(|node| DeploymentNode {
            children: prune_tree(&node.children, allowed),
            ..node.clone()
        })
        .collect()
}

/// Flattened elements indexed by position, with parent and child links.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentArena {
    pub elements: Vec<FlatElement>,
    pub parent: Vec<Option<usize>>,
    pub children: Vec<Vec<usize>>,
    pub roots: Vec<usize>,
}

impl DeploymentArena {
    /// Links every element to the closest preceding element carrying its parent id. Elements whose
    /// parent is unknown become roots.
    pub fn new(elements: Vec<FlatElement>) -> Self {
        let mut latest: HashMap<&str, usize> = HashMap::default();
        let mut parent = Vec::with_capacity(elements.len());
        let mut children = vec![Vec::new(); elements.len()];
        let mut roots = Vec::new();

        for (ix, element) in elements.iter().enumerate() {
            let p = element
                .parent_id
                .as_deref()
                .and_then(|id| latest.get(id).copied());
            match p {
                Some(p) => children[p].push(ix),
                None => roots.push(ix),
            }
            parent.push(p);
            latest.insert(&element.id, ix);
        }

        Self {
            elements,
            parent,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Memoized size of element `ix`; children are sized before their parent.
    pub fn size_of(&self, ix: usize, config: &DeploymentConfig, memo: &mut [Option<Size>]) -> Size {
        if let Some(size) = memo[ix] {
            return size;
        }

        let size = match &self.elements[ix].kind {
            FlatKind::Instance { .. } => config.instance,
            FlatKind::Node { .. } if self.children[ix].is_empty() => config.leaf,
            FlatKind::Node { .. } => {
                let mut total_width = 0.0;
                let mut max_height: f64 = 0.0;
                for &child in &self.children[ix] {
                    let s = self.size_of(child, config, memo);
                    total_width += s.width;
                    max_height = max_height.max(s.height);
                }
                let gaps = (self.children[ix].len() - 1) as f64 * config.spacing;
                Size::new(
                    config
                        .min_group_width
                        .max(total_width + gaps + 2.0 * config.padding_x),
                    max_height + config.padding_top + config.padding_bottom,
                )
            }
        };

        memo[ix] = Some(size);
        size
    }

    /// Sizes of every element, by arena index.
    pub fn sizes(&self, config: &DeploymentConfig) -> Vec<Size> {
        let mut memo = vec![None; self.len()];
        for &root in &self.roots {
            self.size_of(root, config, &mut memo);
        }
        memo.into_iter()
            .map(|size| size.unwrap_or(config.leaf))
            .collect()
    }

    /// Lays `siblings` out left to right from `origin`, then their children inside them.
    pub fn position_of(
        &self,
        siblings: &[usize],
        origin: Position,
        sizes: &[Size],
        config: &DeploymentConfig,
        out: &mut [Position],
    ) {
        let mut x = origin.x;
        for &ix in siblings {
            out[ix] = Position::new(x, origin.y);
            if !self.children[ix].is_empty() {
                self.position_of(
                    &self.children[ix],
                    Position::new(config.padding_x, config.padding_top),
                    sizes,
                    config,
                    out,
                );
            }
            x += sizes[ix].width + config.spacing;
        }
    }

    /// Positions of every element, by arena index. Roots start at the origin.
    pub fn positions(&self, sizes: &[Size], config: &DeploymentConfig) -> Vec<Position> {
        let mut out = vec![Position::default(); self.len()];
        self.position_of(&self.roots, Position::default(), sizes, config, &mut out);
        out
    }

    /// Arena indices depth-first, each parent before its children.
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(ix) = stack.pop() {
            order.push(ix);
            stack.extend(self.children[ix].iter().rev());
        }
        order
    }
}

/// Container references the selection stands for: a container by both id forms, a system by
/// all of its containers.
pub fn selection_refs(model: &ArchitectureModel, selected: &str) -> Vec<String> {
    if let Some(c) = model.container(selected) {
        return vec![c.id.clone(), format!("{}.{}", c.system_id, c.id)];
    }
    if let Some(system) = model.system(selected) {
        return model
            .containers_of(&system.id)
            .flat_map(|c| [c.id.clone(), format!("{}.{}", system.id, c.id)])
            .collect();
    }
    Vec::new()
}

/// The flattened elements a deployment view shows.
///
/// Without a focus the first deployment is shown unfiltered. With a focus the deployment with that
/// id is used, narrowed to the branches hosting the selection when one is active and matches.
pub fn deployment_elements(model: &ArchitectureModel, view: &View) -> Vec<FlatElement> {
    let Some(focus) = view.focus() else {
        return model
            .deployments
            .first()
            .map(|d| flatten(&d.nodes, None))
            .unwrap_or_default();
    };
    let Some(deployment) = model.deployment(focus) else {
        return Vec::new();
    };

    if let Some(selected) = view.selected() {
        let refs = selection_refs(model, selected);
        let mut relevant: IndexSet<String> = IndexSet::new();
        for r in &refs {
            relevant.extend(find_ancestry_of(&deployment.nodes, r));
        }
        if !relevant.is_empty() {
            let pruned = prune_tree(&deployment.nodes, &relevant);
            return flatten(&pruned, Some(&refs));
        }
    }

    flatten(&deployment.nodes, None)
}

/// Sizes, positions and projects the deployment view into output nodes, parents first.
pub fn layout_deployment(
    model: &ArchitectureModel,
    view: &View,
    config: &LayoutConfig,
) -> Vec<LayoutNode> {
    let elements = deployment_elements(model, view);
    if elements.is_empty() {
        return Vec::new();
    }

    let arena = DeploymentArena::new(elements);
    let sizes = arena.sizes(&config.deployment);
    let positions = arena.positions(&sizes, &config.deployment);
    tracing::debug!(
        elements = arena.len(),
        roots = arena.roots.len(),
        "deployment layout"
    );

    arena
        .depth_first()
        .into_iter()
        .map(|ix| {
            let element = &arena.elements[ix];
            let (kind, payload) = match &element.kind {
                FlatKind::Node {
                    technology,
                    instances,
                    is_group,
                    child_count,
                } => (
                    if *is_group {
                        NodeKind::DeploymentGroup
                    } else {
                        NodeKind::DeploymentNode
                    },
                    NodePayload::Deployment(DeploymentPayload {
                        name: element.name.clone(),
                        technology: technology.clone(),
                        depth: element.depth,
                        child_count: *child_count,
                        instances: instances.clone(),
                        interactions: vec![Interaction::Select],
                    }),
                ),
                FlatKind::Instance {
                    container_ref,
                    replicas,
                } => (
                    NodeKind::Instance,
                    NodePayload::Instance(InstancePayload {
                        name: element.name.clone(),
                        container_ref: container_ref.clone(),
                        replicas: *replicas,
                        depth: element.depth,
                        interactions: vec![Interaction::Select],
                    }),
                ),
            };
            LayoutNode {
                id: element.id.clone(),
                kind,
                position: positions[ix],
                size: sizes[ix],
                parent_id: element.parent_id.clone(),
                payload,
            }
        })
        .collect()
}
