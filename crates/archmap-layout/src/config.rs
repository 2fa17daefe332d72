//! Layout constants.
//!
//! `LayoutConfig::default()` is the stock look. Hosts tweak it with a partial JSON document that
//! is merged key by key onto the defaults, so `{"grid":{"columns":3}}` only changes the column
//! count.

use crate::error::{Error, Result};
use crate::model::Size;
use archmap_core::EntityKind;
use dugong::{GraphLabel, RankDir};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub dimensions: NodeDimensions,
    pub layered: LayeredConfig,
    pub grid: GridConfig,
    pub deployment: DeploymentConfig,
    pub layer_hints: LayerHintMode,
}

impl LayoutConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(text)?;
        Self::from_overrides(&overrides)
    }

    pub fn from_overrides(overrides: &Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(Error::ConfigNotAnObject {
                found: json_type_name(overrides),
            });
        }
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge_value(&mut merged, overrides);
        Ok(serde_json::from_value(merged)?)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Node size per entity kind in flat views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDimensions {
    pub person: Size,
    pub system: Size,
    pub container: Size,
    pub component: Size,
}

impl Default for NodeDimensions {
    fn default() -> Self {
        Self {
            person: Size::new(200.0, 180.0),
            system: Size::new(280.0, 200.0),
            container: Size::new(280.0, 160.0),
            component: Size::new(240.0, 120.0),
        }
    }
}

impl NodeDimensions {
    pub fn of(&self, kind: EntityKind) -> Size {
        match kind {
            EntityKind::Person => self.person,
            EntityKind::System => self.system,
            EntityKind::Container => self.container,
            EntityKind::Component => self.component,
        }
    }
}

/// Spacing handed to the layered algorithm. Ranks run top to bottom; routes are orthogonal unless
/// `edgeRouting` says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayeredConfig {
    /// Gap between consecutive ranks.
    pub rank_spacing: f64,
    /// Gap between neighbouring nodes of one rank.
    pub node_spacing: f64,
    /// Gap between neighbouring edge segments of one rank.
    pub edge_spacing: f64,
    /// Margin around the whole drawing.
    pub padding: f64,
    pub edge_routing: EdgeRouting,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            rank_spacing: 120.0,
            node_spacing: 60.0,
            edge_spacing: 20.0,
            padding: 50.0,
            edge_routing: EdgeRouting::Orthogonal,
        }
    }
}

impl LayeredConfig {
    pub fn graph_label(&self) -> GraphLabel {
        GraphLabel {
            rankdir: RankDir::TB,
            ranksep: self.rank_spacing,
            nodesep: self.node_spacing,
            edgesep: self.edge_spacing,
            marginx: self.padding,
            marginy: self.padding,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRouting {
    /// Axis-parallel segments only.
    #[default]
    Orthogonal,
    /// The raw bend points of the layered algorithm.
    Polyline,
}

/// Fallback placement when the layered algorithm fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub columns: usize,
    pub spacing_x: f64,
    pub spacing_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            spacing_x: 320.0,
            spacing_y: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentConfig {
    /// Deployment node without children or instances.
    pub leaf: Size,
    pub instance: Size,
    pub min_group_width: f64,
    pub padding_x: f64,
    pub padding_bottom: f64,
    /// Room for the group header.
    pub padding_top: f64,
    /// Horizontal gap between siblings.
    pub spacing: f64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            leaf: Size::new(300.0, 180.0),
            instance: Size::new(180.0, 70.0),
            min_group_width: 300.0,
            padding_x: 24.0,
            padding_bottom: 24.0,
            padding_top: 70.0,
            spacing: 30.0,
        }
    }
}

/// How semantic layers reach the layered algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerHintMode {
    /// Layers follow edge direction only.
    #[default]
    None,
    /// People belong above everything they talk to and data stores below. Ranks still follow edge
    /// direction; an edge into a person or out of a data store fails the layered layout and the
    /// grid fallback takes over.
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_overrides_merge_onto_defaults() {
        let config = LayoutConfig::from_json_str(
            r#"{"grid":{"columns":3},"layered":{"nodeSpacing":80},"layerHints":"strict"}"#,
        )
        .unwrap();
        assert_eq!(config.grid.columns, 3);
        assert_eq!(config.grid.spacing_x, 320.0);
        assert_eq!(config.layered.node_spacing, 80.0);
        assert_eq!(config.layered.rank_spacing, 120.0);
        assert_eq!(config.layer_hints, LayerHintMode::Strict);
        assert_eq!(config.dimensions, NodeDimensions::default());
    }

    #[test]
    fn config_rejects_non_object_overrides() {
        assert!(matches!(
            LayoutConfig::from_json_str("[1, 2]"),
            Err(Error::ConfigNotAnObject { found: "an array" })
        ));
        assert!(matches!(
            LayoutConfig::from_json_str("{"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn layered_config_maps_onto_the_graph_label() {
        let label = LayeredConfig::default().graph_label();
        assert_eq!(label.rankdir, RankDir::TB);
        assert_eq!((label.ranksep, label.nodesep, label.edgesep), (120.0, 60.0, 20.0));
        assert_eq!((label.marginx, label.marginy), (50.0, 50.0));
    }

    #[test]
    fn edge_routing_is_configurable() {
        let config = LayoutConfig::from_json_str(r#"{"layered":{"edgeRouting":"polyline"}}"#)
            .unwrap();
        assert_eq!(config.layered.edge_routing, EdgeRouting::Polyline);
        assert_eq!(config.layered.padding, 50.0);
    }
}
