//! Scene graphs produced by the layout engines.
//!
//! Scenes are plain data: every position is final canvas coordinates and nothing keeps a handle
//! to a drawing surface. They serialize to JSON for the CLI and for snapshot comparisons.

use crate::path::HighlightSet;
use crate::tree::DepthWindow;
use arbora_core::{AGGREGATION_ID, NodeId, Orientation, Rgb};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// A value shown on a label line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttrValue {
    /// Integers and text pass through verbatim. Floats with a fractional part whose plain
    /// rendering is longer than four characters are rounded to two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Float(v) => {
                let plain = v.to_string();
                if v.is_finite() && v.fract() != 0.0 && plain.len() > 4 {
                    write!(f, "{v:.2}")
                } else {
                    f.write_str(&plain)
                }
            }
        }
    }
}

/// Background rectangle and text lines attached to a node or link.
///
/// A box is created the first time its owner gets a label and resized in place on every later
/// relabeling; `revision` counts those resizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub revision: u32,
}

impl LabelBox {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.width,
            max_y: self.y + self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    /// Depth in the source tree. The aggregation node reports the first depth it hides.
    pub depth: usize,
    /// Display level after the depth window collapsed the hidden band.
    pub level: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: Rgb,
    pub parent_id: Option<NodeId>,
    pub left_child_id: Option<NodeId>,
    pub right_child_id: Option<NodeId>,
    pub is_leaf: bool,
    pub on_prediction_path: bool,
    /// Attribute values keyed by registry name, in registry order.
    pub attrs: IndexMap<String, AttrValue>,
    /// Extra lines shown while the node is on the highlighted path.
    pub annotations: Vec<String>,
    pub label: Option<LabelBox>,
}

impl RenderNode {
    pub fn is_aggregation(&self) -> bool {
        self.id == AGGREGATION_ID
    }

    pub fn position(&self) -> LayoutPoint {
        LayoutPoint::new(self.x, self.y)
    }
}

/// Relation between a parent's decision feature and its threshold on the way to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    #[serde(rename = "≤")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
}

impl Decision {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::LessOrEqual => "≤",
            Self::Greater => ">",
        }
    }
}

/// Ordered pair of rendered node ids; either side may be the aggregation node.
pub type LinkKey = (NodeId, NodeId);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLink {
    pub node_a_id: NodeId,
    pub node_b_id: NodeId,
    pub decision: Decision,
    /// Share of the parent's instances routed through this link. Links merged into the
    /// aggregation node carry the sum of their shares.
    pub weight: f64,
    pub threshold: f64,
    pub decision_feature: i64,
    pub on_prediction_path: bool,
    pub source: LayoutPoint,
    pub target: LayoutPoint,
    /// Point the link label is centered on.
    pub anchor: LayoutPoint,
    pub stroke: Rgb,
    pub label: Option<LabelBox>,
}

impl RenderLink {
    pub fn key(&self) -> LinkKey {
        (self.node_a_id, self.node_b_id)
    }

    pub fn attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "weight" => Some(AttrValue::Text(format!("{:.1}%", self.weight * 100.0))),
            "decision" => Some(AttrValue::Text(self.decision.symbol().to_string())),
            "decision-feature" => Some(AttrValue::Int(self.decision_feature)),
            "threshold" => Some(AttrValue::Float(self.threshold)),
            _ => None,
        }
    }
}

/// Guide line drawn across the canvas at one display level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthMarker {
    pub level: usize,
    /// Source depths drawn on this level; more than one only on the aggregation level.
    pub first_depth: usize,
    pub last_depth: usize,
    pub from: LayoutPoint,
    pub to: LayoutPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeScene {
    pub orientation: Orientation,
    pub canvas: CanvasSize,
    pub window: DepthWindow,
    #[serde(serialize_with = "serialize_values")]
    pub nodes: IndexMap<NodeId, RenderNode>,
    #[serde(serialize_with = "serialize_values")]
    pub links: IndexMap<LinkKey, RenderLink>,
    /// Source ids hidden by the depth window, all represented by the aggregation node.
    pub omitted: BTreeSet<NodeId>,
    pub depth_markers: Vec<DepthMarker>,
    pub highlight: Option<HighlightSet>,
    pub bounds: Option<Bounds>,
}

impl TreeScene {
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(&id)
    }

    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&RenderLink> {
        self.links.get(&(a, b))
    }

    pub fn aggregation_node(&self) -> Option<&RenderNode> {
        self.nodes.get(&AGGREGATION_ID)
    }

    /// Rendered nodes that stand for exactly one source node.
    pub fn conventional_node_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.is_aggregation()).count()
    }

    pub fn compute_bounds(&mut self) {
        let mut points: Vec<(f64, f64)> = Vec::new();
        for n in self.nodes.values() {
            points.push((n.x - n.radius, n.y - n.radius));
            points.push((n.x + n.radius, n.y + n.radius));
            if let Some(label) = &n.label {
                points.push((label.x, label.y));
                points.push((label.x + label.width, label.y + label.height));
            }
        }
        for l in self.links.values() {
            if let Some(label) = &l.label {
                points.push((label.x, label.y));
                points.push((label.x + label.width, label.y + label.height));
            }
        }
        self.bounds = Bounds::from_points(points);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramNode {
    pub id: usize,
    pub is_leaf: bool,
    pub dist: f64,
    pub count: usize,
    /// Coordinate along the leaf axis.
    pub primary: f64,
    /// Coordinate along the distance axis.
    pub perpendicular: f64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: Rgb,
    /// Flat cluster shared by every leaf below this node, if they agree.
    pub cluster: Option<usize>,
    pub is_medoid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramLink {
    pub parent: usize,
    pub child: usize,
    /// Elbow polyline: parent, corner, child.
    pub points: Vec<LayoutPoint>,
    pub stroke: Rgb,
    pub below_cut: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendTick {
    pub value: f64,
    pub label: String,
    pub position: LayoutPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutLine {
    pub threshold: f64,
    pub from: LayoutPoint,
    pub to: LayoutPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramScene {
    pub orientation: Orientation,
    pub canvas: CanvasSize,
    pub max_distance: f64,
    pub nodes: Vec<DendrogramNode>,
    pub links: Vec<DendrogramLink>,
    pub legend: Vec<LegendTick>,
    pub cut_line: CutLine,
    /// Flat cluster of every leaf, indexed by leaf id.
    pub leaf_clusters: Vec<Option<usize>>,
    pub bounds: Option<Bounds>,
}

impl DendrogramScene {
    pub fn node(&self, id: usize) -> Option<&DendrogramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn serialize_values<K, V, S>(map: &IndexMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.values())
}
