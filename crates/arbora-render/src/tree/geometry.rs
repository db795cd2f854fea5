//! Traversal that turns a source tree into rendered nodes and links in layout space.
//!
//! Positions here are `(depth, cross)` pairs; the caller redistributes the cross axis and then
//! projects through an `AxisFrame`.

use super::aggregation::{AggregationManager, DepthWindow};
use super::orientation::AxisFrame;
use crate::model::{AttrValue, Decision, LayoutPoint, LinkKey, RenderLink, RenderNode};
use crate::scale::{color_from_impurity, max_impurity, radius_from_ratio};
use arbora_core::{AGGREGATION_ID, NodeId, RenderConfig, SourceTree, TreeModel};
use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub depth: f64,
    pub cross: f64,
}

#[derive(Debug, Clone)]
pub struct TreeGeometry {
    pub nodes: IndexMap<NodeId, RenderNode>,
    pub links: IndexMap<LinkKey, RenderLink>,
    pub slots: FxHashMap<NodeId, Slot>,
    /// Rendered ids per display level, in traversal (left-to-right) order.
    pub levels: Vec<Vec<NodeId>>,
    pub aggregation: AggregationManager,
}

/// Depth-axis coordinate of the middle of `level`.
pub fn level_coordinate(level: usize, level_count: usize, depth_length: f64) -> f64 {
    (level as f64 + 0.5) * depth_length / level_count.max(1) as f64
}

struct Visit {
    id: usize,
    depth: usize,
    /// Source id and rendered id of the parent.
    parent: Option<(usize, NodeId)>,
    decision: Decision,
    cross: f64,
    delta: f64,
}

/// Walks the tree depth-first (left child first) with an explicit stack.
///
/// Every child sits `delta` away from its parent on the cross axis and `delta` halves per level,
/// except below a hidden node, so the hidden band does not eat into the available width.
pub fn build_geometry(
    model: &TreeModel,
    tree: &SourceTree,
    window: DepthWindow,
    frame: &AxisFrame,
    config: &RenderConfig,
) -> TreeGeometry {
    let tree_config = &config.tree;
    let colors = &config.colors;
    let depth_length = frame.depth_length();
    let cross_length = frame.cross_length();
    let level_count = window.level_count();

    let classifier = model.is_classifier();
    let impurity_bound = max_impurity(
        &model.criterion(),
        model.number_of_classes(),
        tree.max_impurity_value(),
    );
    let root_samples = tree.samples(0);
    let ratio_of = |samples: f64| {
        if root_samples > 0.0 {
            samples / root_samples
        } else {
            0.0
        }
    };

    let mut aggregation = AggregationManager::new(window);
    let mut nodes: IndexMap<NodeId, RenderNode> = IndexMap::new();
    let mut links: IndexMap<LinkKey, RenderLink> = IndexMap::new();
    let mut slots: FxHashMap<NodeId, Slot> = FxHashMap::default();
    let mut levels: Vec<Vec<NodeId>> = vec![Vec::new(); level_count];

    let mut stack: Vec<Visit> = Vec::new();
    if !tree.is_empty() {
        stack.push(Visit {
            id: 0,
            depth: 0,
            parent: None,
            decision: Decision::LessOrEqual,
            cross: cross_length / 2.0,
            delta: cross_length / 4.0,
        });
    }

    while let Some(visit) = stack.pop() {
        let Visit {
            id,
            depth,
            parent,
            decision,
            cross,
            delta,
        } = visit;
        let level = window.display_level(depth);
        let depth_coord = level_coordinate(level, level_count, depth_length);
        let omitted = aggregation.should_omit(depth);
        let rendered_id = if omitted {
            AGGREGATION_ID
        } else {
            id as NodeId
        };

        if omitted {
            let first =
                aggregation.register_omitted(id as NodeId, depth, tree.samples(id), depth_coord, cross);
            if first {
                nodes.insert(
                    AGGREGATION_ID,
                    RenderNode {
                        id: AGGREGATION_ID,
                        depth,
                        level,
                        x: 0.0,
                        y: 0.0,
                        radius: tree_config.radius_minimum,
                        fill: colors.aggregation,
                        parent_id: parent.map(|(_, rendered)| rendered),
                        left_child_id: None,
                        right_child_id: None,
                        is_leaf: false,
                        on_prediction_path: false,
                        attrs: IndexMap::new(),
                        annotations: Vec::new(),
                        label: None,
                    },
                );
                slots.insert(
                    AGGREGATION_ID,
                    Slot {
                        depth: depth_coord,
                        cross,
                    },
                );
                if let Some(ids) = levels.get_mut(level) {
                    ids.push(AGGREGATION_ID);
                }
            }
        } else {
            let child_ids = tree.children(id).map(|(left, right)| {
                let hidden = aggregation.should_omit(depth + 1);
                let map = |c: usize| if hidden { AGGREGATION_ID } else { c as NodeId };
                (map(left), map(right))
            });
            let impurity = tree.impurity.get(id).copied().unwrap_or(0.0);
            nodes.insert(
                rendered_id,
                RenderNode {
                    id: rendered_id,
                    depth,
                    level,
                    x: 0.0,
                    y: 0.0,
                    radius: radius_from_ratio(ratio_of(tree.samples(id)), tree_config),
                    fill: color_from_impurity(impurity, impurity_bound, colors),
                    parent_id: parent.map(|(_, rendered)| rendered),
                    left_child_id: child_ids.map(|(l, _)| l),
                    right_child_id: child_ids.map(|(_, r)| r),
                    is_leaf: child_ids.is_none(),
                    on_prediction_path: false,
                    attrs: node_attributes(model, tree, id, depth, parent.map(|(p, _)| p), classifier),
                    annotations: Vec::new(),
                    label: None,
                },
            );
            slots.insert(
                rendered_id,
                Slot {
                    depth: depth_coord,
                    cross,
                },
            );
            if let Some(ids) = levels.get_mut(level) {
                ids.push(rendered_id);
            }
        }

        if let Some((parent_src, parent_rendered)) = parent {
            if !(parent_rendered == AGGREGATION_ID && rendered_id == AGGREGATION_ID) {
                let parent_samples = tree.samples(parent_src);
                let weight = if parent_samples > 0.0 {
                    tree.samples(id) / parent_samples
                } else {
                    0.0
                };
                match links.entry((parent_rendered, rendered_id)) {
                    Entry::Occupied(mut e) => e.get_mut().weight += weight,
                    Entry::Vacant(e) => {
                        let origin = LayoutPoint::new(0.0, 0.0);
                        e.insert(RenderLink {
                            node_a_id: parent_rendered,
                            node_b_id: rendered_id,
                            decision,
                            weight,
                            threshold: tree.threshold.get(parent_src).copied().unwrap_or(0.0),
                            decision_feature: tree.feature.get(parent_src).copied().unwrap_or(-1),
                            on_prediction_path: false,
                            source: origin,
                            target: origin,
                            anchor: origin,
                            stroke: colors.link_default,
                            label: None,
                        });
                    }
                }
            }
        }

        if let Some((left, right)) = tree.children(id) {
            let child_delta = if omitted { delta } else { delta / 2.0 };
            let parent = Some((id, rendered_id));
            stack.push(Visit {
                id: right,
                depth: depth + 1,
                parent,
                decision: Decision::Greater,
                cross: cross + delta,
                delta: child_delta,
            });
            stack.push(Visit {
                id: left,
                depth: depth + 1,
                parent,
                decision: Decision::LessOrEqual,
                cross: cross - delta,
                delta: child_delta,
            });
        }
    }

    if let Some(agg) = nodes.get_mut(&AGGREGATION_ID) {
        agg.radius = radius_from_ratio(ratio_of(aggregation.entering_samples()), tree_config);
        agg.attrs.insert(
            "total-depth".to_string(),
            AttrValue::Int(window.hidden_levels() as i64),
        );
        agg.attrs.insert(
            "number-of-nodes-collapsed".to_string(),
            AttrValue::Int(aggregation.collapsed() as i64),
        );
        tracing::debug!(
            collapsed = aggregation.collapsed(),
            hidden_levels = window.hidden_levels(),
            "aggregated hidden depths"
        );
    }

    TreeGeometry {
        nodes,
        links,
        slots,
        levels,
        aggregation,
    }
}

fn node_attributes(
    model: &TreeModel,
    tree: &SourceTree,
    id: usize,
    depth: usize,
    parent: Option<usize>,
    classifier: bool,
) -> IndexMap<String, AttrValue> {
    let internal = tree.children(id).is_some();
    let mut attrs = IndexMap::new();
    if let Some(v) = tree.impurity.get(id) {
        attrs.insert("impurity".to_string(), AttrValue::Float(*v));
    }
    if internal {
        if let Some(f) = tree.feature.get(id) {
            attrs.insert("decision-feature".to_string(), AttrValue::Int(*f));
        }
    }
    attrs.insert(
        "number-of-instances".to_string(),
        AttrValue::Float(tree.samples(id)),
    );
    if internal {
        if let Some(t) = tree.threshold.get(id) {
            attrs.insert("threshold".to_string(), AttrValue::Float(*t));
        }
    }
    let class = if classifier {
        model.node_prediction(id).map(AttrValue::Text)
    } else {
        tree.node_output(id).map(AttrValue::Float)
    };
    if let Some(class) = class {
        attrs.insert("node-class".to_string(), class);
    }
    attrs.insert("depth".to_string(), AttrValue::Int(depth as i64));
    if !classifier {
        let delta = parent
            .and_then(|p| Some(tree.node_output(id)? - tree.node_output(p)?));
        if let Some(delta) = delta {
            attrs.insert("output-delta".to_string(), AttrValue::Float(delta));
        }
    }
    attrs.insert("index".to_string(), AttrValue::Int(id as i64));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbora_core::Orientation;

    fn stump() -> TreeModel {
        TreeModel::from_json_str(
            r#"{
                "criterion": "gini",
                "classes_": ["a", "b"],
                "tree_": {
                    "capacity": 3,
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [0, -2, -2],
                    "threshold": [0.5, -2.0, -2.0],
                    "impurity": [0.5, 0.0, 0.0],
                    "value": [[[5, 5]], [[5, 0]], [[0, 5]]],
                    "weighted_number_of_node_samples": [10, 5, 5]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn children_straddle_the_parent() {
        let model = stump();
        let tree = model.tree.as_ref().unwrap();
        let frame = AxisFrame::new(Orientation::Deg0, 400.0, 300.0);
        let window = DepthWindow::clamped(4, 2, tree.level_count());
        let g = build_geometry(&model, tree, window, &frame, &RenderConfig::default());

        assert_eq!(g.slots[&0].cross, 200.0);
        assert_eq!(g.slots[&1].cross, 100.0);
        assert_eq!(g.slots[&2].cross, 300.0);
        assert_eq!(g.slots[&0].depth, 75.0);
        assert_eq!(g.slots[&1].depth, 225.0);
        assert_eq!(g.levels, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn leaf_attributes_skip_split_fields() {
        let model = stump();
        let tree = model.tree.as_ref().unwrap();
        let frame = AxisFrame::new(Orientation::Deg0, 400.0, 300.0);
        let window = DepthWindow::clamped(4, 2, tree.level_count());
        let g = build_geometry(&model, tree, window, &frame, &RenderConfig::default());

        let leaf = &g.nodes[&1];
        assert!(leaf.is_leaf);
        assert!(!leaf.attrs.contains_key("threshold"));
        assert_eq!(leaf.attrs["node-class"], AttrValue::Text("a".into()));
        assert!(!leaf.attrs.contains_key("output-delta"));

        let link = &g.links[&(0, 2)];
        assert_eq!(link.decision, Decision::Greater);
        assert_eq!(link.weight, 0.5);
        assert_eq!(link.threshold, 0.5);
    }
}
