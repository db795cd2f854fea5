//! Prediction-path highlighting.
//!
//! A decision path lists source node ids from the root to a leaf. Projecting it onto a scene
//! maps every hidden id to the aggregation node, so the highlighted route stays connected across
//! the collapsed band.

use crate::model::{LinkKey, TreeScene};
use arbora_core::{AGGREGATION_ID, Instance, NodeId, RenderConfig, SourceTree, TreeModel};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightSet {
    pub nodes: IndexSet<NodeId>,
    pub links: Vec<LinkKey>,
}

pub struct PathHighlighter<'a> {
    omitted: &'a BTreeSet<NodeId>,
    capacity: usize,
}

impl<'a> PathHighlighter<'a> {
    pub fn new(omitted: &'a BTreeSet<NodeId>, capacity: usize) -> Self {
        Self { omitted, capacity }
    }

    fn rendered(&self, id: NodeId) -> NodeId {
        if self.omitted.contains(&id) {
            AGGREGATION_ID
        } else {
            id
        }
    }

    fn in_range(&self, id: NodeId) -> bool {
        id >= 0 && (id as u64) < self.capacity as u64
    }

    /// Rendered nodes and links of `path`.
    ///
    /// Ids outside the tree are skipped together with the links touching them. Consecutive
    /// hidden ids both map to the aggregation node and produce no link.
    pub fn project(&self, path: &[NodeId]) -> HighlightSet {
        let mut set = HighlightSet::default();
        for &id in path {
            if self.in_range(id) {
                set.nodes.insert(self.rendered(id));
            } else {
                tracing::warn!(id, capacity = self.capacity, "path node outside tree; skipped");
            }
        }
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !self.in_range(a) || !self.in_range(b) {
                continue;
            }
            let key = (self.rendered(a), self.rendered(b));
            if key.0 == AGGREGATION_ID && key.1 == AGGREGATION_ID {
                continue;
            }
            if !set.links.contains(&key) {
                set.links.push(key);
            }
        }
        set
    }
}

/// Clears any previous highlight on `scene`, then marks `path`.
///
/// Rendered nodes on the path get annotations: the comparison taken at each split when
/// `instance` is given, and the prediction at the leaf.
pub fn apply_highlight(
    scene: &mut TreeScene,
    model: &TreeModel,
    tree: &SourceTree,
    path: &[NodeId],
    instance: Option<&Instance>,
    config: &RenderConfig,
) -> HighlightSet {
    clear_highlight(scene, config);

    let set = PathHighlighter::new(&scene.omitted, tree.len()).project(path);
    for id in &set.nodes {
        if let Some(node) = scene.nodes.get_mut(id) {
            node.on_prediction_path = true;
        }
    }
    for key in &set.links {
        match scene.links.get_mut(key) {
            Some(link) => {
                link.on_prediction_path = true;
                link.stroke = config.colors.link_on_path;
            }
            None => tracing::warn!(from = key.0, to = key.1, "path step is not a tree link"),
        }
    }

    for &id in path {
        if id < 0 || scene.omitted.contains(&id) {
            continue;
        }
        let Some(node) = scene.nodes.get_mut(&id) else {
            continue;
        };
        let source = id as usize;
        if tree.is_leaf(source) {
            if let Some(prediction) = model.node_prediction(source) {
                node.annotations.push(format!("prediction: {prediction}"));
            }
        } else if let Some(instance) = instance {
            node.annotations.push(decision_taken(tree, source, instance));
        }
    }

    tracing::debug!(
        nodes = set.nodes.len(),
        links = set.links.len(),
        "prediction path highlighted"
    );
    scene.highlight = Some(set.clone());
    set
}

pub fn clear_highlight(scene: &mut TreeScene, config: &RenderConfig) {
    for node in scene.nodes.values_mut() {
        node.on_prediction_path = false;
        node.annotations.clear();
    }
    for link in scene.links.values_mut() {
        link.on_prediction_path = false;
        link.stroke = config.colors.link_default;
    }
    scene.highlight = None;
}

fn decision_taken(tree: &SourceTree, id: usize, instance: &Instance) -> String {
    let feature = tree.feature.get(id).copied().unwrap_or(-1);
    let threshold = tree.threshold.get(id).copied().unwrap_or(0.0);
    match instance.get(feature) {
        Some(v) if v <= threshold => format!("x[{feature}] = {v} ≤ {threshold}"),
        Some(v) => format!("x[{feature}] = {v} > {threshold}"),
        None => format!("x[{feature}] missing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_runs_collapse_onto_the_aggregation_node() {
        let omitted: BTreeSet<NodeId> = [1, 3, 4].into_iter().collect();
        let h = PathHighlighter::new(&omitted, 10);
        let set = h.project(&[0, 1, 3, 7]);
        assert_eq!(
            set.nodes.iter().copied().collect::<Vec<_>>(),
            vec![0, AGGREGATION_ID, 7]
        );
        assert_eq!(set.links, vec![(0, AGGREGATION_ID), (AGGREGATION_ID, 7)]);
    }

    #[test]
    fn out_of_range_ids_are_skipped() {
        let omitted = BTreeSet::new();
        let h = PathHighlighter::new(&omitted, 3);
        let set = h.project(&[0, 2, 99]);
        assert_eq!(set.nodes.len(), 2);
        assert_eq!(set.links, vec![(0, 2)]);
    }

    #[test]
    fn visible_paths_have_one_link_per_step() {
        let omitted = BTreeSet::new();
        let h = PathHighlighter::new(&omitted, 10);
        let set = h.project(&[0, 1, 4, 9]);
        assert_eq!(set.links.len(), 3);
    }
}
