//! Depth windowing: which source depths are drawn and how hidden ones collapse into a single
//! aggregation node.

use arbora_core::NodeId;
use serde::Serialize;
use std::collections::BTreeSet;

/// Clamped depth window of one rebuild.
///
/// `max_depth` counts levels (a lone root has one). Depths `0..=visible_depth_from_root` and the
/// last `visible_depth_from_leaves` depths are drawn; everything in between is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepthWindow {
    pub visible_depth_from_root: usize,
    pub visible_depth_from_leaves: usize,
    pub max_depth: usize,
}

impl DepthWindow {
    /// Negative requests become zero, each side is capped at `max_depth - 1`, and when both
    /// sides together still exceed that the leaves side gives way first.
    pub fn clamped(from_root: i64, from_leaves: i64, max_depth: usize) -> Self {
        let max_hidden = max_depth.saturating_sub(1);
        let clamp = |v: i64| -> usize { v.max(0).min(max_hidden as i64) as usize };
        let vr = clamp(from_root);
        let mut vl = clamp(from_leaves);
        if vr + vl > max_hidden {
            vl = max_hidden - vr;
        }
        if vr as i64 != from_root || vl as i64 != from_leaves {
            tracing::debug!(
                from_root,
                from_leaves,
                visible_depth_from_root = vr,
                visible_depth_from_leaves = vl,
                max_depth,
                "depth window clamped"
            );
        }
        Self {
            visible_depth_from_root: vr,
            visible_depth_from_leaves: vl,
            max_depth,
        }
    }

    pub fn max_hidden_levels(&self) -> usize {
        self.max_depth.saturating_sub(1)
    }

    /// Number of source depths collapsed into the aggregation level.
    pub fn hidden_levels(&self) -> usize {
        self.max_hidden_levels()
            .saturating_sub(self.visible_depth_from_root + self.visible_depth_from_leaves)
    }

    pub fn has_aggregation(&self) -> bool {
        self.hidden_levels() > 0
    }

    pub fn omits(&self, depth: usize) -> bool {
        depth > self.visible_depth_from_root
            && depth + self.visible_depth_from_leaves < self.max_depth
    }

    /// First hidden depth; the aggregation node is drawn on its level.
    pub fn aggregation_depth(&self) -> usize {
        self.visible_depth_from_root + 1
    }

    pub fn last_hidden_depth(&self) -> usize {
        self.visible_depth_from_root + self.hidden_levels()
    }

    pub fn display_level(&self, depth: usize) -> usize {
        if !self.has_aggregation() || depth <= self.visible_depth_from_root {
            depth
        } else if self.omits(depth) {
            self.aggregation_depth()
        } else {
            depth + 1 - self.hidden_levels()
        }
    }

    pub fn level_count(&self) -> usize {
        if self.has_aggregation() {
            self.max_depth + 1 - self.hidden_levels()
        } else {
            self.max_depth
        }
    }

    /// Inclusive range of source depths drawn on `level`.
    pub fn depths_of_level(&self, level: usize) -> (usize, usize) {
        let agg = self.aggregation_depth();
        if !self.has_aggregation() || level < agg {
            (level, level)
        } else if level == agg {
            (agg, self.last_hidden_depth())
        } else {
            let depth = level + self.hidden_levels() - 1;
            (depth, depth)
        }
    }
}

/// Tracks the source nodes hidden during one traversal.
#[derive(Debug, Clone)]
pub struct AggregationManager {
    window: DepthWindow,
    omitted: BTreeSet<NodeId>,
    anchor: Option<(f64, f64)>,
    collapsed: usize,
    entering_samples: f64,
}

impl AggregationManager {
    pub fn new(window: DepthWindow) -> Self {
        Self {
            window,
            omitted: BTreeSet::new(),
            anchor: None,
            collapsed: 0,
            entering_samples: 0.0,
        }
    }

    pub fn window(&self) -> &DepthWindow {
        &self.window
    }

    pub fn should_omit(&self, depth: usize) -> bool {
        self.window.omits(depth)
    }

    /// Records a hidden node at layout position `(depth_coord, cross_coord)`.
    ///
    /// Returns `true` for the first hidden node of the traversal, whose position becomes the
    /// aggregation node's anchor.
    pub fn register_omitted(
        &mut self,
        id: NodeId,
        depth: usize,
        samples: f64,
        depth_coord: f64,
        cross_coord: f64,
    ) -> bool {
        self.omitted.insert(id);
        self.collapsed += 1;
        if depth == self.window.aggregation_depth() {
            self.entering_samples += samples;
        }
        if self.anchor.is_none() {
            self.anchor = Some((depth_coord, cross_coord));
            true
        } else {
            false
        }
    }

    pub fn omitted(&self) -> &BTreeSet<NodeId> {
        &self.omitted
    }

    pub fn collapsed(&self) -> usize {
        self.collapsed
    }

    pub fn anchor(&self) -> Option<(f64, f64)> {
        self.anchor
    }

    /// Instances flowing into the hidden band from the last visible level.
    pub fn entering_samples(&self) -> f64 {
        self.entering_samples
    }

    pub fn into_omitted(self) -> BTreeSet<NodeId> {
        self.omitted
    }
}
