//! Decision-tree layout.
//!
//! A rebuild runs in a fixed order: clamp the depth window, traverse the source tree into layout
//! space (`geometry`), spread every display level evenly across the cross axis (`redistribute`),
//! project into canvas coordinates (`orientation`) and finally snap link endpoints onto their
//! nodes. Labels and path highlighting are applied on the resulting scene afterwards.

pub mod aggregation;
pub mod geometry;
pub mod orientation;
pub mod redistribute;

pub use aggregation::{AggregationManager, DepthWindow};
pub use orientation::AxisFrame;

use crate::model::{CanvasSize, DepthMarker, LayoutPoint, TreeScene};
use arbora_core::{RenderConfig, SourceTree, TreeModel};

/// Lays out every rendered node and link of `tree`. No labels, no highlight.
pub fn layout_tree(model: &TreeModel, tree: &SourceTree, config: &RenderConfig) -> TreeScene {
    let frame = AxisFrame::new(
        config.tree.orientation,
        config.canvas.width,
        config.canvas.height,
    );
    let window = DepthWindow::clamped(
        config.tree.visible_depth_from_root,
        config.tree.visible_depth_from_leaves,
        tree.level_count(),
    );

    let geometry = geometry::build_geometry(model, tree, window, &frame, config);
    let cross = redistribute::redistribute(&geometry.levels, frame.cross_length());

    let mut nodes = geometry.nodes;
    for (id, node) in nodes.iter_mut() {
        let Some(slot) = geometry.slots.get(id) else {
            continue;
        };
        let c = cross.get(id).copied().unwrap_or(slot.cross);
        let p = frame.project(slot.depth, c);
        node.x = p.x;
        node.y = p.y;
    }

    let depth_markers = if config.tree.depth_markers {
        depth_markers(&window, &frame)
    } else {
        Vec::new()
    };

    let mut scene = TreeScene {
        orientation: config.tree.orientation,
        canvas: CanvasSize {
            width: config.canvas.width,
            height: config.canvas.height,
        },
        window,
        nodes,
        links: geometry.links,
        omitted: geometry.aggregation.into_omitted(),
        depth_markers,
        highlight: None,
        bounds: None,
    };
    snap_links(&mut scene);
    scene.compute_bounds();

    tracing::debug!(
        nodes = scene.nodes.len(),
        links = scene.links.len(),
        omitted = scene.omitted.len(),
        orientation = config.tree.orientation.degrees(),
        "tree layout complete"
    );
    scene
}

/// Moves every link's endpoints onto its nodes and recenters its label anchor.
pub fn snap_links(scene: &mut TreeScene) {
    let TreeScene { nodes, links, .. } = scene;
    for link in links.values_mut() {
        let (Some(a), Some(b)) = (nodes.get(&link.node_a_id), nodes.get(&link.node_b_id)) else {
            continue;
        };
        link.source = a.position();
        link.target = b.position();
        link.anchor = link.source.midpoint(link.target);
    }
}

fn depth_markers(window: &DepthWindow, frame: &AxisFrame) -> Vec<DepthMarker> {
    let level_count = window.level_count();
    (0..level_count)
        .map(|level| {
            let d = geometry::level_coordinate(level, level_count, frame.depth_length());
            let (first_depth, last_depth) = window.depths_of_level(level);
            let from = frame.project(d, 0.0);
            let to = frame.project(d, frame.cross_length());
            DepthMarker {
                level,
                first_depth,
                last_depth,
                from: LayoutPoint::new(from.x, from.y),
                to: LayoutPoint::new(to.x, to.y),
            }
        })
        .collect()
}
