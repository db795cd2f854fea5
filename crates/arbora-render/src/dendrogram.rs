//! Dendrogram layout for the hierarchical clustering of a forest's trees.
//!
//! Leaves are spaced evenly along the primary (leaf) axis in the supplied order. Every merge
//! sits at the mean primary coordinate of its two children and at a perpendicular coordinate
//! proportional to its merge distance: distance `0` on the far side, the maximum distance next
//! to the legend edge. Links are elbows, and a movable cut line splits the leaves into flat
//! clusters.

use crate::model::{
    Bounds, CanvasSize, CutLine, DendrogramLink, DendrogramNode, DendrogramScene, LayoutPoint,
    LegendTick,
};
use crate::scale::LinearScale;
use crate::tree::AxisFrame;
use crate::{Error, Result};
use arbora_core::{ClusterNode, Clustering, RenderConfig, Rgb};
use rustc_hash::FxHashMap;

/// Flat cluster membership drawn on top of the dendrogram.
#[derive(Debug, Clone, Default)]
pub struct LeafColoring {
    /// Cluster index per leaf id; `None` leaves are drawn in the default link color.
    pub clusters: Vec<Option<usize>>,
    pub medoids: Vec<usize>,
}

/// Lays out a validated clustering result.
///
/// Leaves are colored by the collaborator's buckets when present and by cutting the tree at
/// `threshold_cut` otherwise.
pub fn layout_clustering(
    clustering: &Clustering,
    threshold_cut: f64,
    config: &RenderConfig,
) -> Result<DendrogramScene> {
    clustering.validate()?;
    config.validate()?;
    let max_distance = clustering.max_distance();
    let coloring = if clustering.clust_assignment.is_empty() {
        LeafColoring {
            clusters: clustering
                .flat_clusters(threshold_cut.clamp(0.0, max_distance.max(0.0)))
                .into_iter()
                .map(Some)
                .collect(),
            medoids: Vec::new(),
        }
    } else {
        LeafColoring {
            clusters: clustering.bucket_assignment(),
            medoids: clustering
                .clust_assignment
                .iter()
                .map(|b| b.medoid_ind)
                .collect(),
        }
    };
    layout(
        &clustering.dendrogram_tree,
        &clustering.leaf_order(),
        threshold_cut,
        max_distance,
        &coloring,
        config,
    )
}

/// Lays out `nodes` (leaves `0..n`, merges `n..2n-1`).
///
/// A non-positive `max_distance` falls back to the largest merge distance, then to `1`.
pub fn layout(
    nodes: &[ClusterNode],
    leaf_order: &[usize],
    threshold_cut: f64,
    max_distance: f64,
    coloring: &LeafColoring,
    config: &RenderConfig,
) -> Result<DendrogramScene> {
    let dendrogram = &config.dendrogram;
    let colors = &config.colors;
    let frame = AxisFrame::new(
        dendrogram.orientation,
        config.canvas.width,
        config.canvas.height,
    );
    let depth_length = frame.depth_length();
    let cross_length = frame.cross_length();

    let max_distance = effective_max_distance(nodes, max_distance);
    let margin = dendrogram.margin.clamp(0.0, (depth_length / 2.0).max(0.0));
    let distance_scale = LinearScale::new((0.0, max_distance), (depth_length - margin, margin));
    let threshold = threshold_cut.clamp(0.0, max_distance);

    let by_id: FxHashMap<usize, &ClusterNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let leaf_count = nodes.iter().filter(|n| n.is_leaf()).count();
    let palette_color = |cluster: Option<usize>| -> Rgb {
        match cluster {
            Some(c) if !colors.cluster_palette.is_empty() => {
                colors.cluster_palette[c % colors.cluster_palette.len()]
            }
            _ => colors.link_default,
        }
    };

    let mut placed: FxHashMap<usize, (f64, f64, Option<usize>)> = FxHashMap::default();
    let mut out_nodes: Vec<DendrogramNode> = Vec::with_capacity(nodes.len());

    let step = cross_length / (leaf_count + 1) as f64;
    for (i, &leaf_id) in leaf_order.iter().enumerate() {
        let Some(leaf) = by_id.get(&leaf_id).filter(|n| n.is_leaf()) else {
            return Err(Error::InvalidModel {
                message: format!("leaf order references {leaf_id}, which is not a leaf"),
            });
        };
        let primary = step * (i + 1) as f64;
        let perpendicular = distance_scale.map(leaf.dist);
        let cluster = coloring.clusters.get(leaf_id).copied().flatten();
        let p = frame.project(perpendicular, primary);
        placed.insert(leaf_id, (primary, perpendicular, cluster));
        out_nodes.push(DendrogramNode {
            id: leaf_id,
            is_leaf: true,
            dist: leaf.dist,
            count: leaf.count,
            primary,
            perpendicular,
            x: p.x,
            y: p.y,
            radius: dendrogram.leaf_radius,
            fill: palette_color(cluster),
            cluster,
            is_medoid: coloring.medoids.contains(&leaf_id),
        });
    }

    let mut merges: Vec<&ClusterNode> = nodes.iter().filter(|n| !n.is_leaf()).collect();
    merges.sort_by(|a, b| a.dist.total_cmp(&b.dist).then(a.id.cmp(&b.id)));

    let mut links: Vec<DendrogramLink> = Vec::with_capacity(merges.len() * 2);
    for merge in merges {
        let (Some(left), Some(right)) = (merge.left, merge.right) else {
            continue;
        };
        let (Some(&l), Some(&r)) = (placed.get(&left), placed.get(&right)) else {
            return Err(Error::InvalidModel {
                message: format!(
                    "dendrogram node {} merges {left} and {right} before both are placed",
                    merge.id
                ),
            });
        };
        let primary = (l.0 + r.0) / 2.0;
        let perpendicular = distance_scale.map(merge.dist);
        let cluster = if l.2 == r.2 { l.2 } else { None };
        let below_cut = merge.dist <= threshold;

        for (child, (c_primary, c_perpendicular, _)) in [(left, l), (right, r)] {
            let stroke = if below_cut && cluster.is_some() {
                palette_color(cluster)
            } else {
                colors.link_default
            };
            let points = [
                (perpendicular, primary),
                (perpendicular, c_primary),
                (c_perpendicular, c_primary),
            ]
            .into_iter()
            .map(|(d, c)| {
                let p = frame.project(d, c);
                LayoutPoint::new(p.x, p.y)
            })
            .collect();
            links.push(DendrogramLink {
                parent: merge.id,
                child,
                points,
                stroke,
                below_cut,
            });
        }

        let p = frame.project(perpendicular, primary);
        placed.insert(merge.id, (primary, perpendicular, cluster));
        out_nodes.push(DendrogramNode {
            id: merge.id,
            is_leaf: false,
            dist: merge.dist,
            count: merge.count,
            primary,
            perpendicular,
            x: p.x,
            y: p.y,
            radius: dendrogram.leaf_radius / 2.0,
            fill: if below_cut {
                palette_color(cluster)
            } else {
                colors.link_default
            },
            cluster,
            is_medoid: false,
        });
    }

    let cut_position = distance_scale.map(threshold);
    let cut_from = frame.project(cut_position, 0.0);
    let cut_to = frame.project(cut_position, cross_length);

    let bounds = Bounds::from_points(
        out_nodes
            .iter()
            .flat_map(|n| [(n.x - n.radius, n.y - n.radius), (n.x + n.radius, n.y + n.radius)]),
    );

    tracing::debug!(
        leaves = leaf_count,
        nodes = out_nodes.len(),
        max_distance,
        threshold,
        "dendrogram layout complete"
    );

    Ok(DendrogramScene {
        orientation: dendrogram.orientation,
        canvas: CanvasSize {
            width: config.canvas.width,
            height: config.canvas.height,
        },
        max_distance,
        nodes: out_nodes,
        links,
        legend: legend_ticks(&frame, &distance_scale, dendrogram.legend_ticks),
        cut_line: CutLine {
            threshold,
            from: LayoutPoint::new(cut_from.x, cut_from.y),
            to: LayoutPoint::new(cut_to.x, cut_to.y),
        },
        leaf_clusters: coloring.clusters.clone(),
        bounds,
    })
}

/// Ticks evenly spaced along the distance axis, from the largest distance down to zero.
pub fn legend_ticks(frame: &AxisFrame, scale: &LinearScale, ticks: usize) -> Vec<LegendTick> {
    let ticks = ticks.max(2);
    let (_, max_distance) = scale.domain();
    (0..ticks)
        .map(|i| {
            let fraction = i as f64 / (ticks - 1) as f64;
            let value = max_distance * (1.0 - fraction);
            let p = frame.project(scale.map(value), 0.0);
            LegendTick {
                value,
                label: format!("{value:.2}"),
                position: LayoutPoint::new(p.x, p.y),
            }
        })
        .collect()
}

fn effective_max_distance(nodes: &[ClusterNode], requested: f64) -> f64 {
    if requested > 0.0 && requested.is_finite() {
        return requested;
    }
    let observed = nodes
        .iter()
        .map(|n| n.dist)
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);
    if observed > 0.0 {
        tracing::debug!(observed, "non-positive max distance; using largest merge distance");
        observed
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_leaves() -> Vec<ClusterNode> {
        vec![
            ClusterNode::leaf(0),
            ClusterNode::leaf(1),
            ClusterNode::leaf(2),
            ClusterNode::merge(3, 0, 1, 0.5, 2),
            ClusterNode::merge(4, 2, 3, 1.0, 3),
        ]
    }

    #[test]
    fn merges_sit_between_their_children() {
        let config = RenderConfig::default();
        let scene = layout(
            &three_leaves(),
            &[0, 1, 2],
            0.0,
            1.0,
            &LeafColoring::default(),
            &config,
        )
        .unwrap();
        let leaf0 = scene.node(0).unwrap();
        let leaf1 = scene.node(1).unwrap();
        let merge = scene.node(3).unwrap();
        assert_eq!(merge.primary, (leaf0.primary + leaf1.primary) / 2.0);
        assert!(merge.perpendicular < leaf0.perpendicular);
        assert_eq!(scene.links.len(), 4);
        assert!(scene.links.iter().all(|l| l.points.len() == 3));
    }

    #[test]
    fn zero_max_distance_falls_back_to_the_tree() {
        assert_eq!(effective_max_distance(&three_leaves(), 0.0), 1.0);
        assert_eq!(effective_max_distance(&[ClusterNode::leaf(0)], -1.0), 1.0);
    }

    #[test]
    fn unknown_leaf_in_order_is_rejected() {
        let err = layout(
            &three_leaves(),
            &[0, 3, 2],
            0.0,
            1.0,
            &LeafColoring::default(),
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[test]
    fn legend_runs_from_max_to_zero() {
        let frame = AxisFrame::new(arbora_core::Orientation::Deg0, 200.0, 100.0);
        let scale = LinearScale::new((0.0, 2.0), (90.0, 10.0));
        let ticks = legend_ticks(&frame, &scale, 3);
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["2.00", "1.00", "0.00"]);
        assert_eq!(ticks[0].position, LayoutPoint::new(0.0, 10.0));
        assert_eq!(ticks[2].position, LayoutPoint::new(0.0, 90.0));
    }
}
