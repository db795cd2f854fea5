//! Hierarchical clustering of forest members, as produced by the clustering collaborator.
//!
//! `dendrogram_tree` is the flattened merge tree: leaves are ids `0..n`, merges are ids
//! `n..2n-1` (root last), and each node carries its merge distance and leaf count.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub id: usize,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    #[serde(default)]
    pub dist: f64,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

impl ClusterNode {
    pub fn leaf(id: usize) -> Self {
        Self {
            id,
            left: None,
            right: None,
            dist: 0.0,
            count: 1,
        }
    }

    pub fn merge(id: usize, left: usize, right: usize, dist: f64, count: usize) -> Self {
        Self {
            id,
            left: Some(left),
            right: Some(right),
            dist,
            count,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// One flat cluster obtained by cutting the dendrogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterBucket {
    pub tree_inds: Vec<usize>,
    pub medoid_ind: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clustering {
    #[serde(default)]
    pub clust_assignment: Vec<ClusterBucket>,
    pub dendrogram_tree: Vec<ClusterNode>,
    #[serde(default)]
    pub optimal_leaves_seq: Vec<usize>,
    /// Within-cluster distance summary; passed through untouched.
    #[serde(default)]
    pub clust_sum_dists: Value,
    #[serde(default)]
    pub max_limit: Option<f64>,
    #[serde(default)]
    pub num_cluster: Option<usize>,
    #[serde(default)]
    pub hier_clus_distance: Option<String>,
}

impl Clustering {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let clustering: Self = serde_json::from_str(text)?;
        clustering.validate()?;
        Ok(clustering)
    }

    pub fn leaf_count(&self) -> usize {
        self.dendrogram_tree.len().div_ceil(2)
    }

    pub fn node(&self, id: usize) -> Option<&ClusterNode> {
        match self.dendrogram_tree.get(id) {
            Some(n) if n.id == id => Some(n),
            _ => self.dendrogram_tree.iter().find(|n| n.id == id),
        }
    }

    pub fn root(&self) -> Option<&ClusterNode> {
        let n = self.leaf_count();
        if n == 0 {
            return None;
        }
        self.node(2 * n - 2)
    }

    /// Upper end of the distance axis: `max_limit` when positive, otherwise the root's distance.
    pub fn max_distance(&self) -> f64 {
        match self.max_limit {
            Some(m) if m.is_finite() && m > 0.0 => m,
            _ => self.root().map(|r| r.dist).unwrap_or(0.0),
        }
    }

    /// Checks that the nodes form a full binary tree over `n` leaves with non-decreasing merge
    /// distances, and that the leaf order (when given) is a permutation of the leaves.
    pub fn validate(&self) -> Result<()> {
        let total = self.dendrogram_tree.len();
        if total == 0 || total % 2 == 0 {
            return Err(invalid(format!(
                "a full binary tree needs an odd, non-zero node count; got {total}"
            )));
        }
        let n = self.leaf_count();

        let mut by_id: Vec<Option<&ClusterNode>> = vec![None; total];
        for node in &self.dendrogram_tree {
            let Some(slot) = by_id.get_mut(node.id) else {
                return Err(invalid(format!("node id {} outside 0..{total}", node.id)));
            };
            if slot.is_some() {
                return Err(invalid(format!("duplicate node id {}", node.id)));
            }
            if !node.dist.is_finite() || node.dist < 0.0 {
                return Err(invalid(format!("node {} has invalid distance {}", node.id, node.dist)));
            }
            *slot = Some(node);
        }

        let mut has_parent = vec![false; total];
        for id in 0..total {
            let Some(node) = by_id[id] else {
                return Err(invalid(format!("missing node id {id}")));
            };
            match (id < n, node.left, node.right) {
                (true, None, None) => {}
                (true, _, _) => return Err(invalid(format!("leaf {id} has children"))),
                (false, Some(left), Some(right)) => {
                    for child in [left, right] {
                        let Some(child_node) = by_id.get(child).copied().flatten() else {
                            return Err(invalid(format!("node {id} references unknown child {child}")));
                        };
                        if child >= id || has_parent[child] {
                            return Err(invalid(format!(
                                "node {child} is not a proper child of merge {id}"
                            )));
                        }
                        if child_node.dist > node.dist {
                            return Err(invalid(format!(
                                "merge {id} (dist {}) is below its child {child} (dist {})",
                                node.dist, child_node.dist
                            )));
                        }
                        has_parent[child] = true;
                    }
                }
                (false, _, _) => {
                    return Err(invalid(format!("merge {id} must have two children")));
                }
            }
        }

        if !self.optimal_leaves_seq.is_empty() {
            let mut seen = vec![false; n];
            if self.optimal_leaves_seq.len() != n {
                return Err(invalid(format!(
                    "leaf order has {} entries, expected {n}",
                    self.optimal_leaves_seq.len()
                )));
            }
            for &leaf in &self.optimal_leaves_seq {
                match seen.get_mut(leaf) {
                    Some(s) if !*s => *s = true,
                    _ => return Err(invalid(format!("leaf order is not a permutation (at {leaf})"))),
                }
            }
        }

        for bucket in &self.clust_assignment {
            if let Some(bad) = bucket.tree_inds.iter().find(|&&i| i >= n) {
                return Err(invalid(format!("cluster bucket references unknown leaf {bad}")));
            }
        }
        Ok(())
    }

    /// Leaf order to draw with; falls back to `0..n` when none was supplied.
    pub fn leaf_order(&self) -> Vec<usize> {
        if self.optimal_leaves_seq.is_empty() {
            tracing::debug!("no optimal leaf ordering supplied; using identity order");
            (0..self.leaf_count()).collect()
        } else {
            self.optimal_leaves_seq.clone()
        }
    }

    /// Flat cluster index for every leaf after cutting at `threshold` (distance criterion).
    ///
    /// Every maximal subtree whose merge distance is `<= threshold` becomes one cluster. Clusters
    /// are numbered in left-to-right discovery order.
    pub fn flat_clusters(&self, threshold: f64) -> Vec<usize> {
        let n = self.leaf_count();
        let mut assignment = vec![0usize; n];
        let Some(root) = self.root() else {
            return assignment;
        };

        let mut next_cluster = 0usize;
        let mut stack = vec![root.id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.is_leaf() || node.dist <= threshold {
                let mut members = vec![id];
                while let Some(m) = members.pop() {
                    let Some(member) = self.node(m) else {
                        continue;
                    };
                    match (member.left, member.right) {
                        (Some(l), Some(r)) => {
                            members.push(r);
                            members.push(l);
                        }
                        _ => {
                            if let Some(slot) = assignment.get_mut(m) {
                                *slot = next_cluster;
                            }
                        }
                    }
                }
                next_cluster += 1;
            } else if let (Some(l), Some(r)) = (node.left, node.right) {
                stack.push(r);
                stack.push(l);
            }
        }
        assignment
    }

    /// Cluster index per leaf from the supplied buckets, or `None` for leaves no bucket lists.
    pub fn bucket_assignment(&self) -> Vec<Option<usize>> {
        let mut assignment = vec![None; self.leaf_count()];
        for (bucket_index, bucket) in self.clust_assignment.iter().enumerate() {
            for &leaf in &bucket.tree_inds {
                if let Some(slot) = assignment.get_mut(leaf) {
                    *slot = Some(bucket_index);
                }
            }
        }
        assignment
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidClustering { message }
}
