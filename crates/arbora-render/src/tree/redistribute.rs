use arbora_core::NodeId;
use rustc_hash::FxHashMap;

/// Evenly spaces every level across the cross axis.
///
/// The `i`-th of `k` nodes on a level (0-based, in the given order) lands on
/// `total_cross_length / (k + 1) * (i + 1)`, so a level's nodes are centered as a group and
/// their relative order is kept.
pub fn redistribute(levels: &[Vec<NodeId>], total_cross_length: f64) -> FxHashMap<NodeId, f64> {
    let mut out = FxHashMap::default();
    for (index, level) in levels.iter().enumerate() {
        let step = total_cross_length / (level.len() + 1) as f64;
        tracing::trace!(level = index, nodes = level.len(), step, "level redistributed");
        for (i, id) in level.iter().enumerate() {
            out.insert(*id, step * (i + 1) as f64);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_node_is_centered() {
        let out = redistribute(&[vec![7]], 300.0);
        assert_eq!(out[&7], 150.0);
    }

    #[test]
    fn spacing_is_uniform_and_order_is_kept() {
        let out = redistribute(&[vec![0], vec![4, 2, 9]], 400.0);
        assert_eq!(out[&4], 100.0);
        assert_eq!(out[&2], 200.0);
        assert_eq!(out[&9], 300.0);
    }
}
