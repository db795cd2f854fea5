#![forbid(unsafe_code)]

//! `arbora` lays out decision trees and the hierarchical clustering of a forest, headless.
//!
//! # Features
//!
//! - `render`: enable the layout engines (`arbora::render`)

pub use arbora_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use arbora_render::model::{DendrogramScene, TreeScene};
    pub use arbora_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use arbora_render::{LayoutOptions, PathRequest, layout_dendrogram, rebuild_tree};

    use arbora_core::{Forest, RenderConfig};

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Load(#[from] arbora_core::Error),
        #[error(transparent)]
        Render(#[from] arbora_render::Error),
        #[error("tree index {index} out of range (forest has {len} trees)")]
        TreeIndex { index: usize, len: usize },
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Loads a model document (single tree, array or ensemble) and rebuilds one of its trees.
    ///
    /// `Ok(None)` means the selected member carries no `tree_`.
    pub fn rebuild_from_json(
        model_json: &str,
        tree_index: usize,
        config: &RenderConfig,
        highlight: Option<PathRequest<'_>>,
        options: &LayoutOptions,
    ) -> Result<Option<TreeScene>> {
        let forest = Forest::from_json_str(model_json)?;
        let Some(model) = forest.get(tree_index) else {
            return Err(HeadlessError::TreeIndex {
                index: tree_index,
                len: forest.len(),
            });
        };
        Ok(rebuild_tree(model, config, highlight, options)?)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const STUMP: &str = r#"{
            "criterion": "gini",
            "tree_": {
                "capacity": 3,
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [0, -2, -2],
                "threshold": [1.5, -2.0, -2.0],
                "impurity": [0.5, 0.0, 0.0],
                "value": [[[2, 2]], [[2, 0]], [[0, 2]]],
                "weighted_number_of_node_samples": [4, 2, 2]
            }
        }"#;

        #[test]
        fn rebuilds_the_selected_member() {
            let scene = rebuild_from_json(
                STUMP,
                0,
                &RenderConfig::default(),
                None,
                &LayoutOptions::default(),
            )
            .unwrap()
            .unwrap();
            assert_eq!(scene.nodes.len(), 3);
        }

        #[test]
        fn out_of_range_member_is_an_error() {
            let err = rebuild_from_json(
                STUMP,
                4,
                &RenderConfig::default(),
                None,
                &LayoutOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, HeadlessError::TreeIndex { index: 4, len: 1 }));
        }
    }
}
