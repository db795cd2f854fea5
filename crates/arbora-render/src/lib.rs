#![forbid(unsafe_code)]

//! Headless layout for decision trees and forest dendrograms.
//!
//! `rebuild_tree` turns one member tree into a `TreeScene` (positions, colors, labels, path
//! highlight); `layout_dendrogram` does the same for the clustering of a whole forest. Both are
//! pure: the same inputs always produce the same scene, and nothing is drawn.

pub mod dendrogram;
pub mod labels;
pub mod model;
pub mod path;
pub mod scale;
pub mod text;
pub mod tree;

use crate::model::{DendrogramScene, TreeScene};
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use arbora_core::{Clustering, Instance, NodeId, RenderConfig, TreeModel};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] arbora_core::Error),
    #[error("invalid model: {message}")]
    InvalidModel { message: String },
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

/// The prediction path to highlight on a rebuilt tree.
#[derive(Debug, Clone, Copy)]
pub struct PathRequest<'a> {
    pub path: &'a [NodeId],
    /// Feature values of the predicted instance, used to annotate the comparisons taken.
    pub instance: Option<&'a Instance>,
}

/// Full rebuild of one member tree.
///
/// Returns `Ok(None)` when the model carries no `tree_` (nothing to draw).
pub fn rebuild_tree(
    model: &TreeModel,
    config: &RenderConfig,
    highlight: Option<PathRequest<'_>>,
    options: &LayoutOptions,
) -> Result<Option<TreeScene>> {
    let Some(tree) = model.tree.as_ref() else {
        tracing::debug!("model has no tree_; nothing to lay out");
        return Ok(None);
    };
    tree.validate()?;
    config.validate()?;

    let mut scene = tree::layout_tree(model, tree, config);
    if let Some(request) = highlight {
        path::apply_highlight(
            &mut scene,
            model,
            tree,
            request.path,
            request.instance,
            config,
        );
    }
    labels::compose_labels(&mut scene, &config.labels, options.text_measurer.as_ref());
    Ok(Some(scene))
}

/// Dendrogram of a forest clustering, cut at `threshold_cut`.
pub fn layout_dendrogram(
    clustering: &Clustering,
    threshold_cut: f64,
    config: &RenderConfig,
) -> Result<DendrogramScene> {
    dendrogram::layout_clustering(clustering, threshold_cut, config)
}

pub fn scene_to_json<T: serde::Serialize>(scene: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(scene)?
    } else {
        serde_json::to_string(scene)?
    })
}
