#![forbid(unsafe_code)]

//! Input models and configuration for the arbora tree/dendrogram layout engine (headless).
//!
//! This crate owns everything that crosses the boundary into the engine:
//! - decision-tree models exported by a training collaborator (`model`)
//! - hierarchical-clustering results for forests (`cluster`)
//! - decision paths and prediction payloads (`path`)
//! - the immutable `RenderConfig` and the static attribute registries (`config`, `attrs`)
//!
//! Nothing here performs I/O; callers hand in JSON text or `serde_json::Value`s.

pub mod attrs;
pub mod cluster;
pub mod config;
mod described;
pub mod error;
pub mod geom;
pub mod model;
pub mod path;

pub use attrs::{AttributeInfo, LINK_ATTRIBUTES, NODE_ATTRIBUTES};
pub use cluster::{ClusterBucket, ClusterNode, Clustering};
pub use config::{ConfigOverrides, Orientation, RenderConfig, Rgb};
pub use error::{Error, Result};
pub use model::{Criterion, Forest, SourceTree, TreeModel};
pub use path::{DecisionPaths, Instance, PredictResults};

/// Tree node id as exported by the training collaborator (root is `0`).
///
/// Signed so the engine can reserve negative sentinels (see `AGGREGATION_ID`).
pub type NodeId = i64;

/// Reserved id of the synthetic node that summarizes every depth-windowed node.
pub const AGGREGATION_ID: NodeId = -1;
