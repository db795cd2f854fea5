//! Decision-tree models as exported by the training collaborator.
//!
//! The JSON layout follows scikit-learn's `tree_` arrays with keys spelled out
//! (`weighted_number_of_node_samples`, `maximum_depth`, ...). Exporters may wrap any model-level
//! field as `{ "value": ..., "description": ... }`; both shapes are accepted.

use crate::error::{Error, Result};
use crate::{NodeId, described};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Gini,
    Entropy,
    /// Regression criteria (`squared_error`, `friedman_mse`, ...) and anything unknown.
    Other(String),
}

impl Criterion {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gini" => Self::Gini,
            "entropy" | "log_loss" => Self::Entropy,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeModel {
    #[serde(default, deserialize_with = "described::deserialize")]
    pub criterion: Option<String>,
    /// Declared depth in edges; `null` when the model was trained without a limit.
    #[serde(default, deserialize_with = "described::deserialize")]
    pub maximum_depth: Option<i64>,
    #[serde(default, deserialize_with = "described::deserialize")]
    pub maximum_number_of_classes: Option<usize>,
    #[serde(default, rename = "classes_", deserialize_with = "described::deserialize")]
    pub classes: Option<Vec<ClassLabel>>,
    #[serde(default, rename = "tree_", deserialize_with = "described::deserialize")]
    pub tree: Option<SourceTree>,
}

impl TreeModel {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.tree {
            Some(tree) => tree.validate(),
            None => Ok(()),
        }
    }

    pub fn criterion(&self) -> Criterion {
        Criterion::parse(self.criterion.as_deref().unwrap_or(""))
    }

    pub fn is_classifier(&self) -> bool {
        match &self.classes {
            Some(classes) => !classes.is_empty(),
            None => matches!(self.criterion(), Criterion::Gini | Criterion::Entropy),
        }
    }

    pub fn number_of_classes(&self) -> usize {
        if let Some(n) = self.maximum_number_of_classes.filter(|n| *n > 0) {
            return n;
        }
        if let Some(classes) = self.classes.as_ref().filter(|c| !c.is_empty()) {
            return classes.len();
        }
        self.tree
            .as_ref()
            .and_then(|t| t.value.first())
            .map(|v| v.len())
            .unwrap_or(1)
    }

    pub fn class_label(&self, class_index: usize) -> String {
        self.classes
            .as_ref()
            .and_then(|c| c.get(class_index))
            .map(|c| c.to_string())
            .unwrap_or_else(|| class_index.to_string())
    }

    /// Predicted class label (classifiers) or output value (regressors) stored at `id`.
    pub fn node_prediction(&self, id: usize) -> Option<String> {
        let tree = self.tree.as_ref()?;
        if self.is_classifier() {
            tree.majority_class(id).map(|c| self.class_label(c))
        } else {
            tree.node_output(id).map(|v| v.to_string())
        }
    }
}

/// A forest: one `TreeModel` per member tree.
///
/// Accepts a single model object, an array of model objects, or an ensemble object listing its
/// members under `estimators_`.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub members: Vec<TreeModel>,
}

impl Forest {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let members = match value {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value::<TreeModel>)
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Value::Object(mut map) if !map.contains_key("tree_") && map.contains_key("estimators_") => {
                let estimators = map.remove("estimators_").unwrap_or(Value::Null);
                let estimators = match estimators {
                    Value::Object(mut wrapped) if wrapped.contains_key("value") => {
                        wrapped.remove("value").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                let Value::Array(items) = estimators else {
                    return Err(Error::InvalidModel {
                        message: "`estimators_` must be an array of tree models".to_string(),
                    });
                };
                items
                    .into_iter()
                    .map(serde_json::from_value::<TreeModel>)
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            other => vec![serde_json::from_value::<TreeModel>(other)?],
        };
        for (i, m) in members.iter().enumerate() {
            m.validate().map_err(|e| match e {
                Error::InvalidModel { message } => Error::InvalidModel {
                    message: format!("tree {i}: {message}"),
                },
                other => other,
            })?;
        }
        Ok(Self { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TreeModel> {
        self.members.get(index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTree {
    pub capacity: usize,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub impurity: Vec<f64>,
    #[serde(deserialize_with = "flatten_node_values")]
    pub value: Vec<Vec<f64>>,
    pub weighted_number_of_node_samples: Vec<f64>,
    #[serde(default)]
    pub number_of_node_samples: Option<Vec<f64>>,
    #[serde(default)]
    pub maximum_depth: Option<i64>,
}

impl SourceTree {
    /// Checks the invariants the engine relies on: every per-node array has `capacity` entries,
    /// child ids of internal nodes are in range, and no node is referenced as a child twice.
    pub fn validate(&self) -> Result<()> {
        let n = self.capacity;
        if n == 0 {
            return Err(Error::InvalidModel {
                message: "tree has no nodes".to_string(),
            });
        }
        let lengths = [
            ("children_left", self.children_left.len()),
            ("children_right", self.children_right.len()),
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
            ("impurity", self.impurity.len()),
            ("value", self.value.len()),
            (
                "weighted_number_of_node_samples",
                self.weighted_number_of_node_samples.len(),
            ),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(Error::InvalidModel {
                    message: format!("`{name}` has {len} entries, expected capacity {n}"),
                });
            }
        }

        let mut referenced = vec![false; n];
        for id in 0..n {
            let Some((left, right)) = self.children(id) else {
                continue;
            };
            for child in [left, right] {
                if child >= n {
                    return Err(Error::InvalidModel {
                        message: format!("node {id} references child {child} outside capacity {n}"),
                    });
                }
                if child == 0 || referenced[child] {
                    return Err(Error::InvalidModel {
                        message: format!("node {child} has more than one parent"),
                    });
                }
                referenced[child] = true;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id >= 0 && (id as u64) < self.capacity as u64
    }

    pub fn is_leaf(&self, id: usize) -> bool {
        self.children(id).is_none()
    }

    /// `(left, right)` child ids, or `None` for leaves (negative child ids).
    pub fn children(&self, id: usize) -> Option<(usize, usize)> {
        let left = *self.children_left.get(id)?;
        let right = *self.children_right.get(id)?;
        if left < 0 || right < 0 {
            return None;
        }
        Some((left as usize, right as usize))
    }

    pub fn samples(&self, id: usize) -> f64 {
        self.weighted_number_of_node_samples
            .get(id)
            .copied()
            .unwrap_or(0.0)
    }

    /// Depth of every node reachable from the root; `None` for unreachable ids.
    ///
    /// Iterative so that arbitrarily deep trees do not exhaust the call stack.
    pub fn node_depths(&self) -> Vec<Option<usize>> {
        let mut depths = vec![None; self.capacity];
        if self.capacity == 0 {
            return depths;
        }
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(slot) = depths.get_mut(id) else {
                continue;
            };
            if slot.is_some() {
                continue;
            }
            *slot = Some(depth);
            if let Some((left, right)) = self.children(id) {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
        depths
    }

    /// Number of depth levels (deepest depth + 1). A lone root has one level.
    pub fn level_count(&self) -> usize {
        let levels = self
            .node_depths()
            .into_iter()
            .flatten()
            .max()
            .map(|d| d + 1)
            .unwrap_or(0);
        if let Some(declared) = self.maximum_depth {
            if declared >= 0 && declared as usize + 1 != levels {
                tracing::warn!(
                    declared,
                    levels,
                    "declared maximum_depth disagrees with tree structure; using structure"
                );
            }
        }
        levels
    }

    /// Output value of a regression node (first output).
    pub fn node_output(&self, id: usize) -> Option<f64> {
        self.value.get(id)?.first().copied()
    }

    /// Index of the class with the largest aggregate at `id` (first wins on ties).
    pub fn majority_class(&self, id: usize) -> Option<usize> {
        let values = self.value.get(id)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in values.iter().copied().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn max_impurity_value(&self) -> f64 {
        self.impurity
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

fn flatten_node_values<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    fn flatten(v: &Value, out: &mut Vec<f64>) -> bool {
        match v {
            Value::Number(n) => match n.as_f64() {
                Some(f) => {
                    out.push(f);
                    true
                }
                None => false,
            },
            Value::Array(items) => items.iter().all(|item| flatten(item, out)),
            _ => false,
        }
    }

    let nodes = Vec::<Value>::deserialize(deserializer)?;
    let mut out = Vec::with_capacity(nodes.len());
    for (id, node) in nodes.iter().enumerate() {
        let mut flat = Vec::new();
        if !flatten(node, &mut flat) {
            return Err(serde::de::Error::custom(format!(
                "`value` entry for node {id} must contain only numbers"
            )));
        }
        out.push(flat);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> SourceTree {
        SourceTree {
            capacity: 3,
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            impurity: vec![0.5, 0.0, 0.0],
            value: vec![vec![5.0, 5.0], vec![5.0, 0.0], vec![0.0, 5.0]],
            weighted_number_of_node_samples: vec![10.0, 5.0, 5.0],
            number_of_node_samples: None,
            maximum_depth: Some(1),
        }
    }

    #[test]
    fn stump_has_two_levels() {
        let t = stump();
        assert_eq!(t.node_depths(), vec![Some(0), Some(1), Some(1)]);
        assert_eq!(t.level_count(), 2);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn shared_child_is_rejected() {
        let mut t = stump();
        t.children_right[0] = 1;
        assert!(matches!(t.validate(), Err(Error::InvalidModel { .. })));
    }

    #[test]
    fn out_of_range_child_is_rejected() {
        let mut t = stump();
        t.children_left[0] = 7;
        assert!(matches!(t.validate(), Err(Error::InvalidModel { .. })));
    }

    #[test]
    fn majority_class_prefers_first_on_ties() {
        let t = stump();
        assert_eq!(t.majority_class(0), Some(0));
        assert_eq!(t.majority_class(2), Some(1));
    }

    #[test]
    fn criterion_aliases() {
        assert_eq!(Criterion::parse("log_loss"), Criterion::Entropy);
        assert_eq!(Criterion::parse("Gini"), Criterion::Gini);
        assert_eq!(
            Criterion::parse("squared_error"),
            Criterion::Other("squared_error".to_string())
        );
    }
}
