//! Decision paths and the prediction payload they arrive in.

use crate::NodeId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root-to-leaf node-id sequences, one per forest member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionPaths(pub Vec<Vec<NodeId>>);

impl DecisionPaths {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Reads `Array<Array<number|string>>`. A bare `Array<number|string>` is taken as a single
    /// path. Entries that are not integer ids are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            tracing::warn!("decision paths must be an array; ignoring");
            return Self::default();
        };
        if items.is_empty() {
            return Self::default();
        }
        if items.iter().all(|v| !v.is_array()) {
            return Self(vec![parse_path(items)]);
        }
        Self(
            items
                .iter()
                .map(|p| p.as_array().map(|p| parse_path(p)).unwrap_or_default())
                .collect(),
        )
    }

    pub fn get(&self, tree_index: usize) -> Option<&[NodeId]> {
        self.0.get(tree_index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_path(items: &[Value]) -> Vec<NodeId> {
    items
        .iter()
        .filter_map(|item| {
            let id = match item {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            if id.is_none() {
                tracing::warn!(entry = %item, "dropping non-integer decision path entry");
            }
            id
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValDescPair<T> {
    #[serde(default)]
    pub description: String,
    pub value: T,
}

/// Payload returned by the prediction collaborator for one instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictResults {
    #[serde(default)]
    pub predict_result: Option<ValDescPair<Value>>,
    #[serde(default)]
    pub classes_by_tree: Option<ValDescPair<Vec<String>>>,
    #[serde(default)]
    pub decision_path: Option<ValDescPair<Value>>,
    #[serde(default)]
    pub leaf_id: Option<ValDescPair<Value>>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl PredictResults {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn decision_paths(&self) -> DecisionPaths {
        self.decision_path
            .as_ref()
            .map(|p| DecisionPaths::from_value(&p.value))
            .unwrap_or_default()
    }
}

/// Feature values of one instance; `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Instance(pub Vec<Option<f64>>);

impl Instance {
    const NULL_VALUES: [&'static str; 7] = ["null", "nan", "na", "none", "noone", "", "nil"];

    /// Parses a comma-separated list of values (`1.5, nan, 3`).
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut values = Vec::new();
        for (i, raw) in text.split(',').enumerate() {
            let token = raw.trim();
            if Self::NULL_VALUES.contains(&token.to_ascii_lowercase().as_str()) {
                values.push(None);
                continue;
            }
            let v = token
                .parse::<f64>()
                .map_err(|_| format!("value {i} ({token:?}) is not a number"))?;
            values.push(Some(v));
        }
        Ok(Self(values))
    }

    pub fn get(&self, feature: i64) -> Option<f64> {
        if feature < 0 {
            return None;
        }
        self.0.get(feature as usize).copied().flatten()
    }
}
