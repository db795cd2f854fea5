//! Static registries of the attributes that can be toggled onto node and link labels.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeInfo {
    pub name: &'static str,
    /// Short form used when labels are abbreviated.
    pub abbreviation: Option<&'static str>,
    /// Restriction on when the attribute is meaningful (e.g. regression only).
    pub constraint: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl AttributeInfo {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            abbreviation: None,
            constraint: None,
            description: None,
        }
    }

    const fn abbreviated(mut self, abbreviation: &'static str) -> Self {
        self.abbreviation = Some(abbreviation);
        self
    }

    const fn constrained(mut self, constraint: &'static str) -> Self {
        self.constraint = Some(constraint);
        self
    }

    const fn described(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Label prefix for this attribute.
    pub fn display_name(&self, abbreviate: bool) -> &'static str {
        if abbreviate {
            self.abbreviation.unwrap_or(self.name)
        } else {
            self.name
        }
    }
}

pub const NODE_ATTRIBUTES: &[AttributeInfo] = &[
    AttributeInfo::new("impurity"),
    AttributeInfo::new("decision-feature")
        .described("Index of the feature used by the node as decision."),
    AttributeInfo::new("number-of-instances").described(
        "Number of training instances that passed through the node (weighted when sample weights were used).",
    ),
    AttributeInfo::new("threshold").described(
        "Value compared against the decision feature to route each instance to a child node.",
    ),
    AttributeInfo::new("node-class").described(
        "Majority class of the training instances within the node (classifiers) or their mean target value (regressors).",
    ),
    AttributeInfo::new("depth"),
    AttributeInfo::new("output-delta")
        .constrained("For regression tasks only")
        .described("Variation of the model output between the node and its parent node."),
    AttributeInfo::new("index").abbreviated("ID"),
];

pub const LINK_ATTRIBUTES: &[AttributeInfo] = &[
    AttributeInfo::new("weight").described(
        "Share of the parent node's instances that pass through the link to the child node.",
    ),
    AttributeInfo::new("decision")
        .described("Relation associated with the link: '≤' (left child) or '>' (right child)."),
    AttributeInfo::new("decision-feature")
        .described("Index of the feature used by the parent node as decision."),
    AttributeInfo::new("threshold")
        .described("Threshold used by the parent node to route instances to this child."),
];

pub fn node_attribute(name: &str) -> Option<&'static AttributeInfo> {
    NODE_ATTRIBUTES.iter().find(|a| a.name == name)
}

pub fn link_attribute(name: &str) -> Option<&'static AttributeInfo> {
    LINK_ATTRIBUTES.iter().find(|a| a.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_abbreviated_as_id() {
        let info = node_attribute("index").expect("index attribute");
        assert_eq!(info.display_name(true), "ID");
        assert_eq!(info.display_name(false), "index");
    }

    #[test]
    fn attributes_without_abbreviation_keep_their_name() {
        let info = link_attribute("weight").expect("weight attribute");
        assert_eq!(info.display_name(true), "weight");
        assert!(node_attribute("no-such-attribute").is_none());
    }
}
