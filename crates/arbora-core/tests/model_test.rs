use arbora_core::{Clustering, Criterion, Error, Forest, TreeModel};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(parts: &[&str]) -> String {
    let mut path = workspace_root().join("fixtures");
    for p in parts {
        path = path.join(p);
    }
    std::fs::read_to_string(&path).expect("fixture")
}

#[test]
fn stump_model_loads_with_class_labels() {
    let model = TreeModel::from_json_str(&fixture(&["trees", "stump.json"])).expect("model");
    let tree = model.tree.as_ref().expect("tree_");

    assert_eq!(model.criterion(), Criterion::Gini);
    assert!(model.is_classifier());
    assert_eq!(model.number_of_classes(), 2);
    assert_eq!(tree.capacity, 3);
    assert_eq!(tree.level_count(), 2);
    assert_eq!(tree.value[0], vec![50.0, 50.0]);
    assert_eq!(model.node_prediction(2).as_deref(), Some("versicolor"));
}

#[test]
fn described_fields_and_null_depth_are_accepted() {
    let model =
        TreeModel::from_json_str(&fixture(&["trees", "deep_regressor.json"])).expect("model");
    let tree = model.tree.as_ref().expect("tree_");

    assert_eq!(model.maximum_depth, None);
    assert!(!model.is_classifier());
    assert_eq!(tree.capacity, 29);
    assert_eq!(tree.level_count(), 6);
    assert_eq!(tree.value[0].len(), 1);
}

#[test]
fn ensemble_object_lists_its_members() {
    let forest = Forest::from_json_str(&fixture(&["trees", "forest.json"])).expect("forest");
    assert_eq!(forest.len(), 2);
    for member in &forest.members {
        assert_eq!(member.criterion(), Criterion::Entropy);
        assert!(member.tree.is_some());
    }
    // Root of the first member holds [45, 105] instances of classes [0, 1].
    assert_eq!(
        forest.get(0).and_then(|m| m.node_prediction(0)).as_deref(),
        Some("1")
    );
}

#[test]
fn array_forest_keeps_members_without_tree() {
    let forest =
        Forest::from_json_str(&fixture(&["trees", "forest_array.json"])).expect("forest");
    assert_eq!(forest.len(), 2);
    assert!(forest.members[0].tree.is_some());
    assert!(forest.members[1].tree.is_none());
}

#[test]
fn array_length_mismatch_is_reported() {
    let mut value: serde_json::Value =
        serde_json::from_str(&fixture(&["trees", "stump.json"])).expect("json");
    value["tree_"]["impurity"] = serde_json::json!([0.5, 0.0]);
    let err = Forest::from_value(value).expect_err("mismatch");
    match err {
        Error::InvalidModel { message } => assert!(message.contains("impurity"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn clustering_fixture_is_valid() {
    let clustering =
        Clustering::from_json_str(&fixture(&["clustering", "four_trees.json"])).expect("clust");
    assert_eq!(clustering.leaf_count(), 4);
    assert_eq!(clustering.leaf_order(), vec![1, 0, 2, 3]);
    assert_eq!(clustering.max_distance(), 1.0);
    assert_eq!(
        clustering.bucket_assignment(),
        vec![Some(0), Some(0), Some(1), Some(1)]
    );
}
