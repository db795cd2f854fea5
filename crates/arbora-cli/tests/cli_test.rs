use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(parts: &[&str]) -> PathBuf {
    let mut path = repo_root().join("fixtures");
    for p in parts {
        path = path.join(p);
    }
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn run_json(args: &[&str]) -> Value {
    let exe = assert_cmd::cargo_bin!("arbora-cli");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn tree_command_prints_a_scene() {
    let model = fixture(&["trees", "stump.json"]);
    let scene = run_json(&[
        "tree",
        "--path",
        "[0, 1]",
        "--node-attrs",
        "impurity,index",
        model.to_string_lossy().as_ref(),
    ]);

    let nodes = scene["nodes"].as_array().expect("nodes");
    assert_eq!(nodes.len(), 3);
    assert_eq!(scene["links"].as_array().expect("links").len(), 2);
    assert_eq!(scene["highlight"]["links"], serde_json::json!([[0, 1]]));
    assert_eq!(nodes[0]["label"]["lines"], serde_json::json!(["impurity: 0.5", "index: 0"]));
}

#[test]
fn window_flags_collapse_hidden_depths() {
    let model = fixture(&["trees", "deep_regressor.json"]);
    let scene = run_json(&[
        "tree",
        "--from-root",
        "1",
        "--from-leaves",
        "1",
        "--orientation",
        "90",
        model.to_string_lossy().as_ref(),
    ]);
    assert_eq!(scene["orientation"], 90);
    assert_eq!(scene["omitted"].as_array().expect("omitted").len(), 22);
    let agg = scene["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .find(|n| n["id"] == -1)
        .expect("aggregation node");
    assert_eq!(agg["attrs"]["number-of-nodes-collapsed"], 22);
}

#[test]
fn member_without_tree_prints_null() {
    let model = fixture(&["trees", "forest_array.json"]);
    let scene = run_json(&["tree", "--tree", "1", model.to_string_lossy().as_ref()]);
    assert!(scene.is_null());
}

#[test]
fn out_of_range_tree_index_fails() {
    let model = fixture(&["trees", "stump.json"]);
    let exe = assert_cmd::cargo_bin!("arbora-cli");
    Command::new(exe)
        .args(["tree", "--tree", "5", model.to_string_lossy().as_ref()])
        .assert()
        .code(3);
}

#[test]
fn config_file_and_set_assignments_are_layered() {
    let model = fixture(&["trees", "stump.json"]);
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    fs::write(
        &config,
        r#"{"canvas": {"width": 400, "height": 300}, "tree": {"orientation": 180}}"#,
    )
    .expect("write config");

    let scene = run_json(&[
        "tree",
        "--config",
        config.to_string_lossy().as_ref(),
        "--set",
        "canvas.height=200",
        model.to_string_lossy().as_ref(),
    ]);
    assert_eq!(scene["canvas"]["width"], 400.0);
    assert_eq!(scene["canvas"]["height"], 200.0);
    assert_eq!(scene["orientation"], 180);
    // Root at the bottom when rotated by 180 degrees.
    let root = &scene["nodes"][0];
    assert_eq!(root["y"], 150.0);
}

#[test]
fn invalid_orientation_is_reported() {
    let model = fixture(&["trees", "stump.json"]);
    let exe = assert_cmd::cargo_bin!("arbora-cli");
    Command::new(exe)
        .args(["tree", "--orientation", "45", model.to_string_lossy().as_ref()])
        .assert()
        .code(1);
}

#[test]
fn dendrogram_command_prints_a_scene() {
    let clustering = fixture(&["clustering", "four_trees.json"]);
    let scene = run_json(&[
        "dendrogram",
        "--threshold-cut",
        "0.2",
        clustering.to_string_lossy().as_ref(),
    ]);
    assert_eq!(scene["nodes"].as_array().expect("nodes").len(), 7);
    assert_eq!(scene["links"].as_array().expect("links").len(), 6);
    assert_eq!(scene["cut_line"]["threshold"], 0.2);
    assert_eq!(scene["legend"].as_array().expect("legend").len(), 5);
}

#[test]
fn validate_prints_one_line_per_tree() {
    let model = fixture(&["trees", "forest.json"]);
    let exe = assert_cmd::cargo_bin!("arbora-cli");
    let output = Command::new(exe)
        .args(["validate", model.to_string_lossy().as_ref()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let lines: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["tree"], 0);
    assert_eq!(lines[1]["criterion"], "entropy");
}

#[test]
fn unknown_flag_prints_usage() {
    let exe = assert_cmd::cargo_bin!("arbora-cli");
    Command::new(exe).arg("--bogus").assert().code(2);
}
