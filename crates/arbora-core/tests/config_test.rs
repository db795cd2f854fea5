use arbora_core::config::{ConfigOverrides, Orientation, RenderConfig, Rgb};
use serde_json::json;

#[test]
fn empty_overrides_resolve_to_defaults() {
    let cfg = ConfigOverrides::empty_object().resolve().expect("config");
    assert_eq!(cfg, RenderConfig::default());
    assert_eq!(cfg.tree.radius_minimum, 8.0);
    assert_eq!(cfg.tree.radius_scale_factor, 24.0);
}

#[test]
fn deep_merge_only_touches_given_keys() {
    let mut overrides = ConfigOverrides::empty_object();
    overrides.deep_merge(&json!({
        "canvas": { "width": 640 },
        "tree": { "orientation": 270, "visible_depth_from_root": 1 },
        "labels": { "node_attributes": ["impurity", "index"] },
    }));
    let cfg = overrides.resolve().expect("config");

    assert_eq!(cfg.canvas.width, 640.0);
    assert_eq!(cfg.canvas.height, 768.0);
    assert_eq!(cfg.tree.orientation, Orientation::Deg270);
    assert_eq!(cfg.tree.visible_depth_from_root, 1);
    assert_eq!(cfg.tree.visible_depth_from_leaves, 2);
    assert_eq!(cfg.labels.node_attributes, vec!["impurity", "index"]);
}

#[test]
fn dotted_assignments_parse_json_or_strings() {
    let mut overrides = ConfigOverrides::empty_object();
    overrides.set_assignment("tree.orientation=90").unwrap();
    overrides.set_assignment("colors.pure=#ffffff").unwrap();
    overrides.set_assignment("labels.abbreviate=true").unwrap();
    let cfg = overrides.resolve().expect("config");

    assert_eq!(cfg.tree.orientation, Orientation::Deg90);
    assert_eq!(cfg.colors.pure, Rgb::new(255, 255, 255));
    assert!(cfg.labels.abbreviate);
    assert!(overrides.set_assignment("no-equals-sign").is_err());
}

#[test]
fn invalid_orientation_is_a_config_error() {
    let err = RenderConfig::from_json_str(r#"{"tree": {"orientation": 45}}"#).unwrap_err();
    assert!(matches!(err, arbora_core::Error::InvalidConfig { .. }));
}

#[test]
fn orientation_rotates_back_after_four_steps() {
    for start in Orientation::ALL {
        let mut o = start;
        for _ in 0..4 {
            o = o.rotated_cw();
        }
        assert_eq!(o, start);
    }
    assert_eq!(Orientation::from_degrees(-90), Some(Orientation::Deg270));
    assert_eq!(Orientation::from_degrees(450), Some(Orientation::Deg90));
    assert_eq!(Orientation::from_degrees(30), None);
}

#[test]
fn colors_parse_css_and_hex_forms() {
    assert_eq!(Rgb::parse("rgb(255, 0, 0)"), Some(Rgb::new(255, 0, 0)));
    assert_eq!(Rgb::parse("#0f0"), Some(Rgb::new(0, 255, 0)));
    assert_eq!(Rgb::parse("#102030"), Some(Rgb::new(16, 32, 48)));
    assert_eq!(Rgb::parse("red"), None);
    assert_eq!(
        Rgb::new(0, 0, 0).lerp(Rgb::new(200, 100, 50), 0.5),
        Rgb::new(100, 50, 25)
    );
}

#[test]
fn canvas_without_positive_extent_is_rejected() {
    for assignment in ["canvas.height=-10", "canvas.width=0", "dendrogram.margin=-1"] {
        let mut overrides = ConfigOverrides::empty_object();
        overrides.set_assignment(assignment).unwrap();
        let err = overrides.resolve().unwrap_err();
        assert!(
            matches!(err, arbora_core::Error::InvalidConfig { .. }),
            "{assignment}: {err:?}"
        );
    }
    assert!(RenderConfig::default().validate().is_ok());
}
