//! Attribute labels for nodes and links.
//!
//! Node labels hang below their node; link labels are centered on the link's anchor. A label
//! that would leave the canvas drags its owner back inside, as far as the owner itself can move
//! without leaving the canvas.

use crate::model::{AttrValue, LabelBox, TreeScene};
use crate::text::{TextMeasurer, TextStyle};
use crate::tree::snap_links;
use arbora_core::attrs::{AttributeInfo, LINK_ATTRIBUTES, NODE_ATTRIBUTES};
use arbora_core::config::LabelConfig;

const MISSING: &str = "-";

/// Recomposes every node and link label of `scene` from `labels`.
///
/// Calling this again with another configuration resizes the existing boxes in place.
pub fn compose_labels(scene: &mut TreeScene, labels: &LabelConfig, measurer: &dyn TextMeasurer) {
    let node_attrs = active_attributes(&labels.node_attributes, NODE_ATTRIBUTES, "node");
    let link_attrs = active_attributes(&labels.link_attributes, LINK_ATTRIBUTES, "link");
    let style = TextStyle {
        font_size: labels.font_size,
        line_height_factor: labels.line_height_factor,
    };
    let (width, height) = (scene.canvas.width, scene.canvas.height);

    for node in scene.nodes.values_mut() {
        let mut lines: Vec<String> = if node.is_aggregation() {
            aggregation_lines(&node.attrs)
        } else {
            node_attrs
                .iter()
                .map(|info| {
                    let value = node.attrs.get(info.name);
                    attribute_line(info, value, labels.abbreviate)
                })
                .collect()
        };
        if node.on_prediction_path {
            lines.extend(node.annotations.iter().cloned());
        }

        let (w, h) = box_size(&lines, labels, &style, measurer);
        let x = node.x - w / 2.0;
        let y = node.y + node.radius * 1.5;
        if !upsert_label(&mut node.label, lines, x, y, w, h) {
            continue;
        }

        let (dx, dy) = overflow_shift(x, y, w, h, width, height);
        if dx == 0.0 && dy == 0.0 {
            continue;
        }
        let nx = clamp_center(node.x + dx, node.radius, width);
        let ny = clamp_center(node.y + dy, node.radius, height);
        let (dx, dy) = (nx - node.x, ny - node.y);
        node.x = nx;
        node.y = ny;
        if let Some(label) = node.label.as_mut() {
            label.x += dx;
            label.y += dy;
        }
        tracing::trace!(id = node.id, dx, dy, "node moved to keep its label on canvas");
    }

    snap_links(scene);

    for link in scene.links.values_mut() {
        let lines: Vec<String> = link_attrs
            .iter()
            .map(|info| attribute_line(info, link.attr(info.name).as_ref(), labels.abbreviate))
            .collect();
        let (w, h) = box_size(&lines, labels, &style, measurer);
        let x = link.anchor.x - w / 2.0;
        let y = link.anchor.y - h / 2.0;
        if !upsert_label(&mut link.label, lines, x, y, w, h) {
            continue;
        }

        let (dx, dy) = overflow_shift(x, y, w, h, width, height);
        if dx == 0.0 && dy == 0.0 {
            continue;
        }
        let ax = (link.anchor.x + dx).clamp(0.0, width.max(0.0));
        let ay = (link.anchor.y + dy).clamp(0.0, height.max(0.0));
        let (dx, dy) = (ax - link.anchor.x, ay - link.anchor.y);
        link.anchor.x = ax;
        link.anchor.y = ay;
        if let Some(label) = link.label.as_mut() {
            label.x += dx;
            label.y += dy;
        }
    }

    scene.compute_bounds();
}

fn active_attributes(
    requested: &[String],
    registry: &'static [AttributeInfo],
    kind: &str,
) -> Vec<&'static AttributeInfo> {
    for name in requested {
        if !registry.iter().any(|a| a.name == name) {
            tracing::warn!(kind, name = name.as_str(), "unknown label attribute ignored");
        }
    }
    registry
        .iter()
        .filter(|a| requested.iter().any(|r| r == a.name))
        .collect()
}

fn attribute_line(info: &AttributeInfo, value: Option<&AttrValue>, abbreviate: bool) -> String {
    let name = info.display_name(abbreviate);
    match value {
        Some(v) => format!("{name}: {v}"),
        None => format!("{name}: {MISSING}"),
    }
}

fn aggregation_lines(attrs: &indexmap::IndexMap<String, AttrValue>) -> Vec<String> {
    let get = |key: &str| {
        attrs
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| MISSING.to_string())
    };
    vec![
        format!("Total depth: {}", get("total-depth")),
        format!("Nodes in: {}", get("number-of-nodes-collapsed")),
    ]
}

fn box_size(
    lines: &[String],
    labels: &LabelConfig,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> (f64, f64) {
    if lines.is_empty() {
        return (0.0, 0.0);
    }
    let text = measurer.measure(&lines.join("\n"), style);
    (
        text.width + 2.0 * labels.padding,
        text.height + 2.0 * labels.padding,
    )
}

/// Creates or resizes the box in `slot`. Returns whether a visible box remains.
fn upsert_label(
    slot: &mut Option<LabelBox>,
    lines: Vec<String>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> bool {
    let visible = !lines.is_empty();
    match slot {
        Some(label) => {
            label.lines = lines;
            label.x = x;
            label.y = y;
            label.width = width;
            label.height = height;
            label.revision += 1;
        }
        None if visible => {
            *slot = Some(LabelBox {
                lines,
                x,
                y,
                width,
                height,
                revision: 0,
            });
        }
        None => {}
    }
    visible
}

/// Translation that brings `[x, x + w] x [y, y + h]` inside the canvas. Boxes larger than the
/// canvas are aligned to its top-left corner.
fn overflow_shift(x: f64, y: f64, w: f64, h: f64, width: f64, height: f64) -> (f64, f64) {
    fn axis(start: f64, len: f64, limit: f64) -> f64 {
        if start < 0.0 || len > limit {
            -start
        } else if start + len > limit {
            limit - (start + len)
        } else {
            0.0
        }
    }
    (axis(x, w, width), axis(y, h, height))
}

fn clamp_center(value: f64, radius: f64, limit: f64) -> f64 {
    if limit < 2.0 * radius {
        limit / 2.0
    } else {
        value.clamp(radius, limit - radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_shift_pulls_boxes_inside() {
        assert_eq!(overflow_shift(-5.0, 10.0, 20.0, 10.0, 100.0, 100.0), (5.0, 0.0));
        assert_eq!(overflow_shift(90.0, 95.0, 20.0, 10.0, 100.0, 100.0), (-10.0, -5.0));
        assert_eq!(overflow_shift(10.0, 10.0, 20.0, 10.0, 100.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn missing_values_render_as_dash() {
        let info = arbora_core::attrs::node_attribute("threshold").unwrap();
        assert_eq!(attribute_line(info, None, false), "threshold: -");
        let id = arbora_core::attrs::node_attribute("index").unwrap();
        assert_eq!(
            attribute_line(id, Some(&AttrValue::Int(3)), true),
            "ID: 3"
        );
    }

    #[test]
    fn relabeling_resizes_the_existing_box() {
        let mut slot = None;
        assert!(upsert_label(&mut slot, vec!["a".into()], 0.0, 0.0, 10.0, 10.0));
        assert!(!upsert_label(&mut slot, Vec::new(), 0.0, 0.0, 0.0, 0.0));
        let label = slot.unwrap();
        assert_eq!(label.revision, 1);
        assert!(label.lines.is_empty());
    }
}
