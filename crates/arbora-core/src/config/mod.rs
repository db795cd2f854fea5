//! Render configuration.
//!
//! `RenderConfig` is an immutable value handed to every rebuild. Which attributes are toggled on,
//! the depth window and the rotation all live here; keeping the "current" value between rebuilds
//! is the caller's job. `ConfigOverrides` is the untyped JSON layer user documents and `--set`
//! assignments are merged into before the typed config is resolved.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas: CanvasConfig,
    pub tree: TreeConfig,
    pub labels: LabelConfig,
    pub dendrogram: DendrogramConfig,
    pub colors: ColorConfig,
}

impl RenderConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        ConfigOverrides::from_value(value).resolve()
    }

    /// Rejects values no layout can be computed from: a canvas without a positive finite extent
    /// and a negative or non-finite dendrogram margin.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("canvas.width", self.canvas.width),
            ("canvas.height", self.canvas.height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig {
                    message: format!("`{name}` must be a positive number, got {value}"),
                });
            }
        }
        let margin = self.dendrogram.margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(Error::InvalidConfig {
                message: format!("`dendrogram.margin` must not be negative, got {margin}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub orientation: Orientation,
    /// Number of levels below the root drawn in full. Clamped by the engine.
    pub visible_depth_from_root: i64,
    /// Number of levels above the deepest leaves drawn in full. Clamped by the engine.
    pub visible_depth_from_leaves: i64,
    pub radius_minimum: f64,
    pub radius_scale_factor: f64,
    pub depth_markers: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Deg0,
            visible_depth_from_root: 4,
            visible_depth_from_leaves: 2,
            radius_minimum: 8.0,
            radius_scale_factor: 24.0,
            depth_markers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub node_attributes: Vec<String>,
    pub link_attributes: Vec<String>,
    pub abbreviate: bool,
    pub font_size: f64,
    pub padding: f64,
    pub line_height_factor: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            node_attributes: Vec::new(),
            link_attributes: Vec::new(),
            abbreviate: false,
            font_size: 12.0,
            padding: 4.0,
            line_height_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DendrogramConfig {
    pub orientation: Orientation,
    pub legend_ticks: usize,
    pub leaf_radius: f64,
    /// Distance kept free between the canvas border and the dendrogram along the distance axis.
    pub margin: f64,
}

impl Default for DendrogramConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Deg0,
            legend_ticks: 5,
            leaf_radius: 4.0,
            margin: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Fill of a node with zero impurity.
    pub pure: Rgb,
    /// Fill of a node at maximum impurity.
    pub impure: Rgb,
    pub aggregation: Rgb,
    pub link_default: Rgb,
    pub link_on_path: Rgb,
    pub cluster_palette: Vec<Rgb>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            pure: Rgb::new(240, 248, 255),
            impure: Rgb::new(8, 48, 107),
            aggregation: Rgb::new(200, 200, 200),
            link_default: Rgb::new(128, 128, 128),
            link_on_path: Rgb::new(255, 0, 0),
            cluster_palette: vec![
                Rgb::new(31, 119, 180),
                Rgb::new(255, 127, 14),
                Rgb::new(44, 160, 44),
                Rgb::new(214, 39, 40),
                Rgb::new(148, 103, 189),
                Rgb::new(140, 86, 75),
                Rgb::new(227, 119, 194),
                Rgb::new(188, 189, 34),
                Rgb::new(23, 190, 207),
            ],
        }
    }
}

/// One of the four cardinal rotations of a diagram.
///
/// `Deg0` puts the root at the top, and every step rotates the drawing by 90° clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Accepts any multiple of 90, including negative ones.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(match degrees.rem_euclid(360) {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            _ => Self::Deg270,
        })
    }

    pub fn degrees(self) -> i64 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn rotated_cw(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Whether increasing depth runs along the screen's y axis.
    pub fn depth_axis_is_vertical(self) -> bool {
        matches!(self, Self::Deg0 | Self::Deg180)
    }
}

impl TryFrom<i64> for Orientation {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        Self::from_degrees(value)
            .ok_or_else(|| format!("orientation must be a multiple of 90 degrees, got {value}"))
    }
}

impl From<Orientation> for i64 {
    fn from(value: Orientation) -> Self {
        value.degrees()
    }
}

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Parses `#rrggbb`, `#rgb` or `rgb(r, g, b)`.
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim();
        if let Some(hex) = t.strip_prefix('#') {
            let expand = |c: u8| c * 17;
            return match hex.len() {
                6 => {
                    let v = u32::from_str_radix(hex, 16).ok()?;
                    Some(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
                }
                3 => {
                    let v = u16::from_str_radix(hex, 16).ok()?;
                    Some(Self::new(
                        expand(((v >> 8) & 0xf) as u8),
                        expand(((v >> 4) & 0xf) as u8),
                        expand((v & 0xf) as u8),
                    ))
                }
                _ => None,
            };
        }
        let inner = t.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut it = inner.split(',').map(|p| p.trim().parse::<u8>());
        let r = it.next()?.ok()?;
        let g = it.next()?.ok()?;
        let b = it.next()?.ok()?;
        if it.next().is_some() {
            return None;
        }
        Some(Self::new(r, g, b))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unsupported color: {value:?}"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        format!("#{:02x}{:02x}{:02x}", value.r, value.g, value.b)
    }
}

/// Untyped config document layered over the defaults of `RenderConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOverrides(Value);

impl Default for ConfigOverrides {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl ConfigOverrides {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    /// Applies a `key=value` assignment. The value is read as JSON when it parses as JSON and
    /// kept as a plain string otherwise (`tree.orientation=90`, `colors.pure=#ffffff`).
    pub fn set_assignment(&mut self, assignment: &str) -> Result<()> {
        let Some((key, raw)) = assignment.split_once('=') else {
            return Err(Error::InvalidConfig {
                message: format!("expected key=value, got {assignment:?}"),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidConfig {
                message: format!("empty key in {assignment:?}"),
            });
        }
        let value = serde_json::from_str::<Value>(raw.trim())
            .unwrap_or_else(|_| Value::String(raw.trim().to_string()));
        self.set_value(key, value);
        Ok(())
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }

    /// Merges these overrides over the defaults and deserializes the typed config.
    pub fn resolve(&self) -> Result<RenderConfig> {
        let mut base = serde_json::to_value(RenderConfig::default())?;
        deep_merge_value(&mut base, &self.0);
        let config: RenderConfig =
            serde_json::from_value(base).map_err(|e| Error::InvalidConfig {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
