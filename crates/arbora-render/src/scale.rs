//! Value-to-pixel and value-to-color mappings shared by the tree and dendrogram layouts.

use arbora_core::config::{ColorConfig, TreeConfig};
use arbora_core::{Criterion, Rgb};

/// Affine mapping from a numeric domain onto a pixel range.
///
/// A degenerate domain maps every value onto the start of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }
}

/// Node radius for a share of the root's instances: `minimum + factor * ratio`.
///
/// `ratio` is clamped to `[0, 1]`, so radii never drop below the minimum.
pub fn radius_from_ratio(ratio: f64, tree: &TreeConfig) -> f64 {
    let ratio = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    };
    tree.radius_minimum + tree.radius_scale_factor * ratio
}

/// Upper bound of the impurity measure, used to normalize node colors.
///
/// Gini is bounded by 1 and entropy by `log2(number_of_classes)`; any other criterion
/// (regression) falls back to the largest impurity observed in the tree.
pub fn max_impurity(criterion: &Criterion, number_of_classes: usize, observed_max: f64) -> f64 {
    match criterion {
        Criterion::Gini => 1.0,
        Criterion::Entropy => (number_of_classes.max(1) as f64).log2(),
        Criterion::Other(_) => observed_max,
    }
}

/// Interpolates between the pure and impure colors.
pub fn color_from_impurity(impurity: f64, max_impurity: f64, colors: &ColorConfig) -> Rgb {
    let ratio = if max_impurity > 0.0 && impurity.is_finite() {
        (impurity / max_impurity).clamp(0.0, 1.0)
    } else {
        0.0
    };
    colors.pure.lerp(colors.impure, ratio)
}
