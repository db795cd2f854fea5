use serde::{Deserialize, Serialize};

/// Font parameters of label text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f64,
    /// Line advance as a multiple of `font_size`.
    pub line_height_factor: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

/// Measurement seam for label boxes. Front-ends with real fonts plug in their own.
pub trait TextMeasurer {
    /// Measures `text`; lines are separated by `'\n'`.
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Estimates every glyph as `char_width_factor × font_size`, so layouts do not depend on
/// installed fonts.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
}

impl Default for DeterministicTextMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: 0.6,
        }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let font_size = style.font_size.max(1.0);
        let (line_count, widest) = text
            .split('\n')
            .fold((0usize, 0usize), |(n, widest), line| {
                (n + 1, widest.max(line.chars().count()))
            });
        TextMetrics {
            width: widest as f64 * font_size * self.char_width_factor,
            height: line_count as f64 * font_size * style.line_height_factor,
            line_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_the_longest_line() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle {
            font_size: 10.0,
            ..Default::default()
        };
        let metrics = m.measure("ab\nabcd", &style);
        assert_eq!(metrics.line_count, 2);
        assert!((metrics.width - 24.0).abs() < 1e-9);
        assert!((metrics.height - 24.0).abs() < 1e-9);
    }

    #[test]
    fn empty_text_is_one_blank_line() {
        let metrics = DeterministicTextMeasurer::default().measure("", &TextStyle::default());
        assert_eq!(metrics.line_count, 1);
        assert_eq!(metrics.width, 0.0);
    }
}
