//! Text measurement

use crate::{FontSpec, Size};

/// Measures text for layout
pub trait TextMeasurer {
    /// Size of `text` drawn in `font` (height is the font's line height)
    fn measure(&self, text: &str, font: &FontSpec) -> Size;

    /// Distance between baselines of two unspaced lines
    fn line_height(&self, font: &FontSpec) -> f32;

    /// Distance from the top of a line to its baseline
    fn ascent(&self, font: &FontSpec) -> f32 {
        self.line_height(font) * 0.8
    }
}

/// Monospaced metrics derived from the font size alone
///
/// Every character advances `size * advance` and lines are `size * line`
/// tall. Used when no TrueType data is available for a family, and in tests
/// where exact positions matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub advance: f32,
    pub line: f32,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            advance: 0.5,
            line: 1.2,
        }
    }
}

impl TextMeasurer for FixedMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        let width = text.chars().count() as f32 * font.size * self.advance;
        Size::new(width, self.line_height(font))
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        font.size * self.line
    }
}
