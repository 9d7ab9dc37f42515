//! The drawing contract between the layout engine and an output backend

use crate::{Color, FontSpec, Rect, Result};
use std::str::FromStr;

/// Placement of one element on the card
///
/// Drawing calls between `begin_element` and `end_element` use coordinates
/// relative to the element's top-left corner; rotation (degrees, clockwise)
/// is about that corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementFrame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    /// 0.0 (invisible) - 1.0 (opaque)
    pub opacity: f32,
}

/// Mirroring applied to a glyph run or image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mirror {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Text outline drawn around glyphs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub thickness: f32,
    pub color: Color,
}

/// Colour transform for images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorType {
    #[default]
    Normal,
    Grayscale,
    Sepia,
    Invert,
}

impl FromStr for ColorType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "normal" | "none" => Ok(ColorType::Normal),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(ColorType::Grayscale),
            "sepia" => Ok(ColorType::Sepia),
            "invert" | "inverted" => Ok(ColorType::Invert),
            other => Err(format!("unknown color type: {other}")),
        }
    }
}

/// Scoped image colour state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageStyle {
    /// Multiplies every channel by the tint colour
    pub tint: Option<Color>,
    pub color_type: ColorType,
    /// Per-channel multipliers `[r, g, b, a]`
    pub matrix: Option<[f32; 4]>,
}

impl ImageStyle {
    pub fn is_plain(&self) -> bool {
        *self == ImageStyle::default()
    }
}

/// A run of text placed in `rect` (top-left of the line box)
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    pub rect: Rect,
    pub font: FontSpec,
    pub color: Color,
    pub scale_x: f32,
    pub scale_y: f32,
    pub outline: Option<Outline>,
    pub mirror: Mirror,
}

/// An image stretched into `rect`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDraw {
    pub path: String,
    pub rect: Rect,
    pub style: ImageStyle,
    pub mirror: Mirror,
}

/// Output backend for rendered cards
pub trait Surface {
    /// Start a new card of the given size
    fn begin_card(&mut self, width: f32, height: f32) -> Result<()>;

    fn end_card(&mut self) -> Result<()>;

    fn begin_element(&mut self, frame: &ElementFrame) -> Result<()>;

    fn end_element(&mut self) -> Result<()>;

    fn draw_text(&mut self, draw: &TextDraw) -> Result<()>;

    fn draw_image(&mut self, draw: &ImageDraw) -> Result<()>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) -> Result<()>;
}
