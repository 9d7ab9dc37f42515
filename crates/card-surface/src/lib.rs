//! Card Surface - the drawing side of card rendering
//!
//! This crate provides:
//! - Geometry and colour primitives shared by layout and rendering
//! - Font specifications (`family;size;bold;underline;italic;strikeout`)
//! - Text measurement (`TextMeasurer`) backed by TrueType fonts or fixed metrics
//! - Image lookup (`ImageSource`) backed by the filesystem
//! - The `Surface` drawing contract with a recording and a PDF implementation
//!
//! # Example
//!
//! ```ignore
//! use card_surface::{FontBook, FontFamilyBuilder, ImageStore, PdfSurface, Surface};
//!
//! let mut fonts = FontBook::new();
//! fonts.register_family("sarabun", FontFamilyBuilder::new().regular(std::fs::read("Sarabun.ttf")?))?;
//! let images = ImageStore::new("assets");
//!
//! let mut pdf = PdfSurface::new(&fonts, &images);
//! pdf.begin_card(180.0, 252.0)?;
//! // ... draw
//! pdf.end_card()?;
//! pdf.save("deck.pdf")?;
//! ```

mod color;
mod font;
mod fonts;
mod geometry;
mod image;
mod measure;
mod pdf;
mod recording;
mod surface;

pub use color::Color;
pub use font::FontSpec;
pub use fonts::{FontBook, FontData, FontFamily, FontFamilyBuilder};
pub use geometry::{HorizontalAlign, Rect, Size, VerticalAlign};
pub use image::{ImageSource, ImageStore, ImageXObject};
pub use measure::{FixedMetrics, TextMeasurer};
pub use pdf::PdfSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{
    ColorType, ElementFrame, ImageDraw, ImageStyle, Mirror, Outline, Surface, TextDraw,
};

use thiserror::Error;

/// Errors that can occur while drawing cards
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid font specification: {0}")]
    InvalidFont(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("No card is open")]
    NoOpenCard,

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SurfaceError::InvalidColor("#12".to_string());
        assert_eq!(err.to_string(), "Invalid color: #12");
        assert_eq!(SurfaceError::NoOpenCard.to_string(), "No card is open");
    }
}
