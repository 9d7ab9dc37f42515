//! Card Template - layouts, template translation and deck rendering
//!
//! This crate provides:
//! - Layout JSON schema types and parsing
//! - Reference rows, column lookup and defines
//! - The macro translator (`@[name]`, `#math;...#`, `#(if ...)#`, `$[field:value]`, ...)
//! - A deck model that expands rows by their `count` column
//! - Card rendering and multi-card export onto a `card_surface::Surface`
//!
//! # Example
//!
//! ```ignore
//! use card_template::{parse_layout, Deck, DeckRenderer, Defines};
//! use card_surface::{FixedMetrics, ImageStore, RecordingSurface};
//!
//! let layout = parse_layout(layout_json)?;
//! let deck = Deck::new(layout, &["name", "count"], rows, Defines::new());
//! let metrics = FixedMetrics::default();
//! let images = ImageStore::new("assets");
//!
//! let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
//! let mut surface = RecordingSurface::new();
//! renderer.export(&mut surface, "pdf", |_| true)?;
//! ```

mod cache;
mod data;
mod deck;
mod fields;
pub mod parser;
mod renderer;
mod schema;
pub mod translator;

pub use cache::TranslationCache;
pub use data::{ColumnIndex, DataRow, Defines};
pub use deck::{CardSlot, Deck, DeckCache};
pub use fields::{field_kind, is_disallowed, read_field, write_field, FieldKind, DISALLOWED_FIELDS};
pub use parser::{load_font_book, parse_layout};
pub use renderer::{CardReport, DeckRenderer, ExportProgress, ExportSummary};
pub use schema::{Element, ElementType, FontDef, Layout};
pub use translator::{
    CardInfo, ElementString, Issue, IssueKind, MacroTranslator, TranslationContext, Translator,
    MAX_PATTERN_OUTPUT, MAX_TRANSLATION_LOOPS,
};

use thiserror::Error;

/// Errors that can occur while loading layouts or rendering cards
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse layout: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Surface error: {0}")]
    SurfaceError(#[from] card_surface::SurfaceError),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Card {index} is out of range for a deck of {count}")]
    CardOutOfRange { index: usize, count: usize },
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TemplateError::CardOutOfRange { index: 4, count: 3 };
        assert_eq!(err.to_string(), "Card 4 is out of range for a deck of 3");
        let err = TemplateError::ParseError("expected value".to_string());
        assert_eq!(err.to_string(), "Failed to parse layout: expected value");
    }
}
