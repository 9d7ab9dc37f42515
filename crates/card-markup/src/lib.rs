//! # card-markup
//!
//! Layout engine for the formatted-text markup used on card elements.
//!
//! Source text is tokenized into words, spaces and tags, laid out line by
//! line against a [`TextFrame`], post-processed into background and merged
//! text rectangles, and rendered onto any [`card_surface::Surface`].
//!
//! ## Example
//!
//! ```
//! use card_markup::{render, FormattedTextData, LayoutEnv, RenderOptions, TextFrame};
//! use card_surface::{FixedMetrics, RecordingSurface};
//! use std::collections::HashMap;
//!
//! let metrics = FixedMetrics::default();
//! let images: HashMap<String, (u32, u32)> = HashMap::new();
//! let frame = TextFrame::new(200.0, 40.0);
//!
//! let data = FormattedTextData::from_markup(
//!     "Deal <b>3</b> damage",
//!     &frame,
//!     LayoutEnv::new(&metrics, &images),
//! );
//! let mut surface = RecordingSurface::new();
//! let outcome = render(&data, &mut surface, RenderOptions::default()).unwrap();
//!
//! assert!(!outcome.truncated);
//! assert_eq!(surface.texts(), vec!["Deal ", "3", " damage"]);
//! ```

mod data;
mod layout;
mod postprocess;
mod render;
mod token;
mod tokenizer;

pub use data::{FormattedTextData, LayoutOptions};
pub use layout::{layout, LayoutEnv, LayoutResult, TextFrame};
pub use postprocess::{merge_text_runs, resolve_background_spans};
pub use render::{render, RenderOptions, RenderOutcome};
pub use token::{
    BackgroundSpan, FontStyleKind, ImageRef, MarginBand, MarginSide, Markup, MarkupToken,
    MirrorAxis, TokenStyle,
};
pub use tokenizer::{tokenize, tokenize_plain};
