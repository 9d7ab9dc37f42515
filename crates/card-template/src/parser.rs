//! Layout JSON parsing and font loading

use crate::{FontDef, Layout, Result, TemplateError};
use card_surface::{FontBook, FontFamilyBuilder};
use std::path::Path;

/// Parse a layout from JSON string
pub fn parse_layout(json: &str) -> Result<Layout> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Read every font family a layout declares into a [`FontBook`]
///
/// Relative font paths are resolved against `base_dir`.
pub fn load_font_book(fonts: &[FontDef], base_dir: &Path) -> Result<FontBook> {
    let mut book = FontBook::new();
    for font_def in fonts {
        let builder = load_font_family(font_def, base_dir)?;
        book.register_family(&font_def.id, builder)?;
    }
    Ok(book)
}

fn load_font_family(font_def: &FontDef, base_dir: &Path) -> Result<FontFamilyBuilder> {
    let read = |path: &str| {
        std::fs::read(base_dir.join(path))
            .map_err(|e| TemplateError::FontError(format!("Failed to read font {path}: {e}")))
    };

    let Some(regular) = &font_def.regular else {
        return Err(TemplateError::FontError(format!(
            "Font '{}' has no regular variant",
            font_def.id
        )));
    };

    let mut builder = FontFamilyBuilder::new().regular(read(regular)?);
    if let Some(path) = &font_def.bold {
        builder = builder.bold(read(path)?);
    }
    if let Some(path) = &font_def.italic {
        builder = builder.italic(read(path)?);
    }
    if let Some(path) = &font_def.bold_italic {
        builder = builder.bold_italic(read(path)?);
    }
    log::debug!("loaded font family {}", font_def.id);
    Ok(builder)
}
