//! Draws laid-out tokens onto a [`Surface`]

use crate::data::FormattedTextData;
use crate::token::{Markup, MarkupToken};
use card_surface::{Color, ImageDraw, Result, Surface, TextDraw};

const OVERFLOW_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Outline every token rectangle
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub drawn: usize,
    /// Some tokens were left out because they fell below the frame
    pub truncated: bool,
}

/// Render formatted text inside the current element
///
/// Background spans and images are drawn before any text. The first visible
/// token whose bottom lies below the frame stops rendering of it and of
/// every later token.
pub fn render(
    data: &FormattedTextData,
    surface: &mut dyn Surface,
    options: RenderOptions,
) -> Result<RenderOutcome> {
    let height = data.frame.height;
    let cutoff = data
        .tokens
        .iter()
        .position(|t| t.markup.is_visible() && t.rect.bottom() > height + OVERFLOW_TOLERANCE)
        .unwrap_or(data.tokens.len());
    let cutoff_top = data.tokens.get(cutoff).map(|t| t.rect.y);
    let visible = &data.tokens[..cutoff];
    let mut drawn = 0;

    for token in visible {
        match &token.markup {
            Markup::BackgroundColor(span) => {
                for rect in token.rects() {
                    if rect.is_empty() || cutoff_top.is_some_and(|top| rect.y >= top) {
                        continue;
                    }
                    surface.fill_rect(*rect, span.color)?;
                    drawn += 1;
                }
            }
            Markup::BackgroundImage(image) if !token.rect.is_empty() => {
                surface.draw_image(&image_draw(token, &image.path))?;
                drawn += 1;
            }
            _ => {}
        }
    }

    for token in visible {
        match &token.markup {
            Markup::Text(text) => {
                let (px, py) = token.style.pixel_offset;
                surface.draw_text(&TextDraw {
                    text: text.clone(),
                    rect: token.rect.offset(px, py),
                    font: token.style.font.clone(),
                    color: token.style.color,
                    scale_x: token.style.scale_x,
                    scale_y: token.style.scale_y,
                    outline: data.frame.outline,
                    mirror: token.style.mirror,
                })?;
                drawn += 1;
            }
            Markup::Image(image) if !token.rect.is_empty() => {
                surface.draw_image(&image_draw(token, &image.path))?;
                drawn += 1;
            }
            _ => {}
        }
    }

    if options.debug {
        draw_debug(visible, surface)?;
    }

    let truncated = cutoff < data.tokens.len();
    if truncated {
        log::debug!(
            "formatted text truncated at token {cutoff} of {}",
            data.tokens.len()
        );
    }
    Ok(RenderOutcome { drawn, truncated })
}

fn image_draw(token: &MarkupToken, path: &str) -> ImageDraw {
    let (px, py) = token.style.pixel_offset;
    ImageDraw {
        path: path.to_string(),
        rect: token.rect.offset(px, py),
        style: token.style.image,
        mirror: token.style.mirror,
    }
}

fn draw_debug(tokens: &[MarkupToken], surface: &mut dyn Surface) -> Result<()> {
    let outline = Color::rgb(255, 0, 0);
    let space = Color::rgba(0, 0, 255, 64);
    for token in tokens {
        match token.markup {
            Markup::Space(_) => surface.fill_rect(token.rect, space)?,
            _ => {
                for rect in token.rects().filter(|r| !r.is_empty()) {
                    surface.stroke_rect(*rect, outline, 0.5)?;
                }
            }
        }
    }
    Ok(())
}
