//! Laid-out formatted text, ready to render

use crate::layout::{layout, LayoutEnv, TextFrame};
use crate::postprocess::{merge_text_runs, resolve_background_spans};
use crate::token::MarkupToken;
use crate::tokenizer::{tokenize, tokenize_plain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Join adjacent same-style runs into single text draws
    pub merge_runs: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { merge_runs: true }
    }
}

/// Tokens of one element's text after layout
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedTextData {
    pub source: String,
    pub frame: TextFrame,
    pub tokens: Vec<MarkupToken>,
    pub line_count: usize,
    pub content_height: f32,
}

impl FormattedTextData {
    /// Tokenize and lay out markup source
    pub fn from_markup(source: &str, frame: &TextFrame, env: LayoutEnv<'_>) -> Self {
        Self::build(source, tokenize(source), frame, env, LayoutOptions::default())
    }

    /// Lay out text with no markup
    pub fn from_plain(source: &str, frame: &TextFrame, env: LayoutEnv<'_>) -> Self {
        Self::build(source, tokenize_plain(source), frame, env, LayoutOptions::default())
    }

    pub fn from_markup_with(
        source: &str,
        frame: &TextFrame,
        env: LayoutEnv<'_>,
        options: LayoutOptions,
    ) -> Self {
        Self::build(source, tokenize(source), frame, env, options)
    }

    fn build(
        source: &str,
        tokens: Vec<MarkupToken>,
        frame: &TextFrame,
        env: LayoutEnv<'_>,
        options: LayoutOptions,
    ) -> Self {
        let result = layout(tokens, frame, env);
        let mut tokens = result.tokens;
        resolve_background_spans(&mut tokens);
        if options.merge_runs {
            tokens = merge_text_runs(tokens, frame, env);
        }
        Self {
            source: source.to_string(),
            frame: frame.clone(),
            tokens,
            line_count: result.line_count,
            content_height: result.content_height,
        }
    }

    /// Whether this layout still matches the given text and frame
    pub fn is_valid_for(&self, source: &str, frame: &TextFrame) -> bool {
        self.source == source && self.frame == *frame
    }

    /// True when the content is taller than the frame
    pub fn overflows(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| t.markup.is_visible() && t.rect.bottom() > self.frame.height + 0.01)
    }
}
