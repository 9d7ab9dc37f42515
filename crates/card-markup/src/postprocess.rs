//! Rectangle post-processing after layout

use crate::layout::{LayoutEnv, TextFrame};
use crate::token::{Markup, MarkupToken};
use card_surface::Rect;

/// Compute the rectangles covered by each background-color span
///
/// Every line touched by the span gets the union of its non-empty token
/// rectangles, shifted by the span offsets and grown by its padding. The
/// first line lands in `rect`, later lines in `extra_rects`.
pub fn resolve_background_spans(tokens: &mut [MarkupToken]) {
    for i in 0..tokens.len() {
        let (id, span) = match &tokens[i].markup {
            Markup::BackgroundColor(span) => (tokens[i].id, span.clone()),
            _ => continue,
        };

        let mut lines: Vec<(usize, Rect)> = Vec::new();
        for token in &tokens[i + 1..] {
            if token.markup == Markup::Close(id) {
                break;
            }
            if !token.markup.aligns() || token.rect.is_empty() {
                continue;
            }
            match lines.last_mut() {
                Some((line, rect)) if *line == token.line => *rect = rect.union(&token.rect),
                _ => lines.push((token.line, token.rect)),
            }
        }

        let mut rects = lines.into_iter().map(|(_, rect)| {
            rect.offset(span.x_offset, span.y_offset)
                .inflate(span.h_pad, span.v_pad)
        });
        let token = &mut tokens[i];
        token.rect = rects.next().unwrap_or_default();
        token.extra_rects = rects.collect();
    }
}

/// Merge neighbouring text and space tokens that share a style
///
/// Runs are joined only when the frame adds no word spacing and the spaces
/// are breakable ones. A merge is rejected when the measured run would pass
/// the frame's right edge.
pub fn merge_text_runs(
    tokens: Vec<MarkupToken>,
    frame: &TextFrame,
    env: LayoutEnv<'_>,
) -> Vec<MarkupToken> {
    if frame.word_space != 0.0 {
        return tokens;
    }

    let mut merged: Vec<MarkupToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Some(piece) = run_text(&token.markup) else {
            merged.push(token);
            continue;
        };
        if let Some(last) = merged.last_mut() {
            if let Some(joined) = try_join(last, &token, piece, frame, env) {
                *last = joined;
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

fn run_text(markup: &Markup) -> Option<&str> {
    match markup {
        Markup::Text(text) => Some(text),
        Markup::Space(None) => Some(" "),
        _ => None,
    }
}

fn try_join(
    last: &MarkupToken,
    next: &MarkupToken,
    piece: &str,
    frame: &TextFrame,
    env: LayoutEnv<'_>,
) -> Option<MarkupToken> {
    let head = run_text(&last.markup)?;
    if last.line != next.line || last.style != next.style {
        return None;
    }
    if (last.rect.right() - next.rect.x).abs() > 0.01 || last.rect.y != next.rect.y {
        return None;
    }

    let text = format!("{head}{piece}");
    let width = env.measurer.measure(&text, &last.style.font).width * last.style.scale_x;
    if last.rect.x + width > frame.width + 0.01 {
        return None;
    }

    let mut joined = last.clone();
    joined.markup = Markup::Text(text);
    joined.rect.width = width;
    joined.rect.height = last.rect.height.max(next.rect.height);
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use crate::tokenizer::tokenize;
    use card_surface::{FixedMetrics, FontSpec};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn frame(width: f32) -> TextFrame {
        TextFrame {
            font: FontSpec::new("Arial", 10.0),
            ..TextFrame::new(width, 100.0)
        }
    }

    fn laid_out(source: &str, frame: &TextFrame) -> Vec<MarkupToken> {
        let images: HashMap<String, (u32, u32)> = HashMap::new();
        layout(
            tokenize(source),
            frame,
            LayoutEnv::new(&FixedMetrics::default(), &images),
        )
        .tokens
    }

    #[test]
    fn test_background_span_per_line() {
        let mut tokens = laid_out("a <bgc=red;1;0;2;1>bb cc dd</bgc>", &frame(20.0));
        resolve_background_spans(&mut tokens);
        let span = tokens
            .iter()
            .find(|t| matches!(t.markup, Markup::BackgroundColor(_)))
            .unwrap();
        // bb on line 0 after "a ", cc dd on lines 1 and 2
        assert_eq!(span.rect, Rect::new(9.0, -1.0, 14.0, 14.0));
        assert_eq!(span.extra_rects.len(), 2);
        assert_eq!(span.extra_rects[0].y, 11.0);
    }

    #[test]
    fn test_background_span_without_content_is_empty() {
        let mut tokens = laid_out("<bgc=red></bgc>", &frame(20.0));
        resolve_background_spans(&mut tokens);
        assert!(tokens[0].rect.is_empty());
        assert!(tokens[0].extra_rects.is_empty());
    }

    #[test]
    fn test_merges_same_style_runs() {
        let images: HashMap<String, (u32, u32)> = HashMap::new();
        let metrics = FixedMetrics::default();
        let env = LayoutEnv::new(&metrics, &images);
        let f = frame(100.0);
        let tokens = laid_out("ab cd <b>ef</b>", &f);
        let merged = merge_text_runs(tokens, &f, env);
        let texts: Vec<Markup> = merged.iter().map(|t| t.markup.clone()).collect();
        assert_eq!(
            texts,
            vec![
                Markup::Text("ab cd ".to_string()),
                Markup::Text("ef".to_string()),
            ]
        );
        assert_eq!(merged[0].rect.width, 30.0);
    }

    #[test]
    fn test_no_merge_with_word_space_or_fixed_spaces() {
        let images: HashMap<String, (u32, u32)> = HashMap::new();
        let metrics = FixedMetrics::default();
        let env = LayoutEnv::new(&metrics, &images);

        let spaced = TextFrame {
            word_space: 2.0,
            ..frame(100.0)
        };
        let tokens = laid_out("ab cd", &spaced);
        assert_eq!(merge_text_runs(tokens, &spaced, env).len(), 3);

        let f = frame(100.0);
        let tokens = laid_out("ab<spc=4>cd", &f);
        assert_eq!(merge_text_runs(tokens, &f, env).len(), 3);
    }

    #[test]
    fn test_no_merge_across_lines() {
        let images: HashMap<String, (u32, u32)> = HashMap::new();
        let metrics = FixedMetrics::default();
        let env = LayoutEnv::new(&metrics, &images);
        let f = frame(20.0);
        let tokens = laid_out("aa bb", &f);
        let merged = merge_text_runs(tokens, &f, env);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].markup, Markup::Text("aa ".to_string()));
    }
}
