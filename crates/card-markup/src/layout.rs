//! Stack-based layout of markup tokens into lines

use crate::token::{
    FontStyleKind, ImageRef, MarginBand, MarginSide, Markup, MarkupToken, MirrorAxis, TokenStyle,
};
use card_surface::{
    Color, FontSpec, HorizontalAlign, ImageSource, ImageStyle, Mirror, Outline, Rect,
    TextMeasurer, VerticalAlign,
};
use std::collections::HashMap;

const EPSILON: f32 = 0.001;

/// Element-level settings a formatted text is laid out against
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub width: f32,
    pub height: f32,
    pub font: FontSpec,
    pub color: Color,
    pub align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    /// Fixed line advance; `0` derives it from the line content
    pub line_height: f32,
    /// Extra width added to every breakable space
    pub word_space: f32,
    pub outline: Option<Outline>,
}

impl TextFrame {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            font: FontSpec::default(),
            color: Color::black(),
            align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 0.0,
            word_space: 0.0,
            outline: None,
        }
    }
}

/// Measurement services used during layout
#[derive(Clone, Copy)]
pub struct LayoutEnv<'a> {
    pub measurer: &'a dyn TextMeasurer,
    pub images: &'a dyn ImageSource,
}

impl<'a> LayoutEnv<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer, images: &'a dyn ImageSource) -> Self {
        Self { measurer, images }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    /// Tokens that draw something, in source order
    pub tokens: Vec<MarkupToken>,
    pub line_count: usize,
    /// Bottom of the last line before vertical alignment
    pub content_height: f32,
}

#[derive(Debug, Clone)]
struct ScopedState {
    font: FontSpec,
    color: Color,
    scale_x: f32,
    scale_y: f32,
    align: HorizontalAlign,
    draw_offset: (f32, f32),
    pixel_offset: (f32, f32),
    line_spacing: f32,
    mirror: Mirror,
    caps: bool,
    image: ImageStyle,
    margins: Vec<MarginBand>,
    paragraph: Option<(f32, f32)>,
}

impl ScopedState {
    fn new(frame: &TextFrame) -> Self {
        Self {
            font: frame.font.clone(),
            color: frame.color,
            scale_x: 1.0,
            scale_y: 1.0,
            align: frame.align,
            draw_offset: (0.0, 0.0),
            pixel_offset: (0.0, 0.0),
            line_spacing: 1.0,
            mirror: Mirror::default(),
            caps: false,
            image: ImageStyle::default(),
            margins: Vec::new(),
            paragraph: None,
        }
    }

    fn style(&self) -> TokenStyle {
        TokenStyle {
            font: self.font.clone(),
            color: self.color,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            align: self.align,
            mirror: self.mirror,
            draw_offset: self.draw_offset,
            pixel_offset: self.pixel_offset,
            image: self.image,
        }
    }
}

struct SavedState {
    state: ScopedState,
    starts_paragraph: bool,
    background: bool,
}

struct Layouter<'a> {
    frame: &'a TextFrame,
    env: LayoutEnv<'a>,
    state: ScopedState,
    saved: HashMap<usize, SavedState>,
    out: Vec<MarkupToken>,
    x: f32,
    y: f32,
    line: usize,
    line_start: usize,
    line_left: f32,
    line_right: f32,
    line_has_content: bool,
    after_wrap: bool,
    paragraph_first: bool,
    content_bottom: f32,
}

impl<'a> Layouter<'a> {
    fn new(frame: &'a TextFrame, env: LayoutEnv<'a>) -> Self {
        let mut layouter = Self {
            frame,
            env,
            state: ScopedState::new(frame),
            saved: HashMap::new(),
            out: Vec::new(),
            x: 0.0,
            y: 0.0,
            line: 0,
            line_start: 0,
            line_left: 0.0,
            line_right: frame.width,
            line_has_content: false,
            after_wrap: false,
            paragraph_first: false,
            content_bottom: 0.0,
        };
        layouter.begin_line();
        layouter
    }

    fn font_line_height(&self) -> f32 {
        self.env.measurer.line_height(&self.state.font) * self.state.scale_y
    }

    fn bounds(&self, top: f32) -> (f32, f32) {
        let bottom = top + self.font_line_height();
        let mut left = 0.0_f32;
        let mut right = self.frame.width;
        for band in self.state.margins.iter().filter(|b| b.applies(top, bottom)) {
            match band.side {
                MarginSide::Left => left = left.max(band.offset),
                MarginSide::Right => right = right.min(self.frame.width - band.offset),
            }
        }
        if let Some((first, rest)) = self.state.paragraph {
            left += if self.paragraph_first { first } else { rest };
        }
        (left, right.max(left))
    }

    fn begin_line(&mut self) {
        self.line_start = self.out.len();
        self.line_has_content = false;
        let (left, right) = self.bounds(self.y);
        self.line_left = left;
        self.line_right = right;
        self.x = left;
    }

    /// Margins and indents changed; only an empty line picks them up
    fn refresh_bounds(&mut self) {
        if self.line_has_content {
            return;
        }
        let (left, right) = self.bounds(self.y);
        self.line_left = left;
        self.line_right = right;
        self.x = self.x.max(left);
    }

    /// Align the current line and return its advance
    fn finish_line(&mut self) -> f32 {
        let fallback_height = self.font_line_height();
        let line_top = self.y;
        let (line_left, line_right) = (self.line_left, self.line_right);
        let tokens = &mut self.out[self.line_start..];

        let tallest = tokens
            .iter()
            .filter(|t| t.markup.aligns())
            .map(|t| t.rect.height)
            .fold(0.0_f32, f32::max);
        let content_height = if tallest > 0.0 { tallest } else { fallback_height };

        let align = tokens
            .iter()
            .find(|t| t.markup.is_visible())
            .map(|t| t.style.align)
            .unwrap_or(HorizontalAlign::Left);
        let used_right = tokens
            .iter()
            .filter(|t| t.markup.is_visible())
            .map(|t| t.rect.right())
            .fold(f32::MIN, f32::max);
        let used_left = tokens
            .iter()
            .filter(|t| t.markup.aligns())
            .map(|t| t.rect.x)
            .fold(f32::MAX, f32::min);
        let shift = if used_right == f32::MIN {
            0.0
        } else {
            let free = (line_right - used_right).max(0.0);
            match align {
                HorizontalAlign::Left => 0.0,
                HorizontalAlign::Center => (free - (used_left - line_left)) / 2.0,
                HorizontalAlign::Right => free,
            }
        };

        for token in tokens.iter_mut().filter(|t| t.markup.aligns()) {
            let (image_x, image_y) = match &token.markup {
                Markup::Image(image) => (image.x_offset, image.y_offset),
                _ => (0.0, 0.0),
            };
            // rect.y holds the cursor y at placement time
            let (dx, dy) = token.style.draw_offset;
            token.rect.x += shift + dx + image_x;
            token.rect.y += content_height - token.rect.height + dy + image_y;
        }

        self.content_bottom = self.content_bottom.max(line_top + content_height);
        let advance = if self.frame.line_height > 0.0 {
            self.frame.line_height
        } else {
            content_height
        };
        advance * self.state.line_spacing
    }

    fn new_line(&mut self, wrapped: bool) {
        let advance = self.finish_line();
        self.y += advance;
        self.line += 1;
        self.paragraph_first = false;
        self.begin_line();
        self.after_wrap = wrapped;
    }

    fn place(&mut self, mut token: MarkupToken, width: f32, height: f32) {
        let is_space = matches!(token.markup, Markup::Space(_));
        if self.line_has_content && self.x + width > self.line_right + EPSILON {
            self.new_line(true);
            if is_space {
                return;
            }
        }
        if is_space && self.after_wrap && !self.line_has_content {
            return;
        }

        token.rect = Rect::new(self.x, self.y, width, height);
        token.line = self.line;
        token.style = self.state.style();
        self.x += width;
        if !is_space {
            self.line_has_content = true;
            self.after_wrap = false;
        }
        self.out.push(token);
    }

    fn image_size(&self, image: &ImageRef) -> (f32, f32) {
        let Some((w, h)) = self.env.images.dimensions(&image.path) else {
            log::debug!("image not available for layout: {}", image.path);
            return (0.0, 0.0);
        };
        if let (Some(width), Some(height)) = (image.width, image.height) {
            return (width, height);
        }
        let scale = image.percent.map_or(1.0, |p| p / 100.0);
        (w as f32 * scale, h as f32 * scale)
    }

    fn save(&mut self, id: usize, starts_paragraph: bool, background: bool) {
        self.saved.insert(
            id,
            SavedState {
                state: self.state.clone(),
                starts_paragraph,
                background,
            },
        );
    }

    fn apply(&mut self, mut token: MarkupToken) {
        let id = token.id;
        match token.markup.clone() {
            Markup::Text(text) => {
                let text = if self.state.caps {
                    text.to_uppercase()
                } else {
                    text
                };
                let size = self.env.measurer.measure(&text, &self.state.font);
                token.markup = Markup::Text(text);
                let (w, h) = (size.width * self.state.scale_x, size.height * self.state.scale_y);
                self.place(token, w, h);
            }
            Markup::Space(fixed) => {
                let width = match fixed {
                    Some(width) => width,
                    None => {
                        self.env.measurer.measure(" ", &self.state.font).width * self.state.scale_x
                            + self.frame.word_space
                    }
                };
                let height = self.font_line_height();
                self.place(token, width, height);
            }
            Markup::Image(image) => {
                let (w, h) = self.image_size(&image);
                self.place(token, w, h);
            }
            Markup::BackgroundImage(image) => {
                let (w, h) = self.image_size(&image);
                token.rect = Rect::new(self.x + image.x_offset, self.y + image.y_offset, w, h);
                token.line = self.line;
                token.style = self.state.style();
                self.out.push(token);
            }
            Markup::BackgroundColor(_) => {
                self.save(id, false, true);
                token.line = self.line;
                token.style = self.state.style();
                self.out.push(token);
            }
            Markup::LineBreak => self.new_line(false),
            Markup::Push { x, y } => {
                self.x += x;
                self.y += y;
            }
            Markup::Close(opener) => {
                let Some(saved) = self.saved.remove(&opener) else {
                    return;
                };
                self.state = saved.state;
                if saved.starts_paragraph {
                    if self.line_has_content {
                        self.new_line(false);
                    } else {
                        self.refresh_bounds();
                    }
                }
                if saved.background {
                    token.line = self.line;
                    self.out.push(token);
                }
            }
            Markup::Paragraph { first, rest } => {
                let starts = self.state.paragraph.is_none();
                self.save(id, starts, false);
                if starts {
                    if self.line_has_content {
                        self.new_line(false);
                    }
                    self.state.paragraph = Some((first, rest));
                    self.paragraph_first = true;
                    self.line_left = 0.0;
                    self.x = 0.0;
                    self.refresh_bounds();
                }
            }
            Markup::Margin(band) => {
                self.save(id, false, false);
                self.state.margins.push(band);
                self.refresh_bounds();
            }
            style => {
                self.save(id, false, false);
                self.apply_style(style);
            }
        }
    }

    fn apply_style(&mut self, markup: Markup) {
        let state = &mut self.state;
        match markup {
            Markup::Font(font) => state.font = font,
            Markup::FontSize(size) => state.font.size = size,
            Markup::FontScale { x, y } => {
                state.scale_x = x;
                state.scale_y = y;
            }
            Markup::FontColor(color) => state.color = color,
            Markup::FontStyle(kind) => match kind {
                FontStyleKind::Bold => state.font.bold = true,
                FontStyleKind::Italic => state.font.italic = true,
                FontStyleKind::Underline => state.font.underline = true,
                FontStyleKind::Strikeout => state.font.strikeout = true,
            },
            Markup::Alignment(align) => state.align = align,
            Markup::Mirror(MirrorAxis::Horizontal) => state.mirror.horizontal = true,
            Markup::Mirror(MirrorAxis::Vertical) => state.mirror.vertical = true,
            Markup::DrawOffset { x, y } => {
                state.draw_offset.0 += x;
                state.draw_offset.1 += y;
            }
            Markup::PixelOffset { x, y } => {
                state.pixel_offset.0 += x;
                state.pixel_offset.1 += y;
            }
            Markup::LineSpacing(spacing) => state.line_spacing = spacing,
            Markup::AllCaps => state.caps = true,
            Markup::ColorType(color_type) => state.image.color_type = color_type,
            Markup::ColorMatrix(matrix) => state.image.matrix = Some(matrix),
            Markup::ImageColor(color) => state.image.tint = Some(color),
            _ => {}
        }
    }

    fn finish(mut self) -> LayoutResult {
        self.finish_line();
        let content_height = self.content_bottom;
        let frame = self.frame;
        if content_height <= frame.height {
            let shift = match frame.vertical_align {
                VerticalAlign::Top => 0.0,
                VerticalAlign::Middle => (frame.height - content_height) / 2.0,
                VerticalAlign::Bottom => frame.height - content_height,
            };
            if shift > 0.0 {
                for token in &mut self.out {
                    token.rect.y += shift;
                }
            }
        }
        LayoutResult {
            tokens: self.out,
            line_count: self.line + 1,
            content_height,
        }
    }
}

/// Lay out tokens inside `frame`
///
/// Style tokens are consumed; the result keeps text, spaces, images and
/// background spans with their rectangles set.
pub fn layout(tokens: Vec<MarkupToken>, frame: &TextFrame, env: LayoutEnv<'_>) -> LayoutResult {
    let mut layouter = Layouter::new(frame, env);
    for token in tokens {
        layouter.apply(token);
    }
    layouter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use card_surface::FixedMetrics;
    use pretty_assertions::assert_eq;

    fn frame(width: f32) -> TextFrame {
        TextFrame {
            font: FontSpec::new("Arial", 10.0),
            ..TextFrame::new(width, 100.0)
        }
    }

    fn run(source: &str, frame: &TextFrame) -> LayoutResult {
        let images: HashMap<String, (u32, u32)> =
            HashMap::from([("gem.png".to_string(), (40, 20))]);
        let metrics = FixedMetrics::default();
        layout(tokenize(source), frame, LayoutEnv::new(&metrics, &images))
    }

    fn text_rects(result: &LayoutResult) -> Vec<(String, usize, f32, f32)> {
        result
            .tokens
            .iter()
            .filter_map(|t| match &t.markup {
                Markup::Text(s) => Some((s.clone(), t.line, t.rect.x, t.rect.y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_wraps_words() {
        let result = run("aa bb cc", &frame(30.0));
        assert_eq!(
            text_rects(&result),
            vec![
                ("aa".to_string(), 0, 0.0, 0.0),
                ("bb".to_string(), 0, 15.0, 0.0),
                ("cc".to_string(), 1, 0.0, 12.0),
            ]
        );
        assert_eq!(result.line_count, 2);
        assert_eq!(result.content_height, 24.0);
    }

    #[test]
    fn test_space_that_overflows_is_dropped() {
        let result = run("aaaa bb", &frame(20.0));
        let spaces = result
            .tokens
            .iter()
            .filter(|t| matches!(t.markup, Markup::Space(_)))
            .count();
        assert_eq!(spaces, 0);
        assert_eq!(text_rects(&result)[1], ("bb".to_string(), 1, 0.0, 12.0));
    }

    #[test]
    fn test_long_word_alone_stays_on_line() {
        let result = run("abcdefgh", &frame(20.0));
        assert_eq!(result.line_count, 1);
        assert_eq!(result.tokens[0].rect.width, 40.0);
    }

    #[test]
    fn test_alignment_from_tags_and_frame() {
        let result = run("<ac>ab</ac>", &frame(100.0));
        assert_eq!(result.tokens[0].rect.x, 45.0);

        let right = TextFrame {
            align: HorizontalAlign::Right,
            ..frame(100.0)
        };
        let result = run("ab", &right);
        assert_eq!(result.tokens[0].rect.x, 90.0);
    }

    #[test]
    fn test_tokens_share_line_bottom() {
        let result = run("a<fs=20>b", &frame(100.0));
        assert_eq!(
            text_rects(&result),
            vec![("a".to_string(), 0, 0.0, 12.0), ("b".to_string(), 0, 5.0, 0.0)]
        );
    }

    #[test]
    fn test_fixed_line_height_and_spacing() {
        let fixed = TextFrame {
            line_height: 30.0,
            ..frame(100.0)
        };
        let result = run("a<br>b", &fixed);
        assert_eq!(text_rects(&result)[1].3, 30.0);

        let result = run("<ls=2>a<br>b", &frame(100.0));
        assert_eq!(text_rects(&result)[1].3, 24.0);
    }

    #[test]
    fn test_paragraph_breaks_and_indents() {
        let result = run("ab <p=10;2>cd</p>gh", &frame(1000.0));
        assert_eq!(
            text_rects(&result),
            vec![
                ("ab".to_string(), 0, 0.0, 0.0),
                ("cd".to_string(), 1, 10.0, 12.0),
                ("gh".to_string(), 2, 0.0, 24.0),
            ]
        );

        let result = run("<p=10;2>aa bb cc</p>", &frame(30.0));
        assert_eq!(
            text_rects(&result),
            vec![
                ("aa".to_string(), 0, 10.0, 0.0),
                ("bb".to_string(), 1, 2.0, 12.0),
                ("cc".to_string(), 1, 17.0, 12.0),
            ]
        );
    }

    #[test]
    fn test_nested_paragraph_is_ignored() {
        let result = run("<p=10;0>a<p=50;0>b</p>c</p>", &frame(1000.0));
        let rects = text_rects(&result);
        assert_eq!(rects.len(), 3);
        assert!(rects.iter().all(|r| r.1 == 0));
        assert_eq!(rects[1].2, 15.0);
    }

    #[test]
    fn test_margin_bands() {
        let result = run("<mgnl=8;0;10>ab<br>cd", &frame(100.0));
        assert_eq!(text_rects(&result)[0].2, 8.0);
        assert_eq!(text_rects(&result)[1].2, 0.0);

        let result = run("<mgnr=80>aa bb cc", &frame(100.0));
        assert_eq!(result.line_count, 3);
    }

    #[test]
    fn test_caps_and_scoped_styles() {
        let result = run("<caps>ab</caps> <fc=red><b>c</b></fc>d", &frame(100.0));
        let texts: Vec<&MarkupToken> = result
            .tokens
            .iter()
            .filter(|t| t.markup.is_visible())
            .collect();
        assert_eq!(texts[0].markup, Markup::Text("AB".to_string()));
        assert_eq!(texts[1].style.color, Color::rgb(255, 0, 0));
        assert!(texts[1].style.font.bold);
        assert_eq!(texts[2].style.color, Color::black());
        assert!(!texts[2].style.font.bold);
    }

    #[test]
    fn test_unclosed_tags_persist() {
        let result = run("<b>a b", &frame(100.0));
        assert!(result
            .tokens
            .iter()
            .filter(|t| t.markup.is_visible())
            .all(|t| t.style.font.bold));
    }

    #[test]
    fn test_only_drawable_tokens_are_kept() {
        let result = run("<b>a</b><bgc=red>b</bgc>", &frame(100.0));
        let kinds: Vec<bool> = result
            .tokens
            .iter()
            .map(|t| matches!(t.markup, Markup::Text(_)))
            .collect();
        assert_eq!(kinds, vec![true, false, true, false]);
    }

    #[test]
    fn test_image_sizes() {
        let result = run("<img=gem.png;50>", &frame(100.0));
        assert_eq!(result.tokens[0].rect, Rect::new(0.0, 0.0, 20.0, 10.0));

        let result = run("<img=gem.png;1;2;8;8>", &frame(100.0));
        assert_eq!(result.tokens[0].rect, Rect::new(1.0, 2.0, 8.0, 8.0));

        let result = run("<img=missing.png>", &frame(100.0));
        assert!(result.tokens[0].rect.is_empty());
    }

    #[test]
    fn test_vertical_alignment_when_content_fits() {
        let bottom = TextFrame {
            vertical_align: VerticalAlign::Bottom,
            ..frame(100.0)
        };
        let result = run("ab", &bottom);
        assert_eq!(result.tokens[0].rect.y, 88.0);

        let middle = TextFrame {
            vertical_align: VerticalAlign::Middle,
            ..frame(100.0)
        };
        let result = run("ab", &middle);
        assert_eq!(result.tokens[0].rect.y, 44.0);

        let tall = TextFrame {
            vertical_align: VerticalAlign::Bottom,
            height: 5.0,
            ..frame(100.0)
        };
        let result = run("ab", &tall);
        assert_eq!(result.tokens[0].rect.y, 0.0);
    }

    #[test]
    fn test_draw_offset_and_push() {
        let result = run("<xo=3>a</xo><push=10>b", &frame(100.0));
        let rects = text_rects(&result);
        assert_eq!(rects[0].2, 3.0);
        assert_eq!(rects[1].2, 15.0);
    }

    #[test]
    fn test_vertical_push_moves_only_later_tokens() {
        let result = run("a<push=0;20>b c", &frame(100.0));
        assert_eq!(
            text_rects(&result),
            vec![
                ("a".to_string(), 0, 0.0, 0.0),
                ("b".to_string(), 0, 5.0, 20.0),
                ("c".to_string(), 0, 15.0, 20.0),
            ]
        );
        assert_eq!(result.content_height, 32.0);

        let result = run("a<push=0;20>b<br>c", &frame(100.0));
        assert_eq!(text_rects(&result)[2], ("c".to_string(), 1, 0.0, 32.0));
    }
}
