//! Turns formatted-text source into a flat list of [`MarkupToken`]s
//!
//! Tags are `<name>` or `<name=args>` with `;`-separated args and close with
//! `</name>`. Unknown or malformed tags are kept as literal text. A close tag
//! closes the most recent opener with its name; openers opened after it are
//! closed first, innermost first. Openers never closed stay in effect to the
//! end of the text.

use crate::token::{
    BackgroundSpan, FontStyleKind, ImageRef, MarginBand, MarginSide, Markup, MarkupToken,
    MirrorAxis,
};
use card_surface::{Color, ColorType, FontSpec, HorizontalAlign};
use card_text::{parse_decimal, segment_text, Segment};

struct OpenTag {
    name: String,
    id: usize,
}

#[derive(Default)]
struct Tokenizer {
    tokens: Vec<MarkupToken>,
    open: Vec<OpenTag>,
    literal: String,
}

impl Tokenizer {
    fn push(&mut self, markup: Markup) -> usize {
        let id = self.tokens.len();
        self.tokens.push(MarkupToken::new(id, markup));
        id
    }

    fn flush_literal(&mut self) {
        if self.literal.is_empty() {
            return;
        }
        let literal = std::mem::take(&mut self.literal);
        for segment in segment_text(&literal) {
            match segment {
                Segment::Word(word) => self.push(Markup::Text(word)),
                Segment::Space => self.push(Markup::Space(None)),
                Segment::Newline => self.push(Markup::LineBreak),
            };
        }
    }

    fn open_tag(&mut self, name: &str, markup: Markup) {
        self.flush_literal();
        let closes = markup.closes();
        let id = self.push(markup);
        if closes {
            self.open.push(OpenTag {
                name: name.to_string(),
                id,
            });
        }
    }

    fn close_tag(&mut self, name: &str) -> bool {
        let Some(pos) = self.open.iter().rposition(|t| t.name == name) else {
            log::debug!("discarding close tag without opener: </{name}>");
            // an unmatched close is dropped rather than shown as text
            return true;
        };
        self.flush_literal();
        let closing: Vec<OpenTag> = self.open.drain(pos..).collect();
        for tag in closing.iter().rev() {
            self.push(Markup::Close(tag.id));
        }
        true
    }

    fn finish(mut self) -> Vec<MarkupToken> {
        self.flush_literal();
        self.tokens
    }
}

/// Tokenize formatted-text markup
///
/// # Example
///
/// ```
/// use card_markup::{tokenize, Markup};
///
/// let tokens = tokenize("<b>Hi</b>");
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[1].markup, Markup::Text("Hi".to_string()));
/// assert_eq!(tokens[2].markup, Markup::Close(0));
/// ```
pub fn tokenize(source: &str) -> Vec<MarkupToken> {
    let mut state = Tokenizer::default();
    let mut rest = source;

    while let Some(start) = rest.find('<') {
        state.literal.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            state.literal.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let body = &after[..end];
        if !apply_tag(&mut state, body) {
            state.literal.push('<');
            state.literal.push_str(body);
            state.literal.push('>');
        }
        rest = &after[end + 1..];
    }
    state.literal.push_str(rest);
    state.finish()
}

/// Tokenize text with no markup: only words, spaces and line breaks
pub fn tokenize_plain(source: &str) -> Vec<MarkupToken> {
    let mut state = Tokenizer::default();
    state.literal.push_str(source);
    state.finish()
}

fn apply_tag(state: &mut Tokenizer, body: &str) -> bool {
    if let Some(name) = body.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        if !is_tag_name(&name) {
            return false;
        }
        return state.close_tag(&name);
    }

    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    };
    let name = name.trim().to_ascii_lowercase();
    match parse_tag(&name, value) {
        Some(markup) => {
            state.open_tag(&name, markup);
            true
        }
        None => false,
    }
}

const TAG_NAMES: &[&str] = &[
    "b", "i", "u", "s", "br", "caps", "al", "ac", "ar", "mh", "mv", "spc", "f", "fs", "fscl",
    "fc", "imgc", "bgc", "img", "bgi", "xo", "yo", "px", "push", "ls", "mgnl", "mgnr", "p", "ct",
    "cm",
];

fn is_tag_name(name: &str) -> bool {
    TAG_NAMES.contains(&name)
}

fn args(value: Option<&str>) -> Vec<&str> {
    match value {
        Some(v) => v.split(';').map(str::trim).collect(),
        None => Vec::new(),
    }
}

fn num(s: &str) -> Option<f32> {
    parse_decimal(s).ok().map(|n| n as f32)
}

fn nums(parts: &[&str]) -> Option<Vec<f32>> {
    parts.iter().map(|p| num(p)).collect()
}

fn parse_tag(name: &str, value: Option<&str>) -> Option<Markup> {
    let parts = args(value);
    let markup = match name {
        "b" => Markup::FontStyle(FontStyleKind::Bold),
        "i" => Markup::FontStyle(FontStyleKind::Italic),
        "u" => Markup::FontStyle(FontStyleKind::Underline),
        "s" => Markup::FontStyle(FontStyleKind::Strikeout),
        "br" => Markup::LineBreak,
        "caps" => Markup::AllCaps,
        "al" => Markup::Alignment(HorizontalAlign::Left),
        "ac" => Markup::Alignment(HorizontalAlign::Center),
        "ar" => Markup::Alignment(HorizontalAlign::Right),
        "mh" => Markup::Mirror(MirrorAxis::Horizontal),
        "mv" => Markup::Mirror(MirrorAxis::Vertical),
        "spc" => match value {
            None => Markup::Space(None),
            Some(v) => Markup::Space(Some(num(v)?)),
        },
        "f" => Markup::Font(FontSpec::parse(value?).ok()?),
        "fs" => {
            let size = num(value?)?;
            if size <= 0.0 {
                return None;
            }
            Markup::FontSize(size)
        }
        "fscl" => {
            let n = nums(&parts)?;
            match n.as_slice() {
                [x] => Markup::FontScale { x: *x, y: *x },
                [x, y] => Markup::FontScale { x: *x, y: *y },
                _ => return None,
            }
        }
        "fc" => Markup::FontColor(Color::parse(value?).ok()?),
        "imgc" => Markup::ImageColor(Color::parse(value?).ok()?),
        "bgc" => Markup::BackgroundColor(background_span(&parts)?),
        "img" => Markup::Image(image_ref(&parts, true)?),
        "bgi" => Markup::BackgroundImage(image_ref(&parts, false)?),
        "xo" => Markup::DrawOffset {
            x: num(value?)?,
            y: 0.0,
        },
        "yo" => Markup::DrawOffset {
            x: 0.0,
            y: num(value?)?,
        },
        "px" => {
            let n = nums(&parts)?;
            match n.as_slice() {
                [x] => Markup::PixelOffset { x: *x, y: 0.0 },
                [x, y] => Markup::PixelOffset { x: *x, y: *y },
                _ => return None,
            }
        }
        "push" => {
            let n = nums(&parts)?;
            match n.as_slice() {
                [x] => Markup::Push { x: *x, y: 0.0 },
                [x, y] => Markup::Push { x: *x, y: *y },
                _ => return None,
            }
        }
        "ls" => Markup::LineSpacing(num(value?)?),
        "mgnl" => Markup::Margin(margin_band(MarginSide::Left, &parts)?),
        "mgnr" => Markup::Margin(margin_band(MarginSide::Right, &parts)?),
        "p" => {
            let n = nums(&parts)?;
            match n.as_slice() {
                [first] => Markup::Paragraph {
                    first: *first,
                    rest: 0.0,
                },
                [first, rest] => Markup::Paragraph {
                    first: *first,
                    rest: *rest,
                },
                _ => return None,
            }
        }
        "ct" => Markup::ColorType(value?.parse::<ColorType>().ok()?),
        "cm" => {
            let n = nums(&parts)?;
            match n.as_slice() {
                [r, g, b] => Markup::ColorMatrix([*r, *g, *b, 1.0]),
                [r, g, b, a] => Markup::ColorMatrix([*r, *g, *b, *a]),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(markup)
}

fn background_span(parts: &[&str]) -> Option<BackgroundSpan> {
    let (color, rest) = parts.split_first()?;
    let color = Color::parse(color).ok()?;
    let n = nums(rest)?;
    let (x_offset, y_offset, h_pad, v_pad) = match n.as_slice() {
        [] => (0.0, 0.0, 0.0, 0.0),
        [v_pad] => (0.0, 0.0, 0.0, *v_pad),
        [x, y, h, v] => (*x, *y, *h, *v),
        _ => return None,
    };
    Some(BackgroundSpan {
        color,
        x_offset,
        y_offset,
        h_pad,
        v_pad,
    })
}

/// `file[;pct][;xoff;yoff][;w;h]`
///
/// An odd number of numeric args means the first is the percentage.
fn image_ref(parts: &[&str], allow_percent: bool) -> Option<ImageRef> {
    let (path, rest) = parts.split_first()?;
    if path.is_empty() {
        return None;
    }
    let mut image = ImageRef::new(path);
    let mut n = nums(rest)?;
    if n.len() % 2 == 1 {
        if !allow_percent {
            return None;
        }
        image.percent = Some(n.remove(0));
    }
    match n.as_slice() {
        [] => {}
        [x, y] => {
            image.x_offset = *x;
            image.y_offset = *y;
        }
        [x, y, w, h] => {
            image.x_offset = *x;
            image.y_offset = *y;
            image.width = Some(*w);
            image.height = Some(*h);
        }
        _ => return None,
    }
    Some(image)
}

fn margin_band(side: MarginSide, parts: &[&str]) -> Option<MarginBand> {
    let n = nums(parts)?;
    let (offset, top, bottom) = match n.as_slice() {
        [offset] => (*offset, None, None),
        [offset, top] => (*offset, Some(*top), None),
        [offset, top, bottom] => (*offset, Some(*top), Some(*bottom)),
        _ => return None,
    };
    Some(MarginBand {
        side,
        offset,
        top,
        bottom,
    })
}
