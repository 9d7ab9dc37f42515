//! Markup token variants

use card_surface::{Color, ColorType, FontSpec, HorizontalAlign, ImageStyle, Mirror, Rect};

/// Style flag toggled by `<b>`, `<i>`, `<u>` and `<s>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyleKind {
    Bold,
    Italic,
    Underline,
    Strikeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginSide {
    Left,
    Right,
}

/// Image reference from `<img>` or `<bgi>`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub path: String,
    /// Scale relative to the image's pixel size
    pub percent: Option<f32>,
    pub x_offset: f32,
    pub y_offset: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl ImageRef {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            percent: None,
            x_offset: 0.0,
            y_offset: 0.0,
            width: None,
            height: None,
        }
    }
}

/// Background span from `<bgc>`
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundSpan {
    pub color: Color,
    pub x_offset: f32,
    pub y_offset: f32,
    pub h_pad: f32,
    pub v_pad: f32,
}

/// Exclusion band from `<mgnl>` / `<mgnr>`
///
/// `top` / `bottom` bound the vertical extent (element coordinates); `None`
/// means unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginBand {
    pub side: MarginSide,
    pub offset: f32,
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl MarginBand {
    /// Whether a line spanning `top..bottom` intersects the band
    pub fn applies(&self, top: f32, bottom: f32) -> bool {
        let band_top = self.top.unwrap_or(f32::MIN);
        let band_bottom = self.bottom.unwrap_or(f32::MAX);
        band_top < bottom && band_bottom > top
    }
}

/// One parsed unit of the formatted-text language
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Text(String),
    LineBreak,
    /// Breakable space; `Some(width)` for a fixed `<spc=n>`
    Space(Option<f32>),
    Image(ImageRef),
    BackgroundImage(ImageRef),
    BackgroundColor(BackgroundSpan),
    Font(FontSpec),
    FontSize(f32),
    FontScale { x: f32, y: f32 },
    FontColor(Color),
    FontStyle(FontStyleKind),
    Alignment(HorizontalAlign),
    Mirror(MirrorAxis),
    /// `<xo>` / `<yo>`: shifts placed tokens
    DrawOffset { x: f32, y: f32 },
    /// `<px>`: shifts drawing only
    PixelOffset { x: f32, y: f32 },
    LineSpacing(f32),
    Margin(MarginBand),
    Paragraph { first: f32, rest: f32 },
    Push { x: f32, y: f32 },
    /// Closes the token with this id
    Close(usize),
    AllCaps,
    ColorType(ColorType),
    ColorMatrix([f32; 4]),
    ImageColor(Color),
}

impl Markup {
    /// Whether this opener is scoped by a matching close tag
    pub fn closes(&self) -> bool {
        !matches!(
            self,
            Markup::Text(_)
                | Markup::LineBreak
                | Markup::Space(_)
                | Markup::Image(_)
                | Markup::BackgroundImage(_)
                | Markup::Push { .. }
                | Markup::Close(_)
        )
    }

    /// Whether the token takes part in line wrapping and alignment
    pub fn aligns(&self) -> bool {
        matches!(self, Markup::Text(_) | Markup::Space(_) | Markup::Image(_))
    }

    /// Whether the token draws foreground content
    pub fn is_visible(&self) -> bool {
        matches!(self, Markup::Text(_) | Markup::Image(_))
    }
}

/// Drawing state captured when a token is placed
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStyle {
    pub font: FontSpec,
    pub color: Color,
    pub scale_x: f32,
    pub scale_y: f32,
    pub align: HorizontalAlign,
    pub mirror: Mirror,
    pub draw_offset: (f32, f32),
    pub pixel_offset: (f32, f32),
    pub image: ImageStyle,
}

impl Default for TokenStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            color: Color::black(),
            scale_x: 1.0,
            scale_y: 1.0,
            align: HorizontalAlign::Left,
            mirror: Mirror::default(),
            draw_offset: (0.0, 0.0),
            pixel_offset: (0.0, 0.0),
            image: ImageStyle::default(),
        }
    }
}

/// A markup token with its layout results
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupToken {
    /// Position in the tokenizer output; close tags refer to it
    pub id: usize,
    pub markup: Markup,
    /// Line index assigned by layout
    pub line: usize,
    pub rect: Rect,
    /// Further rectangles for spans covering several lines
    pub extra_rects: Vec<Rect>,
    pub style: TokenStyle,
}

impl MarkupToken {
    pub fn new(id: usize, markup: Markup) -> Self {
        Self {
            id,
            markup,
            line: 0,
            rect: Rect::default(),
            extra_rects: Vec::new(),
            style: TokenStyle::default(),
        }
    }

    /// All rectangles covered by this token
    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        std::iter::once(&self.rect).chain(self.extra_rects.iter())
    }
}
