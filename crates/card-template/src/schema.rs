//! Layout JSON schema types

use crate::data::Defines;
use card_surface::{HorizontalAlign, VerticalAlign};
use serde::{Deserialize, Serialize};

/// A card layout: card size, elements and layout-scoped defines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,

    /// Layout this one was derived from
    #[serde(default)]
    pub parent: Option<String>,

    /// Top of the derivation chain
    #[serde(default)]
    pub root: Option<String>,

    /// Card width in points
    pub width: f32,

    /// Card height in points
    pub height: f32,

    #[serde(default)]
    pub elements: Vec<Element>,

    #[serde(default)]
    pub defines: Defines,

    /// Font families available to elements
    #[serde(default)]
    pub fonts: Vec<FontDef>,
}

impl Layout {
    pub fn new(name: &str, width: f32, height: f32) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            root: None,
            width,
            height,
            elements: Vec::new(),
            defines: Defines::new(),
            fonts: Vec::new(),
        }
    }

    /// Append an element
    pub fn add_element(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Name of the root layout; a layout without one is its own root
    pub fn root_name(&self) -> &str {
        self.root.as_deref().unwrap_or(&self.name)
    }
}

/// Font family definition with per-variant TTF paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDef {
    /// Family name referenced by element fonts
    pub id: String,

    #[serde(default)]
    pub regular: Option<String>,

    #[serde(default)]
    pub bold: Option<String>,

    #[serde(default)]
    pub italic: Option<String>,

    #[serde(rename = "boldItalic")]
    #[serde(default)]
    pub bold_italic: Option<String>,
}

/// Element kinds; only text kinds are translated and laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Text,
    FormattedText,
    Graphic,
    Shape,
}

impl ElementType {
    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Text | ElementType::FormattedText)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::FormattedText => "formattedText",
            ElementType::Graphic => "graphic",
            ElementType::Shape => "shape",
        }
    }
}

/// One placeable field on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: String,

    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Raw template text
    #[serde(default)]
    pub variable: String,

    #[serde(default)]
    pub x: i32,

    #[serde(default)]
    pub y: i32,

    #[serde(default)]
    pub width: i32,

    #[serde(default)]
    pub height: i32,

    /// Degrees, clockwise
    #[serde(default)]
    pub rotation: f32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// `family;size;bold;underline;italic;strikeout`
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub outline_thickness: i32,

    #[serde(default = "default_color")]
    pub outline_color: String,

    #[serde(default)]
    pub horizontal_align: HorizontalAlign,

    #[serde(default)]
    pub vertical_align: VerticalAlign,

    /// Fixed line advance; `0` sizes lines from their content
    #[serde(default)]
    pub line_height: i32,

    #[serde(default)]
    pub word_space: i32,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

fn default_font() -> String {
    "Arial;12;0;0;0;0".to_string()
}

fn default_color() -> String {
    "#000000".to_string()
}

impl Element {
    pub fn new(name: &str, element_type: ElementType, variable: &str) -> Self {
        Self {
            name: name.to_string(),
            element_type,
            variable: variable.to_string(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            rotation: 0.0,
            enabled: true,
            opacity: 1.0,
            font: default_font(),
            color: default_color(),
            outline_thickness: 0,
            outline_color: default_color(),
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 0,
            word_space: 0,
        }
    }

    /// Plain text element
    pub fn text(name: &str, variable: &str) -> Self {
        Self::new(name, ElementType::Text, variable)
    }

    /// Formatted-text element
    pub fn formatted(name: &str, variable: &str) -> Self {
        Self::new(name, ElementType::FormattedText, variable)
    }

    /// Set position and size
    pub fn at(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_font(mut self, font: &str) -> Self {
        self.font = font.to_string();
        self
    }
}
