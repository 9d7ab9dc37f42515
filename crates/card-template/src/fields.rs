//! Element field table for `&[field]` reads and `$[field:value]` overrides

use crate::schema::Element;
use crate::translator::ElementString;
use card_surface::{HorizontalAlign, VerticalAlign};
use card_text::{parse_decimal, parse_integer};

/// Fields that templates may neither read nor override
pub const DISALLOWED_FIELDS: &[&str] = &["name", "type", "variable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

struct Field {
    name: &'static str,
    kind: FieldKind,
    get: fn(&Element) -> String,
    set: fn(&mut Element, &str) -> Option<()>,
}

fn int(value: &str) -> Option<i32> {
    parse_integer(value.trim())
        .ok()
        .and_then(|n| i32::try_from(n).ok())
}

fn float(value: &str) -> Option<f32> {
    parse_decimal(value.trim()).ok().map(|n| n as f32)
}

fn boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

static FIELDS: &[Field] = &[
    Field {
        name: "x",
        kind: FieldKind::Int,
        get: |e| e.x.to_string(),
        set: |e, v| {
            e.x = int(v)?;
            Some(())
        },
    },
    Field {
        name: "y",
        kind: FieldKind::Int,
        get: |e| e.y.to_string(),
        set: |e, v| {
            e.y = int(v)?;
            Some(())
        },
    },
    Field {
        name: "width",
        kind: FieldKind::Int,
        get: |e| e.width.to_string(),
        set: |e, v| {
            e.width = int(v)?;
            Some(())
        },
    },
    Field {
        name: "height",
        kind: FieldKind::Int,
        get: |e| e.height.to_string(),
        set: |e, v| {
            e.height = int(v)?;
            Some(())
        },
    },
    Field {
        name: "rotation",
        kind: FieldKind::Float,
        get: |e| e.rotation.to_string(),
        set: |e, v| {
            e.rotation = float(v)?;
            Some(())
        },
    },
    Field {
        name: "opacity",
        kind: FieldKind::Float,
        get: |e| e.opacity.to_string(),
        set: |e, v| {
            e.opacity = float(v)?.clamp(0.0, 1.0);
            Some(())
        },
    },
    Field {
        name: "enabled",
        kind: FieldKind::Bool,
        get: |e| e.enabled.to_string(),
        set: |e, v| {
            e.enabled = boolean(v)?;
            Some(())
        },
    },
    Field {
        name: "font",
        kind: FieldKind::Str,
        get: |e| e.font.clone(),
        set: |e, v| {
            e.font = v.to_string();
            Some(())
        },
    },
    Field {
        name: "color",
        kind: FieldKind::Str,
        get: |e| e.color.clone(),
        set: |e, v| {
            e.color = v.to_string();
            Some(())
        },
    },
    Field {
        name: "outlinethickness",
        kind: FieldKind::Int,
        get: |e| e.outline_thickness.to_string(),
        set: |e, v| {
            e.outline_thickness = int(v)?;
            Some(())
        },
    },
    Field {
        name: "outlinecolor",
        kind: FieldKind::Str,
        get: |e| e.outline_color.clone(),
        set: |e, v| {
            e.outline_color = v.to_string();
            Some(())
        },
    },
    Field {
        name: "horizontalalign",
        kind: FieldKind::Str,
        get: |e| e.horizontal_align.as_str().to_string(),
        set: |e, v| {
            e.horizontal_align = v.parse::<HorizontalAlign>().ok()?;
            Some(())
        },
    },
    Field {
        name: "verticalalign",
        kind: FieldKind::Str,
        get: |e| e.vertical_align.as_str().to_string(),
        set: |e, v| {
            e.vertical_align = v.parse::<VerticalAlign>().ok()?;
            Some(())
        },
    },
    Field {
        name: "lineheight",
        kind: FieldKind::Int,
        get: |e| e.line_height.to_string(),
        set: |e, v| {
            e.line_height = int(v)?;
            Some(())
        },
    },
    Field {
        name: "wordspace",
        kind: FieldKind::Int,
        get: |e| e.word_space.to_string(),
        set: |e, v| {
            e.word_space = int(v)?;
            Some(())
        },
    },
];

fn lookup(name: &str) -> Option<&'static Field> {
    let name = name.trim().to_lowercase();
    if is_disallowed(&name) {
        return None;
    }
    FIELDS.iter().find(|f| f.name == name)
}

pub fn is_disallowed(name: &str) -> bool {
    DISALLOWED_FIELDS.contains(&name.trim().to_lowercase().as_str())
}

/// Kind of an overridable field, `None` for unknown or disallowed names
pub fn field_kind(name: &str) -> Option<FieldKind> {
    lookup(name).map(|f| f.kind)
}

/// Read a field as text
pub fn read_field(element: &Element, name: &str) -> Option<String> {
    lookup(name).map(|f| (f.get)(element))
}

/// Write a field from text; false when unknown, disallowed or unparsable
pub fn write_field(element: &mut Element, name: &str, value: &str) -> bool {
    match lookup(name) {
        Some(field) => (field.set)(element, value).is_some(),
        None => false,
    }
}

impl Element {
    /// Copy of the element with every staged override applied
    pub fn with_overrides(&self, resolved: &ElementString) -> Element {
        let mut element = self.clone();
        for (name, value) in &resolved.overrides {
            if !write_field(&mut element, name, value) {
                log::warn!(
                    "{}: cannot apply override {name}={value:?}",
                    self.name
                );
            }
        }
        element
    }
}
