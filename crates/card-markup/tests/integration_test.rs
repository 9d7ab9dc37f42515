//! End-to-end formatted text: markup in, draw calls out

use card_markup::{
    render, FormattedTextData, LayoutEnv, LayoutOptions, Markup, RenderOptions, TextFrame,
};
use card_surface::{
    Color, DrawCommand, ElementFrame, FixedMetrics, FontBook, FontSpec, HorizontalAlign,
    PdfSurface, RecordingSurface, Surface, VerticalAlign,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn images() -> HashMap<String, (u32, u32)> {
    HashMap::from([
        ("mana.png".to_string(), (24, 24)),
        ("frame.png".to_string(), (100, 50)),
    ])
}

fn frame(width: f32, height: f32) -> TextFrame {
    TextFrame {
        font: FontSpec::new("Arial", 10.0),
        ..TextFrame::new(width, height)
    }
}

#[test]
fn test_rules_text_with_inline_icons() {
    let images = images();
    let metrics = FixedMetrics::default();
    let env = LayoutEnv::new(&metrics, &images);
    let source = "<img=mana.png;50>: Draw a card.<br><i>Flavor</i>";
    let data = FormattedTextData::from_markup(source, &frame(200.0, 60.0), env);

    assert_eq!(data.line_count, 2);
    let mut surface = RecordingSurface::new();
    let outcome = render(&data, &mut surface, RenderOptions::default()).unwrap();
    assert!(!outcome.truncated);

    let image = surface.images()[0];
    assert_eq!(image.path, "mana.png");
    assert_eq!((image.rect.width, image.rect.height), (12.0, 12.0));
    assert_eq!(surface.texts(), vec![": Draw a card.", "Flavor"]);

    let flavor = surface
        .commands
        .iter()
        .find_map(|c| match c {
            DrawCommand::Text(t) if t.text == "Flavor" => Some(t.clone()),
            _ => None,
        })
        .unwrap();
    assert!(flavor.font.italic);
    assert_eq!(flavor.rect.y, 12.0);
}

#[test]
fn test_centered_bottom_aligned_block() {
    let images = images();
    let metrics = FixedMetrics::default();
    let env = LayoutEnv::new(&metrics, &images);
    let frame = TextFrame {
        align: HorizontalAlign::Center,
        vertical_align: VerticalAlign::Bottom,
        ..frame(100.0, 50.0)
    };
    let data = FormattedTextData::from_markup("ab<br>abcd", &frame, env);
    let rects: Vec<(f32, f32)> = data
        .tokens
        .iter()
        .map(|t| (t.rect.x, t.rect.y))
        .collect();
    assert_eq!(rects, vec![(45.0, 26.0), (40.0, 38.0)]);
}

#[test]
fn test_overflow_is_reported_and_cut() {
    let images = images();
    let metrics = FixedMetrics::default();
    let env = LayoutEnv::new(&metrics, &images);
    let data = FormattedTextData::from_markup("aa bb cc dd ee", &frame(25.0, 30.0), env);
    assert!(data.overflows());

    let mut surface = RecordingSurface::new();
    let outcome = render(&data, &mut surface, RenderOptions::default()).unwrap();
    assert!(outcome.truncated);
    assert_eq!(surface.texts(), vec!["aa bb", "cc dd"]);
}

#[test]
fn test_unmerged_layout_keeps_every_word() {
    let images = images();
    let metrics = FixedMetrics::default();
    let env = LayoutEnv::new(&metrics, &images);
    let options = LayoutOptions { merge_runs: false };
    let data = FormattedTextData::from_markup_with("a b c", &frame(100.0, 20.0), env, options);
    let words = data
        .tokens
        .iter()
        .filter(|t| matches!(t.markup, Markup::Text(_)))
        .count();
    assert_eq!(words, 3);
}

#[test]
fn test_cached_layout_validity() {
    let images = images();
    let metrics = FixedMetrics::default();
    let env = LayoutEnv::new(&metrics, &images);
    let f = frame(100.0, 20.0);
    let data = FormattedTextData::from_markup("x", &f, env);
    assert!(data.is_valid_for("x", &f));
    assert!(!data.is_valid_for("y", &f));
    assert!(!data.is_valid_for("x", &frame(90.0, 20.0)));
}

#[test]
fn test_colored_text_into_pdf() {
    let images = images();
    let fonts = FontBook::new();
    let env = LayoutEnv::new(&fonts, &images);
    let data = FormattedTextData::from_markup(
        "<fc=#336699>Goblin</fc> <bgc=white;1>Raider</bgc>",
        &frame(120.0, 30.0),
        env,
    );
    assert_eq!(data.tokens[0].style.color, Color::rgb(0x33, 0x66, 0x99));

    let mut pdf = PdfSurface::new(&fonts, &images);
    pdf.begin_card(63.0, 88.0).unwrap();
    pdf.begin_element(&ElementFrame {
        x: 4.0,
        y: 50.0,
        width: 120.0,
        height: 30.0,
        rotation: 0.0,
        opacity: 1.0,
    })
    .unwrap();
    render(&data, &mut pdf, RenderOptions::default()).unwrap();
    pdf.end_element().unwrap();
    pdf.end_card().unwrap();

    let bytes = pdf.to_bytes().unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
