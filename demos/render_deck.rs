//! Render a small deck to PDF
//!
//! Run with `RUST_LOG=debug cargo run -p card-template --example render_deck`

use anyhow::Result;
use card_surface::{FontBook, ImageStore, PdfSurface};
use card_template::{load_font_book, parse_layout, DataRow, Deck, DeckRenderer, Defines};
use std::path::Path;

const LAYOUT: &str = r##"{
    "name": "spell",
    "width": 180,
    "height": 252,
    "defines": {
        "cost": "#(switch;@[color];red;R;green;G;#default;C)#",
        "dmg": "Deal {1} damage to {2}."
    },
    "elements": [
        {
            "name": "title",
            "type": "text",
            "variable": "@[name] (@[cost])",
            "x": 12, "y": 12, "width": 156, "height": 20,
            "font": "Helvetica;12;1;0;0;0"
        },
        {
            "name": "rules",
            "type": "formattedText",
            "variable": "<bgc=#eeeeee;2>@[dmg,@[amount],any target]</bgc><br><i>![deckindex] of ![cardcount]</i>",
            "x": 12, "y": 140, "width": 156, "height": 80,
            "font": "Helvetica;10;0;0;0;0",
            "horizontalAlign": "center"
        },
        {
            "name": "number",
            "type": "text",
            "variable": "#padl;3;0;![deckindex]#",
            "x": 150, "y": 232, "width": 20, "height": 12,
            "font": "Helvetica;7;0;0;0;0"
        }
    ]
}"##;

fn main() -> Result<()> {
    env_logger::init();

    let layout = parse_layout(LAYOUT)?;
    let fonts: FontBook = load_font_book(&layout.fonts, Path::new("."))?;
    let rows = vec![
        DataRow::new(["Shock", "red", "2", "1"], "demo", 1),
        DataRow::new(["Lava Axe", "red", "5", "2"], "demo", 2),
        DataRow::new(["Giant Growth", "green", "3", "1"], "demo", 3),
    ];
    let deck = Deck::new(layout, &["name", "color", "amount", "count"], rows, Defines::new());

    let images = ImageStore::new(".");
    let mut renderer = DeckRenderer::new(&deck, &fonts, &images);
    let mut pdf = PdfSurface::new(&fonts, &images);

    let summary = renderer.export(&mut pdf, "pdf", |progress| {
        log::info!("rendering card {} of {}", progress.current + 1, progress.total);
        true
    })?;
    for issue in renderer.take_issues() {
        log::warn!("{}: {}", issue.element, issue.message);
    }

    let out = std::env::temp_dir().join("deck.pdf");
    pdf.save(&out)?;
    println!("{} cards written to {}", summary.rendered, out.display());
    Ok(())
}
