//! Deck rendering: translate, lay out and draw every text element

use crate::deck::{Deck, DeckCache};
use crate::schema::{Element, ElementType};
use crate::translator::{ElementString, Issue, MacroTranslator, Translator};
use crate::Result;
use card_markup::{render, FormattedTextData, LayoutEnv, RenderOptions, TextFrame};
use card_surface::{
    Color, ElementFrame, FontSpec, ImageSource, Outline, Surface, TextMeasurer,
};
use std::collections::hash_map::Entry;

/// What happened to one card's elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardReport {
    /// Elements drawn
    pub drawn: usize,
    /// Elements left out by `#nodraw` or an `enabled` override
    pub skipped: Vec<String>,
    /// Elements whose text did not fit
    pub truncated: Vec<String>,
}

/// Passed to the export progress callback before each card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    /// 0-based index of the card about to be rendered
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub rendered: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Renders the cards of a [`Deck`] onto a [`Surface`]
pub struct DeckRenderer<'a> {
    deck: &'a Deck,
    measurer: &'a dyn TextMeasurer,
    images: &'a dyn ImageSource,
    translator: Box<dyn Translator + 'a>,
    cache: DeckCache,
    debug: bool,
    /// Export format while an export is running
    exporting: Option<String>,
}

impl<'a> DeckRenderer<'a> {
    pub fn new(deck: &'a Deck, measurer: &'a dyn TextMeasurer, images: &'a dyn ImageSource) -> Self {
        Self {
            deck,
            measurer,
            images,
            translator: Box::new(MacroTranslator::new()),
            cache: DeckCache::new(),
            debug: false,
            exporting: None,
        }
    }

    /// Use a different translation backend
    pub fn with_translator(mut self, translator: Box<dyn Translator + 'a>) -> Self {
        self.translator = translator;
        self
    }

    /// Outline every token rectangle
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn cache(&self) -> &DeckCache {
        &self.cache
    }

    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    /// Drain translation issues recorded so far
    pub fn take_issues(&mut self) -> Vec<Issue> {
        self.translator.take_issues()
    }

    fn env(&self) -> LayoutEnv<'a> {
        LayoutEnv::new(self.measurer, self.images)
    }

    /// Translated text of one element for one card, cached per render pass
    pub fn translate(&mut self, index: usize, element: &Element) -> Result<ElementString> {
        if let Some(cached) = self.cache.translations.get(&element.name, index) {
            return Ok(cached.clone());
        }

        let (exporting, format) = match &self.exporting {
            Some(format) => (true, format.as_str()),
            None => (false, ""),
        };
        let card = self.deck.card_info(index, exporting, format)?;
        let ctx = self.deck.context(card, element)?;
        let resolved = self.translator.resolve(&element.variable, &ctx);
        self.cache
            .translations
            .insert(&element.name, index, resolved.clone());
        Ok(resolved)
    }

    /// Render one card as a complete page of `surface`
    pub fn render_card(&mut self, index: usize, surface: &mut dyn Surface) -> Result<CardReport> {
        let deck = self.deck;
        deck.slot(index)?;
        surface.begin_card(deck.layout.width, deck.layout.height)?;

        let mut report = CardReport::default();
        for element in &deck.layout.elements {
            if !element.enabled {
                continue;
            }
            if !element.element_type.is_text() {
                log::debug!(
                    "{}: {} elements are not drawn",
                    element.name,
                    element.element_type.as_str()
                );
                continue;
            }

            let resolved = self.translate(index, element)?;
            if !resolved.draw {
                report.skipped.push(element.name.clone());
                continue;
            }
            let element = element.with_overrides(&resolved);
            if !element.enabled {
                report.skipped.push(element.name.clone());
                continue;
            }

            let truncated = self.draw_element(index, &element, &resolved.text, surface)?;
            if truncated {
                report.truncated.push(element.name.clone());
            }
            report.drawn += 1;
        }

        surface.end_card()?;
        Ok(report)
    }

    fn draw_element(
        &mut self,
        index: usize,
        element: &Element,
        text: &str,
        surface: &mut dyn Surface,
    ) -> Result<bool> {
        let frame = text_frame(element);
        let env = self.env();
        let build = || match element.element_type {
            ElementType::FormattedText => FormattedTextData::from_markup(text, &frame, env),
            _ => FormattedTextData::from_plain(text, &frame, env),
        };

        let data = match self.cache.markup.entry((element.name.clone(), index)) {
            Entry::Occupied(entry) if entry.get().is_valid_for(text, &frame) => entry.into_mut(),
            Entry::Occupied(mut entry) => {
                entry.insert(build());
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(build()),
        };

        surface.begin_element(&ElementFrame {
            x: element.x as f32,
            y: element.y as f32,
            width: element.width as f32,
            height: element.height as f32,
            rotation: element.rotation,
            opacity: element.opacity,
        })?;
        let outcome = render(data, surface, RenderOptions { debug: self.debug })?;
        surface.end_element()?;
        Ok(outcome.truncated)
    }

    /// Render every card, asking `progress` before each one whether to go on
    ///
    /// Caches are cleared before and after the export, cancelled or not.
    /// Strings resolved here saw `![exporting]` and `![exportformat]` set, so
    /// they do not hold for interactive renders afterwards.
    pub fn export<F>(
        &mut self,
        surface: &mut dyn Surface,
        export_format: &str,
        mut progress: F,
    ) -> Result<ExportSummary>
    where
        F: FnMut(ExportProgress) -> bool,
    {
        self.cache.reset();
        self.exporting = Some(export_format.to_string());

        let total = self.deck.card_count();
        let mut summary = ExportSummary {
            rendered: 0,
            total,
            cancelled: false,
        };
        let mut outcome = Ok(());
        for current in 0..total {
            if !progress(ExportProgress { current, total }) {
                log::info!("export cancelled after {current} of {total} cards");
                summary.cancelled = true;
                break;
            }
            if let Err(e) = self.render_card(current, surface) {
                outcome = Err(e);
                break;
            }
            summary.rendered += 1;
        }

        self.exporting = None;
        self.cache.reset();
        outcome.map(|_| summary)
    }
}

/// Layout frame for an element, falling back to defaults for bad values
fn text_frame(element: &Element) -> TextFrame {
    let font = FontSpec::parse(&element.font).unwrap_or_else(|e| {
        log::warn!("{}: {e}, using default font", element.name);
        FontSpec::default()
    });
    let color = parse_color(&element.name, &element.color);
    let outline = (element.outline_thickness > 0).then(|| Outline {
        thickness: element.outline_thickness as f32,
        color: parse_color(&element.name, &element.outline_color),
    });

    TextFrame {
        width: element.width as f32,
        height: element.height as f32,
        font,
        color,
        align: element.horizontal_align,
        vertical_align: element.vertical_align,
        line_height: element.line_height as f32,
        word_space: element.word_space as f32,
        outline,
    }
}

fn parse_color(element: &str, value: &str) -> Color {
    Color::parse(value).unwrap_or_else(|e| {
        log::warn!("{element}: {e}, using black");
        Color::black()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataRow, Defines};
    use crate::schema::Layout;
    use card_surface::{DrawCommand, FixedMetrics, HorizontalAlign, RecordingSurface};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn deck() -> Deck {
        let mut layout = Layout::new("creature", 180.0, 252.0);
        layout
            .add_element(Element::text("title", "@[name]").at(10, 10, 160, 20))
            .add_element(Element::formatted("rules", "<b>@[rules]</b>").at(10, 100, 160, 80))
            .add_element(Element::text("flag", "#(if @[rare] == 1 then R else #nodraw)#").at(0, 0, 20, 20))
            .add_element(Element::new("art", ElementType::Graphic, "art.png"));
        let rows = vec![
            DataRow::new(["Goblin", "Haste", "0"], "cards.csv", 2),
            DataRow::new(["Dragon", "Flying", "1"], "cards.csv", 3),
        ];
        Deck::new(layout, &["name", "rules", "rare"], rows, Defines::new())
    }

    fn images() -> HashMap<String, (u32, u32)> {
        HashMap::new()
    }

    #[test]
    fn test_render_card_draws_text_elements() {
        let deck = deck();
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
        let mut surface = RecordingSurface::new();

        let report = renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(report.drawn, 2);
        assert_eq!(report.skipped, vec!["flag".to_string()]);
        assert_eq!(surface.texts(), vec!["Goblin", "Haste"]);

        let haste = surface
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text(t) if t.text == "Haste" => Some(t.clone()),
                _ => None,
            })
            .unwrap();
        assert!(haste.font.bold);

        surface.clear();
        let report = renderer.render_card(1, &mut surface).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(surface.texts(), vec!["Dragon", "Flying", "R"]);
    }

    #[test]
    fn test_element_frames_follow_overrides() {
        let mut layout = Layout::new("token", 100.0, 100.0);
        layout.add_element(Element::text("name", "Spirit$[x:40]$[rotation:90]").at(5, 5, 50, 20));
        let deck = Deck::new(layout, &["name"], vec![DataRow::new(["a"], "t", 1)], Defines::new());
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
        let mut surface = RecordingSurface::new();
        renderer.render_card(0, &mut surface).unwrap();

        let frame = surface
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::BeginElement(f) => Some(*f),
                _ => None,
            })
            .unwrap();
        assert_eq!(frame.x, 40.0);
        assert_eq!(frame.y, 5.0);
        assert_eq!(frame.rotation, 90.0);
    }

    #[test]
    fn test_disabled_by_override() {
        let mut layout = Layout::new("token", 100.0, 100.0);
        layout.add_element(Element::text("name", "x$[enabled:false]").at(0, 0, 50, 20));
        let deck = Deck::new(layout, &["name"], vec![DataRow::new(["a"], "t", 1)], Defines::new());
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
        let mut surface = RecordingSurface::new();
        let report = renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(report.skipped, vec!["name".to_string()]);
        assert!(surface.texts().is_empty());
    }

    #[test]
    fn test_translations_are_cached() {
        let deck = deck();
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
        let mut surface = RecordingSurface::new();

        renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(renderer.cache().translations.len(), 3);
        assert_eq!(renderer.cache().markup.len(), 2);
        renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(renderer.cache().translations.len(), 3);

        renderer.reset_cache();
        assert!(renderer.cache().translations.is_empty());
    }

    #[test]
    fn test_card_out_of_range() {
        let deck = deck();
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);
        let mut surface = RecordingSurface::new();
        assert!(renderer.render_card(9, &mut surface).is_err());
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn test_export_variables_and_cancel() {
        let mut layout = Layout::new("token", 100.0, 100.0);
        layout.add_element(Element::text("fmt", "![exportformat]/![deckindex]").at(0, 0, 80, 20));
        let rows = vec![
            DataRow::new(["a"], "t", 1),
            DataRow::new(["b"], "t", 2),
            DataRow::new(["c"], "t", 3),
        ];
        let deck = Deck::new(layout, &["name"], rows, Defines::new());
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);

        let mut surface = RecordingSurface::new();
        let summary = renderer.export(&mut surface, "png", |_| true).unwrap();
        assert_eq!(summary.rendered, 3);
        assert!(!summary.cancelled);
        assert_eq!(surface.texts(), vec!["png/1", "png/2", "png/3"]);
        assert!(renderer.cache().translations.is_empty());

        let mut surface = RecordingSurface::new();
        let summary = renderer
            .export(&mut surface, "pdf", |p| p.current < 2)
            .unwrap();
        assert_eq!(summary.rendered, 2);
        assert_eq!(summary.total, 3);
        assert!(summary.cancelled);
        assert_eq!(surface.card_count(), 2);

        let mut surface = RecordingSurface::new();
        renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(surface.texts(), vec!["/1"]);
    }

    #[test]
    fn test_cancelled_export_does_not_leak_export_strings() {
        let mut layout = Layout::new("token", 100.0, 100.0);
        layout.add_element(Element::text("mode", "![exporting]").at(0, 0, 80, 20));
        let rows = vec![DataRow::new(["a"], "t", 1), DataRow::new(["b"], "t", 2)];
        let deck = Deck::new(layout, &["name"], rows, Defines::new());
        let metrics = FixedMetrics::default();
        let images = images();
        let mut renderer = DeckRenderer::new(&deck, &metrics, &images);

        let mut surface = RecordingSurface::new();
        let summary = renderer
            .export(&mut surface, "pdf", |p| p.current < 1)
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(surface.texts(), vec!["true"]);
        assert!(renderer.cache().translations.is_empty());

        let mut surface = RecordingSurface::new();
        renderer.render_card(0, &mut surface).unwrap();
        assert_eq!(surface.texts(), vec!["false"]);
    }

    #[test]
    fn test_text_frame_from_element() {
        let mut element = Element::text("t", "").at(0, 0, 40, 30).with_font("Serif;9;1;0;0;0");
        element.horizontal_align = HorizontalAlign::Right;
        element.outline_thickness = 2;
        element.outline_color = "white".to_string();
        let frame = text_frame(&element);
        assert_eq!(frame.font.size, 9.0);
        assert!(frame.font.bold);
        assert_eq!(frame.align, HorizontalAlign::Right);
        assert_eq!(frame.outline.map(|o| o.color), Some(Color::white()));

        element.font = "garbage;-1".to_string();
        element.color = "nope".to_string();
        let frame = text_frame(&element);
        assert_eq!(frame.font, FontSpec::default());
        assert_eq!(frame.color, Color::black());
    }
}
