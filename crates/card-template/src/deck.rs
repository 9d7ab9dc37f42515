//! Deck model: a layout plus the rows that become cards

use crate::cache::TranslationCache;
use crate::data::{ColumnIndex, DataRow, Defines};
use crate::schema::{Element, Layout};
use crate::translator::{CardInfo, TranslationContext};
use crate::{Result, TemplateError};
use card_markup::FormattedTextData;
use card_text::parse_integer;
use std::collections::HashMap;

/// Column holding the number of copies of a row
const COUNT_COLUMN: &str = "count";

/// One card of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    /// Row the card comes from
    pub row: usize,
    /// 0-based copy number within the row
    pub copy: usize,
}

#[derive(Debug, Clone)]
pub struct Deck {
    pub layout: Layout,
    pub columns: ColumnIndex,
    pub rows: Vec<DataRow>,
    pub project_defines: Defines,
    slots: Vec<CardSlot>,
}

impl Deck {
    /// Build a deck, expanding each row by its `count` column
    ///
    /// A missing or empty count means one copy; a count of zero or less
    /// skips the row.
    pub fn new<S: AsRef<str>>(
        layout: Layout,
        header: &[S],
        rows: Vec<DataRow>,
        project_defines: Defines,
    ) -> Self {
        let columns = ColumnIndex::from_header(header);
        let count_at = columns.lookup(COUNT_COLUMN);

        let mut slots = Vec::new();
        for (row_index, row) in rows.iter().enumerate() {
            let copies = match count_at.and_then(|i| row.get(i)).map(str::trim) {
                None | Some("") => 1,
                Some(value) => match parse_integer(value) {
                    Ok(n) => n.max(0) as usize,
                    Err(_) => {
                        log::warn!(
                            "{}:{}: count {value:?} is not a number, using 1",
                            row.source,
                            row.line
                        );
                        1
                    }
                },
            };
            slots.extend((0..copies).map(|copy| CardSlot {
                row: row_index,
                copy,
            }));
        }
        log::debug!(
            "deck for layout {}: {} rows, {} cards",
            layout.name,
            rows.len(),
            slots.len()
        );

        Self {
            layout,
            columns,
            rows,
            project_defines,
            slots,
        }
    }

    pub fn card_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Result<CardSlot> {
        self.slots
            .get(index)
            .copied()
            .ok_or(TemplateError::CardOutOfRange {
                index,
                count: self.slots.len(),
            })
    }

    pub fn card_info(&self, index: usize, exporting: bool, export_format: &str) -> Result<CardInfo> {
        let slot = self.slot(index)?;
        Ok(CardInfo {
            deck_index: index,
            copy_index: slot.copy,
            card_count: self.card_count(),
            exporting,
            export_format: export_format.to_string(),
        })
    }

    /// Translation context for one element of one card
    pub fn context<'a>(&'a self, card: CardInfo, element: &'a Element) -> Result<TranslationContext<'a>> {
        let slot = self.slot(card.deck_index)?;
        Ok(TranslationContext {
            card,
            row: &self.rows[slot.row],
            columns: &self.columns,
            element,
            layout: &self.layout,
            project_defines: &self.project_defines,
        })
    }
}

/// Translation and layout caches for one render pass
#[derive(Debug, Clone, Default)]
pub struct DeckCache {
    pub translations: TranslationCache,
    /// Laid-out text keyed by element name and deck index
    pub markup: HashMap<(String, usize), FormattedTextData>,
}

impl DeckCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.translations.clear();
        self.markup.clear();
    }

    /// Drop everything cached for one element, e.g. after it was edited
    pub fn invalidate_element(&mut self, element: &str) {
        self.translations.remove_element(element);
        self.markup.retain(|(name, _), _| name != element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::ElementString;

    fn rows() -> Vec<DataRow> {
        vec![
            DataRow::new(["Goblin", "2"], "cards.csv", 2),
            DataRow::new(["Orc", "0"], "cards.csv", 3),
            DataRow::new(["Elf", ""], "cards.csv", 4),
            DataRow::new(["Troll", "many"], "cards.csv", 5),
            DataRow::new(["Imp", "-3"], "cards.csv", 6),
        ]
    }

    #[test]
    fn test_rows_expand_by_count() {
        let deck = Deck::new(
            Layout::new("creature", 180.0, 252.0),
            &["name", "Count"],
            rows(),
            Defines::new(),
        );

        assert_eq!(deck.card_count(), 4);
        assert_eq!(deck.slot(0).unwrap(), CardSlot { row: 0, copy: 0 });
        assert_eq!(deck.slot(1).unwrap(), CardSlot { row: 0, copy: 1 });
        assert_eq!(deck.slot(2).unwrap(), CardSlot { row: 2, copy: 0 });
        assert_eq!(deck.slot(3).unwrap(), CardSlot { row: 3, copy: 0 });
        assert!(matches!(
            deck.slot(4),
            Err(TemplateError::CardOutOfRange { index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_missing_count_column_means_one_each() {
        let deck = Deck::new(
            Layout::new("creature", 180.0, 252.0),
            &["name", "cost"],
            rows(),
            Defines::new(),
        );
        assert_eq!(deck.card_count(), 5);
    }

    #[test]
    fn test_card_info_and_context() {
        let mut layout = Layout::new("creature", 180.0, 252.0);
        layout.add_element(Element::text("title", "@[name]"));
        let deck = Deck::new(layout, &["name", "count"], rows(), Defines::new());

        let card = deck.card_info(1, true, "pdf").unwrap();
        assert_eq!(card.copy_index, 1);
        assert_eq!(card.card_count, 4);
        assert_eq!(card.export_format, "pdf");

        let element = &deck.layout.elements[0];
        let ctx = deck.context(card, element).unwrap();
        assert_eq!(ctx.column("name"), Some("Goblin"));
        assert_eq!(ctx.card_variable("cardindex").as_deref(), Some("2"));
    }

    #[test]
    fn test_deck_cache_invalidation() {
        let mut cache = DeckCache::new();
        cache.translations.insert("title", 0, ElementString::new("a"));
        cache.translations.insert("rules", 0, ElementString::new("b"));
        cache.invalidate_element("title");
        assert!(cache.translations.get("title", 0).is_none());
        assert!(cache.translations.get("rules", 0).is_some());
        cache.reset();
        assert!(cache.translations.is_empty());
        assert!(cache.markup.is_empty());
    }
}
