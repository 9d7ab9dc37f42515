use crate::data::{ColumnIndex, DataRow, Defines};
use crate::schema::{Element, Layout};

/// Position of the card being translated
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardInfo {
    /// 0-based position in the deck
    pub deck_index: usize,
    /// 0-based copy number within the card's row
    pub copy_index: usize,
    pub card_count: usize,
    pub exporting: bool,
    pub export_format: String,
}

/// Everything one resolve call reads from
#[derive(Debug, Clone)]
pub struct TranslationContext<'a> {
    pub card: CardInfo,
    pub row: &'a DataRow,
    pub columns: &'a ColumnIndex,
    pub element: &'a Element,
    pub layout: &'a Layout,
    pub project_defines: &'a Defines,
}

impl<'a> TranslationContext<'a> {
    /// Layout defines shadow project defines
    pub fn define(&self, key: &str) -> Option<&'a str> {
        self.layout
            .defines
            .get(key)
            .or_else(|| self.project_defines.get(key))
    }

    pub fn column(&self, name: &str) -> Option<&'a str> {
        self.columns.lookup(name).and_then(|i| self.row.get(i))
    }

    /// Value of a `![name]` card variable
    pub fn card_variable(&self, name: &str) -> Option<String> {
        let value = match name.trim().to_lowercase().as_str() {
            "cardindex" => (self.card.copy_index + 1).to_string(),
            "deckindex" => (self.card.deck_index + 1).to_string(),
            "cardcount" => self.card.card_count.to_string(),
            "elementname" => self.element.name.clone(),
            "refname" => self.row.source.clone(),
            "refline" => self.row.line.to_string(),
            "layoutname" => self.layout.name.clone(),
            "parentlayout" => self.layout.parent.clone().unwrap_or_default(),
            "rootlayout" => self.layout.root_name().to_string(),
            "exporting" => self.card.exporting.to_string(),
            "exportformat" => self.card.export_format.clone(),
            _ => return None,
        };
        Some(value)
    }
}
