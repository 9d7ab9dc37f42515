//! Per-render memo of translated element strings

use crate::translator::ElementString;
use std::collections::HashMap;

/// Translated strings keyed by element name and deck index
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    entries: HashMap<(String, usize), ElementString>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, element: &str, deck_index: usize) -> Option<&ElementString> {
        self.entries.get(&(element.to_string(), deck_index))
    }

    pub fn insert(&mut self, element: &str, deck_index: usize, value: ElementString) {
        self.entries.insert((element.to_string(), deck_index), value);
    }

    /// Forget every card's entry for one element
    pub fn remove_element(&mut self, element: &str) {
        self.entries.retain(|(name, _), _| name != element);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
