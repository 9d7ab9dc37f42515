//! Reference rows, column names and defines

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of imported card data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub values: Vec<String>,
    /// Name of the source the row came from
    pub source: String,
    /// Line number within the source
    pub line: usize,
}

impl DataRow {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>, source: &str, line: usize) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            source: source.to_string(),
            line,
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

/// Lower-cased column name to cell offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    columns: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Build from a header row; the first of duplicate names wins
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let mut columns = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            columns
                .entry(name.as_ref().trim().to_lowercase())
                .or_insert(i);
        }
        Self { columns }
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.columns.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Named template values, keyed case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Defines {
    values: BTreeMap<String, String>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.trim().to_lowercase(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Add every entry of `other`, replacing existing keys
    pub fn merge(&mut self, other: &Defines) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Defines {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut defines = Defines::new();
        for (key, value) in map {
            defines.insert(&key, &value);
        }
        defines
    }
}

impl From<Defines> for BTreeMap<String, String> {
    fn from(defines: Defines) -> Self {
        defines.values
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Defines {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut defines = Defines::new();
        for (key, value) in iter {
            defines.insert(key.as_ref(), value.as_ref());
        }
        defines
    }
}
