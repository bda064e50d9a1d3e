use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One row of the dictionary.
///
/// The three value fields are `None` for variables without enumerated
/// values. Serialized with the camelCase names clients consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub variable_code: String,
    pub variable_label: String,
    pub variable_definition: Option<String>,
    pub variable_value_code: Option<String>,
    pub variable_value_label: Option<String>,
    pub variable_value_definition: Option<String>,
}

impl DictionaryEntry {
    /// A variable row with no enumerated value
    pub fn valueless(
        code: impl Into<String>,
        label: impl Into<String>,
        definition: Option<String>,
    ) -> Self {
        Self {
            variable_code: code.into(),
            variable_label: label.into(),
            variable_definition: definition,
            variable_value_code: None,
            variable_value_label: None,
            variable_value_definition: None,
        }
    }

    /// Dictionary order: variable code, then value code with `None` first.
    pub fn sort_key_cmp(&self, other: &Self) -> Ordering {
        self.variable_code
            .cmp(&other.variable_code)
            .then_with(|| self.variable_value_code.cmp(&other.variable_value_code))
    }
}

/// Entries ordered by `(variableCode, variableValueCode)`.
///
/// Only constructed through [`Dictionary::from_unsorted`], so the order
/// always holds. Never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    /// Sort `entries` stably, so equal keys keep insertion order.
    pub fn from_unsorted(mut entries: Vec<DictionaryEntry>) -> Self {
        entries.sort_by(DictionaryEntry::sort_key_cmp);
        Self { entries }
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows for one output variable code
    pub fn variable<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a DictionaryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.variable_code == code)
    }

    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].sort_key_cmp(&pair[1]) != Ordering::Greater)
    }
}
