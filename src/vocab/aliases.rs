//! Vocabulary identifier → output variable code table.

use serde::Serialize;
use std::collections::HashMap;

/// An output variable produced from a vocabulary variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub code: String,
    /// Overrides the vocabulary's own label when set
    pub label: Option<String>,
}

impl Alias {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: None,
        }
    }

    pub fn labelled(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: Some(label.into()),
        }
    }
}

/// Static lookup from vocabulary variable identifier to its output aliases.
///
/// Most identifiers map to one alias. Some back several output variables
/// (fan-out); every alias then receives the same expanded values.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    table: HashMap<String, Vec<Alias>>,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(identifier, [(code, label override)])` rows.
    ///
    /// Rows with no aliases are dropped so that every stored entry is
    /// non-empty. A repeated identifier replaces the earlier row.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [(&'a str, Option<&'a str>)])>,
    {
        rows.into_iter()
            .fold(Self::new(), |resolver, (id, aliases)| {
                resolver.with_aliases(
                    id,
                    aliases.iter().map(|(code, label)| Alias {
                        code: (*code).to_string(),
                        label: label.map(str::to_string),
                    }),
                )
            })
    }

    /// One-to-one mapping with the vocabulary's own label.
    pub fn with(self, id: impl Into<String>, code: impl Into<String>) -> Self {
        self.with_aliases(id, [Alias::new(code)])
    }

    pub fn with_aliases<I>(mut self, id: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = Alias>,
    {
        let aliases: Vec<Alias> = aliases.into_iter().collect();
        if !aliases.is_empty() {
            self.table.insert(id.into(), aliases);
        }
        self
    }

    /// Aliases for `variable_id`, or `None` when the identifier is unmapped.
    pub fn resolve(&self, variable_id: &str) -> Option<&[Alias]> {
        self.table.get(variable_id).map(Vec::as_slice)
    }

    pub fn contains(&self, variable_id: &str) -> bool {
        self.table.contains_key(variable_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
