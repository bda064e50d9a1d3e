//! Compacted graph entities and the identifier index built over them.

use crate::error::DictionaryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// One node of the compacted vocabulary graph.
///
/// Literal fields hold `None` for both absent and empty values, so fallback
/// chains never have to special-case `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "member", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = non_empty(label.into());
        self
    }

    pub fn with_pref_label(mut self, pref_label: impl Into<String>) -> Self {
        self.pref_label = non_empty(pref_label.into());
        self
    }

    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = non_empty(notation.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = non_empty(definition.into());
        self
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    /// `label`, falling back to `prefLabel`
    pub fn display_label(&self) -> Option<&str> {
        self.label.as_deref().or(self.pref_label.as_deref())
    }

    /// Fill fields this entity lacks from a later occurrence of the same node.
    fn absorb(&mut self, other: Entity) {
        fill(&mut self.label, other.label);
        fill(&mut self.pref_label, other.pref_label);
        fill(&mut self.notation, other.notation);
        fill(&mut self.definition, other.definition);
        fill(&mut self.description, other.description);
        self.members.extend(other.members);
    }
}

fn fill(slot: &mut Option<String>, candidate: Option<String>) {
    if slot.is_none() {
        *slot = candidate;
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Entities of one fetched graph keyed by `@id`.
///
/// Cycles between members are allowed; nothing here walks the graph.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    entities: HashMap<String, Entity>,
}

impl GraphIndex {
    /// Index a set of entities. Repeated identifiers are merged into one
    /// entity, first occurrence winning for every literal field.
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut index: HashMap<String, Entity> = HashMap::new();
        for entity in entities {
            match index.entry(entity.id.clone()) {
                Entry::Occupied(mut existing) => existing.get_mut().absorb(entity),
                Entry::Vacant(slot) => {
                    slot.insert(entity);
                }
            }
        }
        Self { entities: index }
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an identifier that must exist; absence aborts the rebuild.
    pub fn resolve(&self, id: &str) -> Result<&Entity, DictionaryError> {
        self.get(id)
            .ok_or_else(|| DictionaryError::entity_not_found(id))
    }

    /// Look up the categorical-variable container.
    pub fn resolve_container(&self, id: &str) -> Result<&Entity, DictionaryError> {
        self.get(id)
            .ok_or_else(|| DictionaryError::container_not_found(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Entity> for GraphIndex {
    fn from_iter<T: IntoIterator<Item = Entity>>(iter: T) -> Self {
        Self::from_entities(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn resolves_by_identifier() {
        let index = GraphIndex::from_entities([
            Entity::new("a").with_label("A"),
            Entity::new("b").with_label("B"),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("b").unwrap().label.as_deref(), Some("B"));
    }

    #[test]
    fn missing_entity_and_missing_container_are_distinct() {
        let index = GraphIndex::default();
        assert_matches!(
            index.resolve("x"),
            Err(DictionaryError::EntityNotFound { id }) if id == "x"
        );
        assert_matches!(
            index.resolve_container("c"),
            Err(DictionaryError::ContainerNotFound { id }) if id == "c"
        );
    }

    #[test]
    fn repeated_nodes_are_merged() {
        let index = GraphIndex::from_entities([
            Entity::new("v").with_label("first").with_members(["m1"]),
            Entity::new("v")
                .with_label("second")
                .with_definition("def")
                .with_members(["m2"]),
        ]);
        let merged = index.resolve("v").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(merged.label.as_deref(), Some("first"));
        assert_eq!(merged.definition.as_deref(), Some("def"));
        assert_eq!(merged.members, vec!["m1", "m2"]);
    }

    #[test]
    fn cyclic_membership_is_indexed() {
        let index = GraphIndex::from_entities([
            Entity::new("a").with_members(["b"]),
            Entity::new("b").with_members(["a"]),
        ]);
        assert_eq!(index.resolve("a").unwrap().members, vec!["b"]);
        assert_eq!(index.resolve("b").unwrap().members, vec!["a"]);
    }

    #[test]
    fn display_label_prefers_label() {
        let both = Entity::new("x").with_label("L").with_pref_label("P");
        let pref_only = Entity::new("y").with_pref_label("P");
        let empty = Entity::new("z").with_label("");
        assert_eq!(both.display_label(), Some("L"));
        assert_eq!(pref_only.display_label(), Some("P"));
        assert_eq!(empty.display_label(), None);
    }
}
