//! Minimal JSON-LD compaction for the controlled-vocabulary download.
//!
//! The vocabulary publisher does not serve a machine-readable context, so the
//! short field names are mapped to their IRIs by hand. Only what this
//! vocabulary needs is understood: node objects with `@id`, literal values
//! (plain or `@value`), and `member` references (plain or `@id`).

use crate::error::DictionaryError;
use crate::vocab::graph::{Entity, non_empty};
use serde_json::{Map, Value};
use tracing::warn;

pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const SKOS_NOTATION: &str = "http://www.w3.org/2004/02/skos/core#notation";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const SKOS_DEFINITION: &str = "http://www.w3.org/2004/02/skos/core#definition";
pub const SKOS_MEMBER: &str = "http://www.w3.org/2004/02/skos/core#member";

/// The entity fields a term can compact to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    PrefLabel,
    Notation,
    Label,
    Description,
    Definition,
    /// `@type: @id`; values are identifiers
    Member,
}

/// Mapping from short field name to vocabulary IRI
#[derive(Debug, Clone)]
pub struct CompactionContext {
    terms: Vec<(&'static str, &'static str, Field)>,
}

impl Default for CompactionContext {
    fn default() -> Self {
        Self {
            terms: vec![
                ("prefLabel", SKOS_PREF_LABEL, Field::PrefLabel),
                ("notation", SKOS_NOTATION, Field::Notation),
                ("label", RDFS_LABEL, Field::Label),
                ("description", DCTERMS_DESCRIPTION, Field::Description),
                ("definition", SKOS_DEFINITION, Field::Definition),
                ("member", SKOS_MEMBER, Field::Member),
            ],
        }
    }
}

impl CompactionContext {
    /// Field for a property key given either as short name or full IRI.
    pub fn field_for(&self, key: &str) -> Option<Field> {
        self.terms
            .iter()
            .find(|(short, iri, _)| *short == key || *iri == key)
            .map(|(_, _, field)| *field)
    }
}

/// Compact a JSON-LD document into the entities it describes, in document
/// order.
pub fn compact_document(
    document: &Value,
    context: &CompactionContext,
) -> Result<Vec<Entity>, DictionaryError> {
    let nodes = top_level_nodes(document)?;
    if let Some(declared) = declared_context(document) {
        warn!(
            context = %declared,
            "document declares its own @context; only short names and full IRIs are understood, prefixed keys are ignored"
        );
    }
    Ok(nodes
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|node| compact_node(node, context))
        .collect())
}

/// A non-empty `@context` carried by the document itself
fn declared_context(document: &Value) -> Option<&Value> {
    let context = document.as_object()?.get("@context")?;
    let empty = match context {
        Value::Null => true,
        Value::String(iri) => iri.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(terms) => terms.is_empty(),
        _ => false,
    };
    (!empty).then_some(context)
}

fn top_level_nodes(document: &Value) -> Result<&[Value], DictionaryError> {
    match document {
        Value::Array(nodes) => Ok(nodes),
        Value::Object(object) => match object.get("@graph") {
            Some(Value::Array(nodes)) => Ok(nodes),
            Some(other) => Err(DictionaryError::malformed(format!(
                "@graph must be an array, found {}",
                kind_of(other)
            ))),
            None if object.contains_key("@id") => Ok(std::slice::from_ref(document)),
            None => Err(DictionaryError::malformed(
                "document has neither @graph nor @id",
            )),
        },
        other => Err(DictionaryError::malformed(format!(
            "expected a JSON-LD object or array, found {}",
            kind_of(other)
        ))),
    }
}

fn compact_node(node: &Map<String, Value>, context: &CompactionContext) -> Option<Entity> {
    let id = node.get("@id")?.as_str()?;
    let mut entity = Entity::new(id);

    for (key, value) in node {
        let Some(field) = context.field_for(key) else {
            continue;
        };
        match field {
            Field::Member => entity.members.extend(identifiers(value)),
            Field::PrefLabel => set_first(&mut entity.pref_label, value),
            Field::Notation => set_first(&mut entity.notation, value),
            Field::Label => set_first(&mut entity.label, value),
            Field::Description => set_first(&mut entity.description, value),
            Field::Definition => set_first(&mut entity.definition, value),
        }
    }

    Some(entity)
}

fn set_first(slot: &mut Option<String>, value: &Value) {
    if slot.is_none() {
        *slot = first_literal(value);
    }
}

fn first_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => items.iter().find_map(first_literal),
        Value::Object(object) => object.get("@value").and_then(first_literal),
        Value::Null => None,
    }
}

fn identifiers(value: &Value) -> Vec<String> {
    match value {
        Value::String(id) => vec![id.clone()],
        Value::Object(object) => object
            .get("@id")
            .and_then(Value::as_str)
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(identifiers).collect(),
        _ => Vec::new(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
