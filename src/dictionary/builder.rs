//! Graph → dictionary transformation.
//!
//! 1. resolve the categorical-variable container
//! 2. worklist = container members, then cross-referenced variables
//! 3. drop ignored identifiers
//! 4. expand values, fan out over aliases
//! 5. append non-vocabulary variables
//! 6. append domain-only variables
//! 7. stable sort by `(variableCode, variableValueCode)`
//!
//! Any missing entity aborts the build; data-quality problems are reported
//! and skipped.

use crate::diagnostics::{DataQualityWarning, Diagnostics};
use crate::dictionary::model::{Dictionary, DictionaryEntry};
use crate::error::DictionaryError;
use crate::vocab::{Alias, Entity, GraphIndex, ValueExpander, VocabularyCatalog};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dictionary: Dictionary,
    pub warnings: Vec<DataQualityWarning>,
}

/// Builds a [`Dictionary`] from a graph and a fixed [`VocabularyCatalog`].
///
/// A pure function of its inputs: the same graph and catalog always yield
/// the same dictionary.
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    catalog: VocabularyCatalog,
    values: ValueExpander,
}

impl DictionaryBuilder {
    pub fn new(catalog: VocabularyCatalog) -> Self {
        let values = ValueExpander::new(catalog.coded_by_label.iter().cloned());
        Self { catalog, values }
    }

    pub fn catalog(&self) -> &VocabularyCatalog {
        &self.catalog
    }

    pub fn build(&self, graph: &GraphIndex) -> Result<BuildReport, DictionaryError> {
        let started = Instant::now();
        let mut diagnostics = Diagnostics::new();
        let mut entries = Vec::new();

        for variable_id in self.worklist(graph)? {
            let variable = graph.resolve(variable_id)?;
            self.push_vocabulary_variable(variable, graph, &mut entries, &mut diagnostics)?;
        }

        for non_vocab in &self.catalog.non_vocab {
            let entity = graph.resolve(&non_vocab.id)?;
            let label = entity.display_label().unwrap_or(&non_vocab.code);
            entries.push(DictionaryEntry::valueless(
                &non_vocab.code,
                label,
                entity.definition.clone(),
            ));
        }

        for domain in &self.catalog.domain_only {
            entries.push(DictionaryEntry::valueless(
                &domain.code,
                &domain.code,
                Some(domain.definition.clone()),
            ));
        }

        let dictionary = Dictionary::from_unsorted(entries);
        let warnings = diagnostics.into_warnings();
        info!(
            entries = dictionary.len(),
            warnings = warnings.len(),
            graph_size = graph.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "dictionary built"
        );
        Ok(BuildReport {
            dictionary,
            warnings,
        })
    }

    /// Container members followed by cross-referenced variables, minus the
    /// ignore list. Each id appears once, at its first position.
    fn worklist<'a>(&'a self, graph: &'a GraphIndex) -> Result<Vec<&'a str>, DictionaryError> {
        let container = graph.resolve_container(&self.catalog.container_id)?;
        let mut seen = HashSet::new();
        let worklist = container
            .members
            .iter()
            .chain(self.catalog.cross_referenced.iter())
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .filter(|id| {
                let ignored = self.catalog.is_ignored(id);
                if ignored {
                    debug!(variable_id = %id, "ignoring variable");
                }
                !ignored
            })
            .collect();
        Ok(worklist)
    }

    fn push_vocabulary_variable(
        &self,
        variable: &Entity,
        graph: &GraphIndex,
        entries: &mut Vec<DictionaryEntry>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), DictionaryError> {
        let values = self.values.expand(variable, graph, diagnostics)?;
        let Some(aliases) = self.catalog.aliases.resolve(&variable.id) else {
            diagnostics.warn(DataQualityWarning::UnmappedVariable {
                variable_id: variable.id.clone(),
            });
            return Ok(());
        };
        if values.is_empty() {
            debug!(variable_id = %variable.id, "variable has no members");
        }

        for value in &values {
            for alias in aliases {
                entries.push(DictionaryEntry {
                    variable_code: alias.code.clone(),
                    variable_label: alias_label(alias, variable).to_string(),
                    variable_definition: variable.definition.clone(),
                    variable_value_code: value.code.clone(),
                    variable_value_label: value.label.clone(),
                    variable_value_definition: value.definition.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Override label, else the vocabulary's label, else the alias code.
fn alias_label<'a>(alias: &'a Alias, variable: &'a Entity) -> &'a str {
    alias
        .label
        .as_deref()
        .filter(|label| !label.is_empty())
        .or_else(|| variable.display_label())
        .unwrap_or(&alias.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::AliasResolver;
    use assert_matches::assert_matches;

    fn catalog() -> VocabularyCatalog {
        VocabularyCatalog::new("container")
    }

    #[test]
    fn label_falls_back_to_pref_label_then_code() {
        let alias = Alias::new("code");
        let pref = Entity::new("v").with_pref_label("Pref");
        let bare = Entity::new("v");
        assert_eq!(alias_label(&alias, &pref), "Pref");
        assert_eq!(alias_label(&alias, &bare), "code");
        assert_eq!(alias_label(&Alias::labelled("code", ""), &bare), "code");
    }

    #[test]
    fn missing_container_aborts() {
        let builder = DictionaryBuilder::new(catalog());
        assert_matches!(
            builder.build(&GraphIndex::default()),
            Err(DictionaryError::ContainerNotFound { id }) if id == "container"
        );
    }

    #[test]
    fn missing_variable_aborts() {
        let graph = GraphIndex::from_entities([Entity::new("container").with_members(["v"])]);
        let builder = DictionaryBuilder::new(catalog());
        assert_matches!(
            builder.build(&graph),
            Err(DictionaryError::EntityNotFound { id }) if id == "v"
        );
    }

    #[test]
    fn repeated_worklist_ids_are_expanded_once() {
        let graph = GraphIndex::from_entities([
            Entity::new("container").with_members(["obs", "obs", "stray"]),
            Entity::new("obs").with_label("Observer").with_members(["alice"]),
            Entity::new("alice").with_notation("alice"),
            Entity::new("stray").with_members(["x"]),
            Entity::new("x").with_notation("x"),
        ]);
        let catalog = catalog()
            .with_cross_referenced("obs")
            .with_cross_referenced("stray")
            .with_aliases(AliasResolver::new().with("obs", "observer_veg"));

        let report = DictionaryBuilder::new(catalog).build(&graph).unwrap();

        let entries = report.dictionary.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].variable_code, "observer_veg");
        assert_eq!(entries[0].variable_value_code.as_deref(), Some("alice"));
        assert_eq!(
            report.warnings,
            vec![DataQualityWarning::UnmappedVariable {
                variable_id: "stray".to_string()
            }]
        );
    }

    #[test]
    fn ignored_variables_are_not_resolved() {
        let graph = GraphIndex::from_entities([Entity::new("container").with_members(["gone"])]);
        let builder = DictionaryBuilder::new(catalog().with_ignored("gone"));
        let report = builder.build(&graph).unwrap();
        assert!(report.dictionary.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn non_vocab_label_falls_back_to_code() {
        let graph = GraphIndex::from_entities([
            Entity::new("container"),
            Entity::new("nv").with_definition("a free-text field"),
        ]);
        let builder = DictionaryBuilder::new(catalog().with_non_vocab("nv", "free_text"));
        let report = builder.build(&graph).unwrap();
        assert_eq!(
            report.dictionary.entries(),
            &[DictionaryEntry::valueless(
                "free_text",
                "free_text",
                Some("a free-text field".to_string())
            )]
        );
    }

    #[test]
    fn variable_without_members_yields_no_rows() {
        let graph = GraphIndex::from_entities([
            Entity::new("container").with_members(["v"]),
            Entity::new("v").with_label("V"),
        ]);
        let builder =
            DictionaryBuilder::new(catalog().with_aliases(AliasResolver::new().with("v", "v")));
        let report = builder.build(&graph).unwrap();
        assert!(report.dictionary.is_empty());
        assert!(report.warnings.is_empty());
    }
}
