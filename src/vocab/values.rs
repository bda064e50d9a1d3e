//! Expansion of a variable's permitted values.

use crate::diagnostics::{DataQualityWarning, Diagnostics};
use crate::error::DictionaryError;
use crate::vocab::graph::{Entity, GraphIndex};
use std::collections::HashSet;

/// One permitted value of a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedValue {
    pub code: Option<String>,
    pub label: Option<String>,
    pub definition: Option<String>,
}

/// Which field of a value entity supplies its code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCodeSource {
    Notation,
    /// For vocabularies whose values carry no notation
    Label,
}

/// Resolves a variable's members into `(code, label, definition)` records.
#[derive(Debug, Clone, Default)]
pub struct ValueExpander {
    coded_by_label: HashSet<String>,
}

impl ValueExpander {
    /// `coded_by_label` lists the variables whose values take their code from
    /// `label` rather than `notation`.
    pub fn new<I, S>(coded_by_label: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            coded_by_label: coded_by_label.into_iter().map(Into::into).collect(),
        }
    }

    pub fn code_source(&self, variable_id: &str) -> ValueCodeSource {
        if self.coded_by_label.contains(variable_id) {
            ValueCodeSource::Label
        } else {
            ValueCodeSource::Notation
        }
    }

    /// Expand `variable`'s members in member-list order.
    ///
    /// A member missing from the graph aborts the rebuild. A member without
    /// a code is kept with `code: None` and reported to `diagnostics`.
    pub fn expand(
        &self,
        variable: &Entity,
        graph: &GraphIndex,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<ExpandedValue>, DictionaryError> {
        let source = self.code_source(&variable.id);
        variable
            .members
            .iter()
            .map(|member_id| {
                let member = graph.resolve(member_id)?;
                let code = match source {
                    ValueCodeSource::Notation => member.notation.clone(),
                    ValueCodeSource::Label => member.label.clone(),
                };
                if code.is_none() {
                    diagnostics.warn(DataQualityWarning::MissingValueCode {
                        variable_id: variable.id.clone(),
                        member_id: member_id.clone(),
                    });
                }
                Ok(ExpandedValue {
                    code,
                    label: member.label.clone(),
                    definition: member.definition.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn graph() -> GraphIndex {
        GraphIndex::from_entities([
            Entity::new("var").with_members(["b", "a"]),
            Entity::new("datum").with_members(["d1"]),
            Entity::new("a").with_notation("A").with_label("Alpha"),
            Entity::new("b")
                .with_notation("B")
                .with_label("Beta")
                .with_definition("second letter"),
            Entity::new("d1").with_label("GDA94"),
        ])
    }

    #[test]
    fn preserves_member_order() {
        let graph = graph();
        let mut diagnostics = Diagnostics::new();
        let values = ValueExpander::default()
            .expand(graph.resolve("var").unwrap(), &graph, &mut diagnostics)
            .unwrap();
        let codes: Vec<_> = values.iter().map(|v| v.code.as_deref()).collect();
        assert_eq!(codes, vec![Some("B"), Some("A")]);
        assert_eq!(values[0].definition.as_deref(), Some("second letter"));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn label_coded_variables_use_label() {
        let graph = graph();
        let mut diagnostics = Diagnostics::new();
        let expander = ValueExpander::new(["datum"]);
        let values = expander
            .expand(graph.resolve("datum").unwrap(), &graph, &mut diagnostics)
            .unwrap();
        assert_eq!(values[0].code.as_deref(), Some("GDA94"));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn missing_code_warns_and_keeps_row() {
        let graph = graph();
        let mut diagnostics = Diagnostics::new();
        let values = ValueExpander::default()
            .expand(graph.resolve("datum").unwrap(), &graph, &mut diagnostics)
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].code, None);
        assert_eq!(values[0].label.as_deref(), Some("GDA94"));
        assert_eq!(
            diagnostics.warnings(),
            &[DataQualityWarning::MissingValueCode {
                variable_id: "datum".into(),
                member_id: "d1".into(),
            }]
        );
    }

    #[test]
    fn missing_member_is_fatal() {
        let graph = GraphIndex::from_entities([Entity::new("v").with_members(["ghost"])]);
        let mut diagnostics = Diagnostics::new();
        let result =
            ValueExpander::default().expand(graph.resolve("v").unwrap(), &graph, &mut diagnostics);
        assert_matches!(result, Err(DictionaryError::EntityNotFound { id }) if id == "ghost");
    }
}
