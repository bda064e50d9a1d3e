//! Data-quality warnings raised while building the dictionary.
//!
//! These never abort a rebuild. Each one is logged as a structured `warn`
//! event (which is also what reaches the OpenTelemetry exporter when one is
//! configured), counted in the Prometheus registry, and kept on the build
//! report so callers and tests can inspect them.

use serde::Serialize;
use std::fmt;

/// A non-fatal problem found in the source vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// A permitted value has no usable code; the row is emitted with a null
    /// value code.
    MissingValueCode {
        variable_id: String,
        member_id: String,
    },
    /// A variable has no alias table entry; it produces no rows.
    UnmappedVariable { variable_id: String },
}

impl DataQualityWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            DataQualityWarning::MissingValueCode { .. } => "missing_value_code",
            DataQualityWarning::UnmappedVariable { .. } => "unmapped_variable",
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::MissingValueCode {
                variable_id,
                member_id,
            } => write!(
                f,
                "missing code for member ID={member_id} as part of variable with ID={variable_id}"
            ),
            DataQualityWarning::UnmappedVariable { variable_id } => write!(
                f,
                "could not find variable code mapping for ID={variable_id}"
            ),
        }
    }
}

/// Side channel that warnings are emitted into during one rebuild
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<DataQualityWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: DataQualityWarning) {
        tracing::warn!(
            warning.kind = warning.kind(),
            "{}",
            warning
        );
        crate::metrics::METRICS.record_warning(warning.kind());
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<DataQualityWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_emission_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(DataQualityWarning::UnmappedVariable {
            variable_id: "v1".into(),
        });
        diagnostics.warn(DataQualityWarning::MissingValueCode {
            variable_id: "v2".into(),
            member_id: "m".into(),
        });
        let kinds: Vec<_> = diagnostics.warnings().iter().map(|w| w.kind()).collect();
        assert_eq!(kinds, vec!["unmapped_variable", "missing_value_code"]);
    }

    #[test]
    fn messages_name_identifiers() {
        let warning = DataQualityWarning::MissingValueCode {
            variable_id: "v".into(),
            member_id: "m".into(),
        };
        assert_eq!(
            warning.to_string(),
            "missing code for member ID=m as part of variable with ID=v"
        );
    }
}
