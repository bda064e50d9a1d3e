//! The flat dictionary and the builder that derives it from a vocabulary graph.

pub mod builder;
pub mod model;

pub use crate::diagnostics::DataQualityWarning;
pub use builder::{BuildReport, DictionaryBuilder};
pub use model::{Dictionary, DictionaryEntry};
