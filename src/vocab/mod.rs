//! Controlled-vocabulary graph handling
//!
//! ```text
//! JSON-LD document
//!     └── context::compact_document   (fixed hand-written context)
//!          └── graph::GraphIndex       (entities by @id)
//!               ├── values::ValueExpander
//!               └── aliases::AliasResolver
//! ```
//!
//! `catalog` holds the identifiers that steer the transformation.

pub mod aliases;
pub mod catalog;
pub mod context;
pub mod graph;
pub mod values;

pub use aliases::{Alias, AliasResolver};
pub use catalog::{DomainVariable, NonVocabVariable, VocabularyCatalog};
pub use context::{CompactionContext, compact_document};
pub use graph::{Entity, GraphIndex};
pub use values::{ExpandedValue, ValueCodeSource, ValueExpander};
