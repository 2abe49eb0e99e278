//! # entigram-core
//!
//! Core types, the entity index, and collaborator abstractions for the
//! entigram workspace.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other entigram crates depend on: the
//! [`EntityIndex`] aggregate, its change-event bus, the persisted snapshot
//! format, and the traits the language-model collaborators implement.

pub mod defaults;
pub mod error;
pub mod events;
pub mod index;
pub mod logging;
pub mod models;
pub mod snapshot;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, IndexEvent};
pub use index::{EntityIndex, EvidenceSnapshot};
pub use models::{
    normalize_entity, Category, CategoryOrigin, EntityEvidence, ExtractedEntity, RowId, SourceRow,
};
pub use snapshot::IndexSnapshot;
pub use traits::{CategorySearcher, EntityExtractor};
