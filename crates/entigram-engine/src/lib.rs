//! # entigram-engine
//!
//! The interactive categorization engine: on-demand category synthesis,
//! the human-in-the-loop pending-category workflow, search projection, and
//! debounced search dispatch.
//!
//! All components take an explicitly owned [`EntityIndex`]; there are no
//! hidden singletons. Index mutation is synchronous under a single writer; the
//! collaborator calls and the debounce timer are the only suspension
//! points.
//!
//! [`EntityIndex`]: entigram_core::EntityIndex

pub mod pending;
pub mod projection;
pub mod session;
pub mod synthesizer;

// Re-export core types
pub use entigram_core::*;

pub use pending::PendingCategoryWorkflow;
pub use projection::{merge_ordered, SearchProjection};
pub use session::{DebouncedSearch, SearchDispatcher, SearchOutcome, SearchTicket};
pub use synthesizer::{CategorySynthesizer, SynthesizedCategory};
