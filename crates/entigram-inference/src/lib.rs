//! # entigram-inference
//!
//! LLM collaborator backends for entigram.
//!
//! This crate provides:
//! - The Ollama implementation of the extraction and category-search
//!   collaborators (default, feature `ollama`)
//! - Few-shot prompt builders and response parsers
//! - Mock collaborators for deterministic testing (feature `mock`)
//!
//! # Feature Flags
//!
//! - `ollama` (default): Enable the Ollama backend
//! - `mock`: Enable the mock collaborators for downstream tests

pub mod prompts;

#[cfg(feature = "ollama")]
pub mod ollama;

// Mock collaborators for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use entigram_core::*;

#[cfg(feature = "ollama")]
pub use ollama::OllamaBackend;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockExtractor, MockSearcher};
