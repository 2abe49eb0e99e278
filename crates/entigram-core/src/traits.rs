//! Collaborator traits for entigram abstractions.
//!
//! These traits define the interfaces the language-model-backed
//! collaborators must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ExtractedEntity, SourceRow};

/// Language-model-backed entity extraction and labeling.
///
/// Implementations may be slow and rate-limited; callers issue at most one
/// call per synthesis request.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract entities from `rows` and assign each occurrence a category
    /// label. When `query` is set, the collaborator also scopes the result
    /// to rows and entities relevant to it; relevance filtering is the
    /// collaborator's job, callers never re-implement text matching.
    async fn extract_and_label(
        &self,
        rows: &[SourceRow],
        query: Option<&str>,
    ) -> Result<Vec<ExtractedEntity>>;
}

/// Server-side category search, distinct from plain substring matching on
/// already-known category keys.
#[async_trait]
pub trait CategorySearcher: Send + Sync {
    /// Return the keys among `known` relevant to `query`, best match first.
    async fn search_categories(&self, query: &str, known: &[String]) -> Result<Vec<String>>;
}
