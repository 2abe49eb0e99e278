//! Derives the ordered, deduplicated category list for a search state.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use entigram_core::{CategorySearcher, EntityIndex, Result};

/// Computes the categories to display for a search string: substring
/// matches over existing category keys in natural display order, followed
/// by collaborator search results not already listed.
///
/// A pure function of the index and the query, invoked on demand rather
/// than recomputed reactively.
pub struct SearchProjection {
    searcher: Arc<dyn CategorySearcher>,
}

impl SearchProjection {
    pub fn new(searcher: Arc<dyn CategorySearcher>) -> Self {
        Self { searcher }
    }

    /// Project the ordered category keys for `search`.
    ///
    /// The empty search lists every category exactly once in natural order
    /// without invoking the collaborator. Substring matching is a
    /// case-sensitive literal match on category keys.
    #[instrument(skip(self, index), fields(subsystem = "engine", component = "projection", op = "project", query = %search))]
    pub async fn project(&self, index: &EntityIndex, search: &str) -> Result<Vec<String>> {
        let natural = index.natural_order();
        if search.is_empty() {
            return Ok(natural);
        }

        let substring_matches: Vec<String> = natural
            .iter()
            .filter(|key| key.contains(search))
            .cloned()
            .collect();
        let synthesized_matches = self.searcher.search_categories(search, &natural).await?;

        let merged = merge_ordered(substring_matches, synthesized_matches);
        debug!(result_count = merged.len(), "Projection computed");
        Ok(merged)
    }
}

/// Concatenate two ordered key lists, removing duplicates while preserving
/// first occurrence. Never re-sorts.
pub fn merge_ordered(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use entigram_core::CategoryOrigin;

    struct ScriptedSearcher {
        results: Vec<String>,
    }

    #[async_trait]
    impl CategorySearcher for ScriptedSearcher {
        async fn search_categories(&self, _query: &str, _known: &[String]) -> Result<Vec<String>> {
            Ok(self.results.clone())
        }
    }

    fn projection(results: Vec<&str>) -> SearchProjection {
        SearchProjection::new(Arc::new(ScriptedSearcher {
            results: results.into_iter().map(str::to_string).collect(),
        }))
    }

    fn seeded_index() -> EntityIndex {
        let mut index = EntityIndex::new();
        index.register_entity("covid", &[1, 3]).unwrap();
        index.register_entity("flu", &[2]).unwrap();
        index.register_entity("dylan", &[4]).unwrap();
        index
            .upsert_category(
                "diseases",
                &["covid".to_string(), "flu".to_string()],
                CategoryOrigin::Discovered,
            )
            .unwrap();
        index
            .upsert_category(
                "disorders",
                &["flu".to_string()],
                CategoryOrigin::Discovered,
            )
            .unwrap();
        index
            .upsert_category(
                "musicians",
                &["dylan".to_string()],
                CategoryOrigin::UserCreated,
            )
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_empty_search_returns_all_in_natural_order() {
        let index = seeded_index();
        let projected = projection(vec!["ignored"])
            .project(&index, "")
            .await
            .unwrap();
        // User-created first, then discovered by top-entity count.
        assert_eq!(projected, vec!["musicians", "diseases", "disorders"]);
    }

    #[tokio::test]
    async fn test_substring_matches_keep_natural_order() {
        let index = seeded_index();
        let projected = projection(vec![]).project(&index, "dis").await.unwrap();
        assert_eq!(projected, vec!["diseases", "disorders"]);
    }

    #[tokio::test]
    async fn test_substring_match_is_case_sensitive() {
        let index = seeded_index();
        let projected = projection(vec![]).project(&index, "DIS").await.unwrap();
        assert!(projected.is_empty());
    }

    #[tokio::test]
    async fn test_synthesized_matches_append_without_double_listing() {
        let index = seeded_index();
        let projected = projection(vec!["musicians", "diseases"])
            .project(&index, "dis")
            .await
            .unwrap();
        // "diseases" already listed by substring match; "musicians" appends.
        assert_eq!(projected, vec!["diseases", "disorders", "musicians"]);
    }

    #[tokio::test]
    async fn test_merge_ordered_dedups_preserving_first_occurrence() {
        let merged = merge_ordered(
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
            vec!["c".to_string(), "b".to_string()],
        );
        assert_eq!(merged, vec!["a", "b", "c"]);
    }
}
