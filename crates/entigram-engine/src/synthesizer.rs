//! On-demand category synthesis from a free-text query.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, instrument};

use entigram_core::{
    normalize_entity, Category, CategoryOrigin, EntityEvidence, EntityExtractor, EntityIndex,
    Result, RowId, SourceRow,
};

/// The outcome of one extraction pass, before it touches the index.
///
/// Entities are normalized, deduplicated in first-report order, and their
/// row evidence is unioned, so the set is independent of the order the
/// collaborator reported occurrences in.
#[derive(Debug, Clone)]
pub struct SynthesizedCategory {
    pub key: String,
    pub evidence: Vec<EntityEvidence>,
}

impl SynthesizedCategory {
    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// Entity names in first-report order.
    pub fn entity_names(&self) -> Vec<String> {
        self.evidence.iter().map(|e| e.entity.clone()).collect()
    }
}

/// Synthesizes a category for a query by delegating extraction and
/// relevance filtering to the collaborator.
///
/// One query yields exactly one category: whatever labels the collaborator
/// returns are collapsed into a single category keyed by the literal query
/// string.
pub struct CategorySynthesizer {
    extractor: Arc<dyn EntityExtractor>,
}

impl CategorySynthesizer {
    pub fn new(extractor: Arc<dyn EntityExtractor>) -> Self {
        Self { extractor }
    }

    /// Run the extraction collaborator once, scoped to `query`, without
    /// touching any index. Collaborator failure propagates as
    /// `Error::Extraction`; zero entities is a valid, empty result.
    #[instrument(skip(self, corpus), fields(subsystem = "engine", component = "synthesizer", op = "discover", query = %query, row_count = corpus.len()))]
    pub async fn discover(&self, query: &str, corpus: &[SourceRow]) -> Result<SynthesizedCategory> {
        let extracted = self.extractor.extract_and_label(corpus, Some(query)).await?;

        let mut order: Vec<String> = Vec::new();
        let mut rows_by_entity: HashMap<String, BTreeSet<RowId>> = HashMap::new();
        for occurrence in extracted {
            let name = normalize_entity(&occurrence.entity);
            if name.is_empty() {
                continue;
            }
            if !rows_by_entity.contains_key(&name) {
                order.push(name.clone());
            }
            rows_by_entity.entry(name).or_default().insert(occurrence.row_id);
        }

        let evidence = order
            .into_iter()
            .map(|name| {
                let rows = rows_by_entity.remove(&name).unwrap_or_default();
                EntityEvidence::new(name, rows.into_iter().collect())
            })
            .collect::<Vec<_>>();

        debug!(entity_count = evidence.len(), "Synthesis discovered entities");
        Ok(SynthesizedCategory {
            key: query.to_string(),
            evidence,
        })
    }

    /// Register the discovered entities (with their row evidence) into the
    /// index and return the displayable category.
    ///
    /// If a category with the query key already exists it is augmented in
    /// place: existing members first, new entities appended. A brand-new
    /// category key is *not* inserted here: committing a new category is the
    /// caller's decision.
    pub fn register(&self, found: &SynthesizedCategory, index: &mut EntityIndex) -> Result<Category> {
        for evidence in &found.evidence {
            index.register_entity(&evidence.entity, &evidence.rows)?;
        }

        if index.contains_category(&found.key) && !found.is_empty() {
            let origin = index
                .category_origin(&found.key)
                .unwrap_or(CategoryOrigin::Discovered);
            let mut members = index.entities_in_category(&found.key)?;
            for evidence in &found.evidence {
                if !members.contains(&evidence.entity) {
                    members.push(evidence.entity.clone());
                }
            }
            index.upsert_category(&found.key, &members, origin)?;
        }

        let entities = if index.contains_category(&found.key) {
            index.entities_in_category(&found.key)?
        } else {
            index.rank_by_evidence(&found.entity_names())
        };
        Ok(Category::new(found.key.clone(), entities))
    }

    /// The full synthesis contract: one collaborator call, entity
    /// registration, and the resulting category with live count-ordered
    /// entities. The index is left unmodified on collaborator failure.
    pub async fn synthesize(
        &self,
        query: &str,
        corpus: &[SourceRow],
        index: &mut EntityIndex,
    ) -> Result<Category> {
        let found = self.discover(query, corpus).await?;
        self.register(&found, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entigram_core::{Error, ExtractedEntity};

    struct ScriptedExtractor {
        entities: Vec<ExtractedEntity>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl EntityExtractor for ScriptedExtractor {
        async fn extract_and_label(
            &self,
            _rows: &[SourceRow],
            _query: Option<&str>,
        ) -> Result<Vec<ExtractedEntity>> {
            if self.fail {
                return Err(Error::Extraction("down".to_string()));
            }
            Ok(self.entities.clone())
        }
    }

    fn synthesizer(entities: Vec<ExtractedEntity>) -> CategorySynthesizer {
        CategorySynthesizer::new(Arc::new(ScriptedExtractor {
            entities,
            fail: false,
        }))
    }

    #[tokio::test]
    async fn test_discover_collapses_labels_onto_query_key() {
        let synth = synthesizer(vec![
            ExtractedEntity::new("dylan", 1, "folk singers"),
            ExtractedEntity::new("cohen", 2, "songwriters"),
        ]);
        let found = synth.discover("musicians", &[]).await.unwrap();

        assert_eq!(found.key, "musicians");
        assert_eq!(found.entity_names(), vec!["dylan", "cohen"]);
    }

    #[tokio::test]
    async fn test_discover_unions_evidence_order_independently() {
        let occurrences = vec![
            ExtractedEntity::new("Dylan", 3, "musicians"),
            ExtractedEntity::new("dylan ", 1, "musicians"),
            ExtractedEntity::new("dylan", 3, "musicians"),
        ];
        let mut reversed = occurrences.clone();
        reversed.reverse();

        let a = synthesizer(occurrences)
            .discover("musicians", &[])
            .await
            .unwrap();
        let b = synthesizer(reversed)
            .discover("musicians", &[])
            .await
            .unwrap();

        assert_eq!(a.evidence.len(), 1);
        assert_eq!(a.evidence[0].rows, vec![1, 3]);
        assert_eq!(a.evidence[0].rows, b.evidence[0].rows);
    }

    #[tokio::test]
    async fn test_discover_zero_entities_is_empty_not_error() {
        let synth = synthesizer(vec![]);
        let found = synth.discover("nothing", &[]).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_failure_leaves_index_unmodified() {
        let synth = CategorySynthesizer::new(Arc::new(ScriptedExtractor {
            entities: vec![],
            fail: true,
        }));
        let mut index = EntityIndex::new();
        index.register_entity("covid", &[1]).unwrap();

        let err = synth.synthesize("q", &[], &mut index).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(index.entity_count(), 1);
        assert_eq!(index.category_count(), 0);
    }

    #[tokio::test]
    async fn test_register_augments_existing_category() {
        let mut index = EntityIndex::new();
        index.register_entity("covid", &[1, 3]).unwrap();
        index
            .upsert_category(
                "diseases",
                &["covid".to_string()],
                CategoryOrigin::Discovered,
            )
            .unwrap();

        let synth = synthesizer(vec![ExtractedEntity::new("ebola", 7, "diseases")]);
        let category = synth
            .synthesize("diseases", &[], &mut index)
            .await
            .unwrap();

        assert_eq!(category.entities, vec!["covid", "ebola"]);
        assert_eq!(
            index.entities_in_category("diseases").unwrap(),
            vec!["covid", "ebola"]
        );
        // Augmentation keeps the original origin.
        assert_eq!(
            index.category_origin("diseases"),
            Some(CategoryOrigin::Discovered)
        );
    }

    #[tokio::test]
    async fn test_synthesize_new_key_registers_entities_without_category() {
        let mut index = EntityIndex::new();
        let synth = synthesizer(vec![ExtractedEntity::new("dylan", 1, "musicians")]);

        let category = synth
            .synthesize("musicians", &[], &mut index)
            .await
            .unwrap();

        assert_eq!(category.entities, vec!["dylan"]);
        assert!(index.contains_entity("dylan"));
        // Creating the committed category is the caller's decision.
        assert!(!index.contains_category("musicians"));
    }

    #[tokio::test]
    async fn test_synthesize_twice_yields_identical_entity_sets() {
        let entities = vec![
            ExtractedEntity::new("dylan", 1, "musicians"),
            ExtractedEntity::new("cohen", 2, "musicians"),
        ];
        let synth = synthesizer(entities);
        let mut index = EntityIndex::new();

        let first = synth.synthesize("musicians", &[], &mut index).await.unwrap();
        let second = synth.synthesize("musicians", &[], &mut index).await.unwrap();

        let to_set = |c: &Category| c.entities.iter().cloned().collect::<std::collections::BTreeSet<_>>();
        assert_eq!(to_set(&first), to_set(&second));
    }
}
