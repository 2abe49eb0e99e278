//! End-to-end curation flow over the engine with mock collaborators:
//! project, search-synthesize, curate, commit.

use std::sync::Arc;

use entigram_core::{CategoryOrigin, EntityIndex, ExtractedEntity, IndexSnapshot, SourceRow};
use entigram_engine::{CategorySynthesizer, PendingCategoryWorkflow, SearchProjection};
use entigram_inference::{MockExtractor, MockSearcher};

fn corpus() -> Vec<SourceRow> {
    vec![
        SourceRow::new(1, "covid case counts rose"),
        SourceRow::new(2, "flu season started"),
        SourceRow::new(3, "covid restrictions lifted"),
        SourceRow::new(4, "dylan played the hall"),
    ]
}

fn seeded_index() -> EntityIndex {
    let mut index = EntityIndex::new();
    index.register_entity("covid", &[1, 3]).unwrap();
    index.register_entity("flu", &[2]).unwrap();
    index
        .upsert_category(
            "diseases",
            &["covid".to_string(), "flu".to_string()],
            CategoryOrigin::Discovered,
        )
        .unwrap();
    index
}

#[tokio::test]
async fn test_search_curate_commit_flow() {
    let mut index = seeded_index();

    let projection = SearchProjection::new(Arc::new(MockSearcher::new()));
    assert_eq!(
        projection.project(&index, "dis").await.unwrap(),
        vec!["diseases"]
    );

    let extractor = MockExtractor::new().with_response(
        "musicians",
        vec![ExtractedEntity::new("dylan", 4, "musicians")],
    );
    let mut workflow =
        PendingCategoryWorkflow::new(CategorySynthesizer::new(Arc::new(extractor.clone())));

    let synthesized = workflow
        .start_search("musicians", &corpus(), &mut index)
        .await
        .unwrap();
    assert_eq!(synthesized.entities, vec!["dylan"]);
    // Exactly one collaborator call per synthesis request.
    assert_eq!(extractor.call_count(), 1);

    assert!(workflow.toggle("dylan"));
    let committed = workflow.commit(&mut index).unwrap();
    assert_eq!(committed.entities, vec!["dylan"]);

    // Both categories live in the index afterwards.
    assert_eq!(
        index.entities_in_category("diseases").unwrap(),
        vec!["covid", "flu"]
    );
    assert_eq!(
        index.entities_in_category("musicians").unwrap(),
        vec!["dylan"]
    );
    assert_eq!(
        index.rows_for_entity("dylan").into_iter().collect::<Vec<_>>(),
        vec![4]
    );

    // The committed category projects first (user-created).
    assert_eq!(
        projection.project(&index, "").await.unwrap(),
        vec!["musicians", "diseases"]
    );
}

#[tokio::test]
async fn test_superseding_search_leaves_no_orphan() {
    let mut index = seeded_index();
    let before = IndexSnapshot::from_index(&index);

    let extractor = MockExtractor::new()
        .with_response("x", vec![ExtractedEntity::new("xenon", 1, "x")])
        .with_response("y", vec![ExtractedEntity::new("yttrium", 2, "y")]);
    let mut workflow =
        PendingCategoryWorkflow::new(CategorySynthesizer::new(Arc::new(extractor)));

    workflow.start_search("x", &corpus(), &mut index).await.unwrap();
    workflow.start_search("y", &corpus(), &mut index).await.unwrap();

    // Only "y" is pending; "x"'s speculative category did not persist.
    assert_eq!(workflow.pending_name(), Some("y"));
    assert!(!index.contains_category("x"));
    assert!(!index.contains_entity("xenon"));

    workflow.toggle("yttrium");
    workflow.commit(&mut index).unwrap();
    assert!(index.contains_category("y"));
    assert!(!index.contains_category("x"));

    // Cancelling after a commit changes nothing further.
    workflow.cancel(&mut index).unwrap();
    assert!(index.contains_category("y"));

    // And a cancelled-only run restores the starting state exactly.
    let mut fresh = seeded_index();
    let extractor = MockExtractor::new()
        .with_response("x", vec![ExtractedEntity::new("xenon", 1, "x")]);
    let mut workflow =
        PendingCategoryWorkflow::new(CategorySynthesizer::new(Arc::new(extractor)));
    workflow.start_search("x", &corpus(), &mut fresh).await.unwrap();
    workflow.cancel(&mut fresh).unwrap();
    assert_eq!(IndexSnapshot::from_index(&fresh), before);
}

#[tokio::test]
async fn test_extraction_failure_surfaces_and_preserves_index() {
    let mut index = seeded_index();
    let before = IndexSnapshot::from_index(&index);

    let extractor = MockExtractor::new().with_failure();
    let mut workflow =
        PendingCategoryWorkflow::new(CategorySynthesizer::new(Arc::new(extractor)));

    let err = workflow
        .start_search("musicians", &corpus(), &mut index)
        .await
        .unwrap_err();
    assert!(matches!(err, entigram_core::Error::Extraction(_)));
    assert!(!workflow.is_pending());
    assert_eq!(IndexSnapshot::from_index(&index), before);
}
