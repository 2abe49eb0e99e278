//! The offline annotation pipeline: load a dataset, run one extraction
//! pass, build the entity index, and persist the snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use entigram_core::{
    defaults, normalize_entity, CategoryOrigin, EntityExtractor, EntityIndex, Error,
    ExtractedEntity, IndexSnapshot, Result, RowId,
};

use crate::dataset::Dataset;

/// Configuration for the annotation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Input CSV file.
    pub input_csv: PathBuf,
    /// Column of the input to annotate.
    pub column: String,
    /// Output dataset directory; recreated on every run.
    pub output_dir: PathBuf,
    /// Cap on distinct entities kept, ranked by total evidence.
    pub top_entity_limit: usize,
}

impl PipelineConfig {
    pub fn new(
        input_csv: impl Into<PathBuf>,
        column: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_csv: input_csv.into(),
            column: column.into(),
            output_dir: output_dir.into(),
            top_entity_limit: defaults::TOP_ENTITY_LIMIT,
        }
    }

    pub fn with_top_entity_limit(mut self, limit: usize) -> Self {
        self.top_entity_limit = limit;
        self
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ENTIGRAM_INPUT_CSV` | required | Input CSV path |
    /// | `ENTIGRAM_COLUMN` | `text` | Column to annotate |
    /// | `ENTIGRAM_OUTPUT_DIR` | required | Output dataset directory |
    pub fn from_env() -> Result<Self> {
        let input_csv = std::env::var("ENTIGRAM_INPUT_CSV")
            .map_err(|_| Error::Config("ENTIGRAM_INPUT_CSV is not set".to_string()))?;
        let column =
            std::env::var("ENTIGRAM_COLUMN").unwrap_or_else(|_| defaults::TEXT_COLUMN.to_string());
        let output_dir = std::env::var("ENTIGRAM_OUTPUT_DIR")
            .map_err(|_| Error::Config("ENTIGRAM_OUTPUT_DIR is not set".to_string()))?;
        Ok(Self::new(input_csv, column, output_dir))
    }
}

/// Runs the offline stage: annotate a dataset and persist the result as a
/// dataset directory the viewer can serve.
pub struct AnnotationPipeline {
    config: PipelineConfig,
    extractor: Arc<dyn EntityExtractor>,
}

impl AnnotationPipeline {
    pub fn new(config: PipelineConfig, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self { config, extractor }
    }

    /// Run the full pipeline. Returns the built index.
    #[instrument(skip(self), fields(subsystem = "pipeline", component = "annotate", op = "run"))]
    pub async fn run(&self) -> Result<EntityIndex> {
        info!(input = %self.config.input_csv.display(), "Loading data");
        let dataset = Dataset::load_csv(&self.config.input_csv, &self.config.column)?;

        info!(row_count = dataset.len(), "Annotating data");
        let extracted = self.extractor.extract_and_label(&dataset.rows, None).await?;

        info!(entity_count = extracted.len(), "Building index");
        let index = build_index(&extracted, self.config.top_entity_limit)?;

        let output_dir = &self.config.output_dir;
        if output_dir.exists() {
            std::fs::remove_dir_all(output_dir)?;
        }
        std::fs::create_dir_all(output_dir)?;

        dataset.write_annotated_csv(output_dir)?;
        IndexSnapshot::from_index(&index).save(output_dir)?;

        info!(
            output = %output_dir.display(),
            category_count = index.category_count(),
            entity_count = index.entity_count(),
            "Saved dataset"
        );
        Ok(index)
    }
}

/// Build an [`EntityIndex`] from one extraction pass.
///
/// Pairs labeled `none` (or with an empty label) are dropped: that is the
/// collaborator's way of saying no category fits. Distinct entities are
/// capped at `top_entity_limit`, ranked by total row evidence with ties
/// broken by first-report order. Categories left with no surviving members
/// are dropped.
pub fn build_index(extracted: &[ExtractedEntity], top_entity_limit: usize) -> Result<EntityIndex> {
    let mut entity_order: Vec<String> = Vec::new();
    let mut rows_by_entity: HashMap<String, Vec<RowId>> = HashMap::new();
    let mut label_order: Vec<String> = Vec::new();
    let mut members_by_label: HashMap<String, Vec<String>> = HashMap::new();

    for occurrence in extracted {
        let label = occurrence.label.trim().to_lowercase();
        if label.is_empty() || label == "none" {
            continue;
        }
        let entity = normalize_entity(&occurrence.entity);
        if entity.is_empty() {
            continue;
        }

        if !rows_by_entity.contains_key(&entity) {
            entity_order.push(entity.clone());
        }
        let rows = rows_by_entity.entry(entity.clone()).or_default();
        if !rows.contains(&occurrence.row_id) {
            rows.push(occurrence.row_id);
        }

        let members = members_by_label.entry(label.clone()).or_insert_with(|| {
            label_order.push(label.clone());
            Vec::new()
        });
        if !members.contains(&entity) {
            members.push(entity);
        }
    }

    // Cap distinct entities by total evidence, first-report order on ties.
    let kept: std::collections::HashSet<String> = if entity_order.len() > top_entity_limit {
        let mut ranked: Vec<(usize, &String)> = entity_order.iter().enumerate().map(|(i, e)| (i, e)).collect();
        ranked.sort_by_key(|(i, e)| (std::cmp::Reverse(rows_by_entity[*e].len()), *i));
        ranked
            .into_iter()
            .take(top_entity_limit)
            .map(|(_, e)| e.clone())
            .collect()
    } else {
        entity_order.iter().cloned().collect()
    };

    let mut index = EntityIndex::new();
    for entity in &entity_order {
        if kept.contains(entity) {
            index.register_entity(entity, &rows_by_entity[entity])?;
        }
    }
    for label in &label_order {
        let members: Vec<String> = members_by_label[label]
            .iter()
            .filter(|m| kept.contains(*m))
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }
        index.upsert_category(label, &members, CategoryOrigin::Discovered)?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entigram_inference::MockExtractor;

    fn occurrences() -> Vec<ExtractedEntity> {
        vec![
            ExtractedEntity::new("Covid", 0, "diseases"),
            ExtractedEntity::new("covid", 2, "diseases"),
            ExtractedEntity::new("flu", 1, "diseases"),
            ExtractedEntity::new("dylan", 3, "musicians"),
            ExtractedEntity::new("unclear", 1, "none"),
        ]
    }

    #[test]
    fn test_build_index_groups_by_label_and_drops_none() {
        let index = build_index(&occurrences(), defaults::TOP_ENTITY_LIMIT).unwrap();

        assert_eq!(index.category_count(), 2);
        assert_eq!(
            index.entities_in_category("diseases").unwrap(),
            vec!["covid", "flu"]
        );
        assert_eq!(
            index.entities_in_category("musicians").unwrap(),
            vec!["dylan"]
        );
        assert!(!index.contains_entity("unclear"));
        assert_eq!(
            index.rows_for_entity("covid").into_iter().collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_build_index_caps_entities_by_evidence() {
        let index = build_index(&occurrences(), 1).unwrap();

        // Only covid (two rows of evidence) survives the cap.
        assert_eq!(index.entity_count(), 1);
        assert!(index.contains_entity("covid"));
        assert_eq!(
            index.entities_in_category("diseases").unwrap(),
            vec!["covid"]
        );
        // Musicians lost its only member and is dropped entirely.
        assert!(!index.contains_category("musicians"));
    }

    #[tokio::test]
    async fn test_run_writes_dataset_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(
            &input,
            "text\ncovid case counts rose\nflu season started\ndylan played\n",
        )
        .unwrap();
        let output = dir.path().join("out");

        let extractor = MockExtractor::new().with_corpus_response(vec![
            ExtractedEntity::new("covid", 0, "diseases"),
            ExtractedEntity::new("flu", 1, "diseases"),
            ExtractedEntity::new("dylan", 2, "musicians"),
        ]);
        let config = PipelineConfig::new(&input, "text", &output);
        let pipeline = AnnotationPipeline::new(config, Arc::new(extractor));

        let index = pipeline.run().await.unwrap();
        assert_eq!(index.category_count(), 2);

        // The dataset directory is servable: snapshot plus annotated CSV.
        let snapshot = IndexSnapshot::load(&output).unwrap();
        assert_eq!(snapshot.histograms["diseases"], vec!["covid", "flu"]);
        let reloaded = Dataset::load_csv(
            &output.join(defaults::ANNOTATED_CSV_FILE),
            defaults::TEXT_COLUMN,
        )
        .unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.rows[2].text, "dylan played");
    }

    #[tokio::test]
    async fn test_run_recreates_existing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "text\ncovid spread\n").unwrap();
        let output = dir.path().join("out");
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("stale.txt"), "old").unwrap();

        let extractor = MockExtractor::new()
            .with_corpus_response(vec![ExtractedEntity::new("covid", 0, "diseases")]);
        let pipeline =
            AnnotationPipeline::new(PipelineConfig::new(&input, "text", &output), Arc::new(extractor));
        pipeline.run().await.unwrap();

        assert!(!output.join("stale.txt").exists());
        assert!(output.join(defaults::HISTOGRAMS_FILE).exists());
    }
}
