//! entigram-annotate - run the offline annotation pipeline.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use entigram_inference::OllamaBackend;
use entigram_pipeline::{AnnotationPipeline, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from_env().context("pipeline configuration")?;
    let extractor = Arc::new(OllamaBackend::from_env());

    let index = AnnotationPipeline::new(config, extractor)
        .run()
        .await
        .context("annotation pipeline")?;

    tracing::info!(
        category_count = index.category_count(),
        entity_count = index.entity_count(),
        "Annotation complete"
    );
    Ok(())
}
