//! # entigram-pipeline
//!
//! The offline annotation stage of entigram: load a CSV dataset, run one
//! extraction pass through the language-model collaborator, build the
//! entity index, and persist the dataset directory
//! (`histograms.json` + annotated `data.csv`) that the viewer serves.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use entigram_inference::OllamaBackend;
//! use entigram_pipeline::{AnnotationPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("reviews.csv", "text", "datasets/reviews");
//! let pipeline = AnnotationPipeline::new(config, Arc::new(OllamaBackend::from_env()));
//! let index = pipeline.run().await?;
//! ```

pub mod dataset;
pub mod pipeline;

// Re-export core types
pub use entigram_core::*;

pub use dataset::Dataset;
pub use pipeline::{build_index, AnnotationPipeline, PipelineConfig};
