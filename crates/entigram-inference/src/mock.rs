//! Mock collaborators for deterministic testing.
//!
//! Scripted implementations of [`EntityExtractor`] and [`CategorySearcher`]
//! with a call log for assertions. Enable with the `mock` feature from
//! downstream dev-dependencies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use entigram_core::{
    CategorySearcher, EntityExtractor, Error, ExtractedEntity, Result, SourceRow,
};

/// One logged collaborator call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub query: Option<String>,
    pub input_count: usize,
}

#[derive(Clone, Default)]
struct ExtractorConfig {
    /// Scripted answers keyed by query (`None` = unscoped corpus pass).
    responses: HashMap<Option<String>, Vec<ExtractedEntity>>,
    fail: bool,
    latency_ms: u64,
}

/// Scripted extraction collaborator.
#[derive(Clone, Default)]
pub struct MockExtractor {
    config: Arc<ExtractorConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the answer for an unscoped (whole-corpus) extraction pass.
    pub fn with_corpus_response(mut self, entities: Vec<ExtractedEntity>) -> Self {
        Arc::make_mut(&mut self.config).responses.insert(None, entities);
        self
    }

    /// Script the answer for a query-scoped extraction pass.
    pub fn with_response(
        mut self,
        query: impl Into<String>,
        entities: Vec<ExtractedEntity>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(Some(query.into()), entities);
        self
    }

    /// Make every call fail with an extraction error.
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Simulate collaborator latency.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// All logged calls, for assertions.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of extraction calls issued.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

#[async_trait]
impl EntityExtractor for MockExtractor {
    async fn extract_and_label(
        &self,
        rows: &[SourceRow],
        query: Option<&str>,
    ) -> Result<Vec<ExtractedEntity>> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: "extract_and_label".to_string(),
            query: query.map(str::to_string),
            input_count: rows.len(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.config.fail {
            return Err(Error::Extraction("scripted failure".to_string()));
        }

        Ok(self
            .config
            .responses
            .get(&query.map(str::to_string))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone, Default)]
struct SearcherConfig {
    responses: HashMap<String, Vec<String>>,
    fail: bool,
}

/// Scripted category-search collaborator.
#[derive(Clone, Default)]
pub struct MockSearcher {
    config: Arc<SearcherConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the categories returned for a query.
    pub fn with_results(mut self, query: impl Into<String>, results: Vec<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(query.into(), results);
        self
    }

    /// Make every call fail.
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

#[async_trait]
impl CategorySearcher for MockSearcher {
    async fn search_categories(&self, query: &str, known: &[String]) -> Result<Vec<String>> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: "search_categories".to_string(),
            query: Some(query.to_string()),
            input_count: known.len(),
        });

        if self.config.fail {
            return Err(Error::Extraction("scripted failure".to_string()));
        }

        Ok(self.config.responses.get(query).cloned().unwrap_or_default())
    }
}
