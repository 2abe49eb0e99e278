//! Ollama collaborator backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use entigram_core::{
    defaults, CategorySearcher, EntityExtractor, Error, ExtractedEntity, Result, SourceRow,
};

use crate::prompts;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = defaults::OLLAMA_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::GEN_MODEL;

/// Ollama-backed extraction and category-search collaborator.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    gen_model: String,
    gen_timeout_secs: u64,
}

impl OllamaBackend {
    /// Create a new Ollama backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_OLLAMA_URL.to_string(),
            DEFAULT_GEN_MODEL.to_string(),
        )
    }

    /// Create a new Ollama backend with custom configuration.
    pub fn with_config(base_url: String, gen_model: String) -> Self {
        let gen_timeout_secs = std::env::var("ENTIGRAM_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(gen_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            "Initializing Ollama backend: url={}, gen={}",
            base_url, gen_model
        );

        Self {
            client,
            base_url,
            gen_model,
            gen_timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OLLAMA_BASE` | `http://127.0.0.1:11434` |
    /// | `OLLAMA_GEN_MODEL` | `gpt-oss:20b` |
    /// | `ENTIGRAM_GEN_TIMEOUT_SECS` | `120` |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let gen_model =
            std::env::var("OLLAMA_GEN_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());
        Self::with_config(base_url, gen_model)
    }

    /// Run one generation request via the `/api/chat` endpoint.
    ///
    /// `/api/chat` separates thinking/reasoning from the final response
    /// content, which matters for thinking models where `/api/generate`
    /// leaks reasoning into the response.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest {
            model: self.gen_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            think: Some(false),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("Invalid response body: {e}")))?;

        debug!(
            model = %self.gen_model,
            prompt_len = prompt.len(),
            response_len = chat.message.content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(chat.message.content)
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Disable thinking/reasoning for models that support it.
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
}

/// Response from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[async_trait]
impl EntityExtractor for OllamaBackend {
    #[instrument(skip(self, rows), fields(subsystem = "inference", component = "ollama", op = "extract_and_label", model = %self.gen_model, row_count = rows.len()))]
    async fn extract_and_label(
        &self,
        rows: &[SourceRow],
        query: Option<&str>,
    ) -> Result<Vec<ExtractedEntity>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let rows = if rows.len() > defaults::PROMPT_ROW_LIMIT {
            warn!(
                row_count = rows.len(),
                limit = defaults::PROMPT_ROW_LIMIT,
                "Truncating rows for extraction prompt"
            );
            &rows[..defaults::PROMPT_ROW_LIMIT]
        } else {
            rows
        };

        let prompt = prompts::extraction_prompt(rows, query);
        let response = self.generate(&prompt).await?;
        let extracted = prompts::parse_extraction_response(&response);
        debug!(entity_count = extracted.len(), "Extraction parsed");
        Ok(extracted)
    }
}

#[async_trait]
impl CategorySearcher for OllamaBackend {
    #[instrument(skip(self, known), fields(subsystem = "inference", component = "ollama", op = "search_categories", model = %self.gen_model, query = %query))]
    async fn search_categories(&self, query: &str, known: &[String]) -> Result<Vec<String>> {
        if known.is_empty() {
            return Ok(vec![]);
        }

        let prompt = prompts::search_prompt(query, known);
        let response = self.generate(&prompt).await?;
        // Keep only names the index actually knows; the model may invent.
        let results: Vec<String> = prompts::parse_name_list(&response)
            .into_iter()
            .filter(|name| known.iter().any(|k| k == name))
            .collect();
        debug!(result_count = results.len(), "Category search parsed");
        Ok(results)
    }
}
