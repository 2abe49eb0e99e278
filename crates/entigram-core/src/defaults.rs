//! Centralized default constants for entigram.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates and binaries reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// SEARCH
// =============================================================================

/// Trailing-edge debounce applied before dispatching a search (milliseconds).
/// Keystroke storms coalesce into one collaborator call.
pub const SEARCH_DEBOUNCE_MS: u64 = 500;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer capacity for the index event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// PIPELINE
// =============================================================================

/// Maximum number of distinct entities kept by the annotation pipeline,
/// ranked by total row evidence. Bounds index size on noisy corpora.
pub const TOP_ENTITY_LIMIT: usize = 2000;

/// Column name rows are normalized to after dataset loading.
pub const TEXT_COLUMN: &str = "text";

// =============================================================================
// SNAPSHOT FILES
// =============================================================================

/// Persisted index snapshot file name within a dataset directory.
pub const HISTOGRAMS_FILE: &str = "histograms.json";

/// Annotated dataset file name within a dataset directory.
/// Row order equals row id order.
pub const ANNOTATED_CSV_FILE: &str = "data.csv";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model.
pub const GEN_MODEL: &str = "gpt-oss:20b";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Maximum number of rows included in a single extraction prompt.
pub const PROMPT_ROW_LIMIT: usize = 200;

// =============================================================================
// API
// =============================================================================

/// Default HTTP listen port.
pub const API_PORT: u16 = 8080;
