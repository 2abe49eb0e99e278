//! Structured logging field name constants for entigram.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (rows, entities) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "engine", "inference", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "synthesizer", "projection", "ollama", "annotate"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "synthesize", "project", "extract_and_label", "commit"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Dataset directory being served or written.
pub const DATASET_DIR: &str = "dataset_dir";

/// Category key being operated on.
pub const CATEGORY: &str = "category";

/// Entity name being operated on.
pub const ENTITY: &str = "entity";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or projection.
pub const RESULT_COUNT: &str = "result_count";

/// Number of entities processed or returned.
pub const ENTITY_COUNT: &str = "entity_count";

/// Number of rows processed.
pub const ROW_COUNT: &str = "row_count";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
