//! # entigram-api
//!
//! HTTP server exposing the viewer transport boundary over dataset
//! directories produced by the annotation pipeline. The router lives here
//! so integration tests can drive it directly; `main.rs` is the thin
//! binary.

pub mod handlers;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use entigram_core::{
    defaults, CategorySearcher, EntityExtractor, EntityIndex, Error, IndexSnapshot, Result,
    SourceRow,
};
use entigram_engine::{CategorySynthesizer, SearchProjection};
use entigram_pipeline::Dataset;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// One loaded dataset directory: its index, its rows, and its location.
pub struct DatasetSession {
    pub dir: PathBuf,
    pub index: RwLock<EntityIndex>,
    pub rows: Vec<SourceRow>,
}

/// Shared application state: the dataset root, the collaborators, and the
/// per-directory session cache.
#[derive(Clone)]
pub struct AppState {
    data_root: PathBuf,
    synthesizer: Arc<CategorySynthesizer>,
    projection: Arc<SearchProjection>,
    sessions: Arc<RwLock<HashMap<String, Arc<DatasetSession>>>>,
}

impl AppState {
    pub fn new(
        data_root: impl Into<PathBuf>,
        extractor: Arc<dyn EntityExtractor>,
        searcher: Arc<dyn CategorySearcher>,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            synthesizer: Arc::new(CategorySynthesizer::new(extractor)),
            projection: Arc::new(SearchProjection::new(searcher)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn synthesizer(&self) -> &CategorySynthesizer {
        &self.synthesizer
    }

    pub fn projection(&self) -> &SearchProjection {
        &self.projection
    }

    /// Resolve a client-supplied dataset dir under the data root.
    /// Absolute paths and parent-dir components are rejected.
    fn resolve_dir(&self, dir: &str) -> Result<PathBuf> {
        let rel = Path::new(dir);
        if dir.is_empty()
            || rel.is_absolute()
            || rel.components().any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::InvalidInput(format!("invalid dataset dir {dir:?}")));
        }
        Ok(self.data_root.join(rel))
    }

    /// Fetch or lazily load the session for a dataset directory.
    pub async fn session(&self, dir: &str) -> Result<Arc<DatasetSession>> {
        if let Some(session) = self.sessions.read().await.get(dir) {
            return Ok(session.clone());
        }

        let path = self.resolve_dir(dir)?;
        if !path.join(defaults::HISTOGRAMS_FILE).exists() {
            return Err(Error::NotFound(format!("dataset {dir:?}")));
        }
        let index = IndexSnapshot::load(&path)?.into_index()?;
        let rows = Dataset::load_csv(
            &path.join(defaults::ANNOTATED_CSV_FILE),
            defaults::TEXT_COLUMN,
        )?
        .rows;
        tracing::info!(
            dataset_dir = %dir,
            entity_count = index.entity_count(),
            row_count = rows.len(),
            "Loaded dataset session"
        );

        let session = Arc::new(DatasetSession {
            dir: path,
            index: RwLock::new(index),
            rows,
        });
        let mut sessions = self.sessions.write().await;
        Ok(sessions.entry(dir.to_string()).or_insert(session).clone())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// HTTP-facing error mapping for core errors.
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::CategoryNotFound(key) => ApiError::NotFound(format!("Category {key} not found")),
            Error::InvalidEntity(msg) | Error::InvalidInput(msg) | Error::Dataset(msg) => {
                ApiError::BadRequest(msg)
            }
            Error::EmptySelection => ApiError::BadRequest(err.to_string()),
            Error::Extraction(msg) => ApiError::BadGateway(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/get_histograms", get(handlers::get_histograms))
        .route("/get_data", get(handlers::get_data))
        .route("/search_histograms", get(handlers::search_histograms))
        .route("/make_new_histogram", get(handlers::make_new_histogram))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(AllowOrigin::any()))
        .with_state(state)
}
