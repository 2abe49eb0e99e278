//! HTTP handlers for the viewer endpoints.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use entigram_core::{defaults, CategoryOrigin, RowId};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct DirQuery {
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: String,
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct MakeHistogramQuery {
    pub new_histogram_name: String,
    pub dir: String,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /get_histograms?dir=D`: every category with its entities in live
/// count order, plus the row ids per entity.
pub async fn get_histograms(
    State(state): State<AppState>,
    Query(query): Query<DirQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session(&query.dir).await?;
    let index = session.index.read().await;

    let mut histograms: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for key in index.category_keys() {
        histograms.insert(key.clone(), index.entities_in_category(&key)?);
    }
    let mut ids_by_entity: BTreeMap<String, Vec<RowId>> = BTreeMap::new();
    for entity in index.entities_in_discovery_order() {
        let rows = index.rows_for_entity(&entity).into_iter().collect();
        ids_by_entity.insert(entity, rows);
    }

    Ok(Json(serde_json::json!({
        "histograms": histograms,
        "ids_by_entity": ids_by_entity,
    })))
}

/// `GET /get_data?dir=D`: the annotated CSV, row order = row id order.
pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DirQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session(&query.dir).await?;
    let csv_data = std::fs::read_to_string(session.dir.join(defaults::ANNOTATED_CSV_FILE))
        .map_err(entigram_core::Error::from)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv_data))
}

/// `GET /search_histograms?search=S&dir=D`: the projected category list
/// for a search string.
pub async fn search_histograms(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session(&query.dir).await?;
    let index = session.index.read().await;
    let search_results = state.projection().project(&index, &query.search).await?;

    Ok(Json(serde_json::json!({
        "search_results": search_results,
    })))
}

/// `GET /make_new_histogram?new_histogram_name=N&dir=D`: synthesize a
/// category for the query and commit it as user-created when it found
/// entities. An empty synthesis responds with an empty list and leaves the
/// index untouched.
pub async fn make_new_histogram(
    State(state): State<AppState>,
    Query(query): Query<MakeHistogramQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let name = query.new_histogram_name;
    let session = state.session(&query.dir).await?;

    let mut index = session.index.write().await;
    let category = state
        .synthesizer()
        .synthesize(&name, &session.rows, &mut index)
        .await?;
    if !category.is_empty() {
        index.upsert_category(&name, &category.entities, CategoryOrigin::UserCreated)?;
    }

    let mut body = serde_json::Map::new();
    body.insert(name, serde_json::json!(category.entities));
    Ok(Json(serde_json::Value::Object(body)))
}
