//! # synapse-api
//!
//! HTTP surface for synapse: item capture, listing, deletion and hybrid
//! search over JSON.
//!
//! The router is built from an [`AppState`] so the binary can wire real
//! stores while tests wire in-memory ones.

pub mod error;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

use synapse_core::defaults::SEARCH_LIMIT;
use synapse_core::{CapturedInput, Item, SearchResult};
use synapse_ingest::IngestionPipeline;
use synapse_search::HybridSearchEngine;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestionPipeline,
    pub search: HybridSearchEngine,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/:id", get(get_item).delete(delete_item))
        .route("/api/search", get(search_items))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn create_item(
    State(state): State<AppState>,
    input: Result<Json<CapturedInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = input?;
    let item = state.pipeline.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.pipeline.list_items().await?))
}

async fn get_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Item>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.pipeline.get_item(id).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.pipeline.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

async fn search_items(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(SEARCH_LIMIT);
    debug!(subsystem = "api", query = %params.q, limit, "Search request");

    let results = state.search.search(&params.q, limit).await?;
    Ok(Json(SearchResponse {
        total: results.len(),
        query: params.q,
        results,
    }))
}
