//! Search API endpoints
//!
//! - GET /api/search?q=&limit=&mode=&sources=&category= - Keyword search
//! - GET /api/search/sources - Groups a search can target

use axum::{
    extract::State,
    routing::get,
    Router,
};

use crate::api::extract::{Json, Query};
use crate::api::middleware::{ApiError, AppState};
use crate::services::search::SourceInfo;
use crate::services::{SearchQuery, SearchResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/sources", get(sources))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    Ok(Json(state.search_service.search(&query).await?))
}

async fn sources(State(state): State<AppState>) -> Json<Vec<SourceInfo>> {
    Json(state.search_service.sources())
}
