//! Wishlist API endpoints (signed-in users)
//!
//! - GET /api/wishlist - Saved listings, newest first
//! - DELETE /api/wishlist - Remove everything
//! - POST /api/wishlist/toggle - Save or unsave a listing
//! - GET /api/wishlist/count
//! - GET /api/wishlist/{listing_id} - Whether a listing is saved
//! - DELETE /api/wishlist/{listing_id}

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::api::extract::{Json, Path};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::DeletedResponse;
use crate::models::{WishlistEntryInput, WishlistItem};
use crate::services::ToggleResult;

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainsResponse {
    pub listing_id: i64,
    pub in_wishlist: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub message: String,
    pub removed: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).delete(clear))
        .route("/toggle", post(toggle))
        .route("/count", get(count))
        .route("/{listing_id}", get(contains).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<WishlistItem>>, ApiError> {
    Ok(Json(state.wishlist_service.list(user.id).await?))
}

async fn toggle(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(entry): Json<WishlistEntryInput>,
) -> Result<Json<ToggleResult>, ApiError> {
    Ok(Json(state.wishlist_service.toggle(user.id, entry).await?))
}

async fn count(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.wishlist_service.count(user.id).await?;
    Ok(Json(CountResponse { count }))
}

async fn contains(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(listing_id): Path<i64>,
) -> Result<Json<ContainsResponse>, ApiError> {
    let in_wishlist = state.wishlist_service.contains(user.id, listing_id).await?;
    Ok(Json(ContainsResponse {
        listing_id,
        in_wishlist,
    }))
}

async fn remove(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(listing_id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.wishlist_service.remove(user.id, listing_id).await?;
    Ok(Json(DeletedResponse::new("Wishlist item", listing_id)))
}

async fn clear(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = state.wishlist_service.clear(user.id).await?;
    Ok(Json(ClearedResponse {
        message: "Wishlist cleared".to_string(),
        removed,
    }))
}
