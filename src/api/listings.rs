//! Listing API endpoints
//!
//! One set of handlers serves every listing kind; the kind is the first
//! path segment after `/listings` (e.g. `/listings/rental-listings/3`).
//!
//! Public:
//! - GET /api/listings/{kind} - Active listings of a kind
//! - GET /api/listings/{kind}/{id} - Active listing detail (counts a view)
//!
//! Admin:
//! - GET/POST /api/admin/listings/{kind}
//! - GET/PUT/DELETE /api/admin/listings/{kind}/{id}
//! - PATCH /api/admin/listings/{kind}/{id}/toggle-active
//! - PATCH /api/admin/listings/{kind}/{id}/toggle-featured

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};

use crate::api::extract::{Json, Path, Query};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::DeletedResponse;
use crate::models::{CreateListingInput, Listing, ListingFilter, ListingKind, UpdateListingInput};

/// Build public listing routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(list_public))
        .route("/{kind}/{id}", get(view_listing))
}

/// Build admin listing routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(list_all).post(create_listing))
        .route(
            "/{kind}/{id}",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .route("/{kind}/{id}/toggle-active", patch(toggle_active))
        .route("/{kind}/{id}/toggle-featured", patch(toggle_featured))
}

/// Unknown kinds are answered like a missing resource
fn parse_kind(slug: &str) -> Result<ListingKind, ApiError> {
    slug.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown listing category: {}", slug)))
}

/// GET /api/listings/{kind}
async fn list_public(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(filter): Query<ListingFilter>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.list_public(kind, &filter).await?))
}

/// GET /api/listings/{kind}/{id}
async fn view_listing(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Listing>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.view(kind, id).await?))
}

/// GET /api/admin/listings/{kind}
async fn list_all(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(filter): Query<ListingFilter>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.list(kind, &filter).await?))
}

/// POST /api/admin/listings/{kind}
///
/// The owner defaults to the signed-in admin when the body names none.
async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(kind): Path<String>,
    Json(mut input): Json<CreateListingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    if input.user_id.is_none() {
        input.user_id = Some(user.id);
        input.role.get_or_insert_with(|| user.role.to_string());
    }
    let listing = state.listing_service.create(kind, input).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/admin/listings/{kind}/{id}
async fn get_listing(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Listing>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.get(kind, id).await?))
}

/// PUT /api/admin/listings/{kind}/{id}
async fn update_listing(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Json(input): Json<UpdateListingInput>,
) -> Result<Json<Listing>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.update(kind, id, input).await?))
}

/// DELETE /api/admin/listings/{kind}/{id}
async fn delete_listing(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    let kind = parse_kind(&kind)?;
    state.listing_service.delete(kind, id).await?;
    Ok(Json(DeletedResponse::new("Listing", id)))
}

/// PATCH /api/admin/listings/{kind}/{id}/toggle-active
async fn toggle_active(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Listing>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.toggle_active(kind, id).await?))
}

/// PATCH /api/admin/listings/{kind}/{id}/toggle-featured
async fn toggle_featured(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Listing>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.listing_service.toggle_featured(kind, id).await?))
}
