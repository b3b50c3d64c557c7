//! FAQ, agency and location endpoints
//!
//! - GET /api/faqs - Active FAQs (`?category=`)
//! - GET /api/agencies
//! - GET /api/locations
//! - GET/POST /api/admin/{faqs,agencies,locations}
//! - GET/PUT/DELETE /api/admin/{faqs,agencies,locations}/{id}

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde::Deserialize;

use crate::api::extract::{Json, Path, Query};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::DeletedResponse;
use crate::models::{
    Agency, CreateAgencyInput, CreateFaqInput, CreateLocationInput, Faq, Location,
    UpdateAgencyInput, UpdateFaqInput, UpdateLocationInput,
};

#[derive(Debug, Default, Deserialize)]
pub struct FaqQuery {
    pub category: Option<String>,
}

/// GET /api/faqs
pub async fn list_active_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> Result<Json<Vec<Faq>>, ApiError> {
    Ok(Json(
        state
            .directory_service
            .list_active_faqs(query.category.as_deref())
            .await?,
    ))
}

/// GET /api/agencies
pub async fn list_agencies(State(state): State<AppState>) -> Result<Json<Vec<Agency>>, ApiError> {
    Ok(Json(state.directory_service.list_agencies().await?))
}

/// GET /api/locations
pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(state.directory_service.list_locations().await?))
}

pub fn admin_faq_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_faqs).post(create_faq))
        .route("/{id}", get(get_faq).put(update_faq).delete(delete_faq))
}

pub fn admin_agency_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agencies).post(create_agency))
        .route(
            "/{id}",
            get(get_agency).put(update_agency).delete(delete_agency),
        )
}

pub fn admin_location_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
}

async fn list_faqs(State(state): State<AppState>) -> Result<Json<Vec<Faq>>, ApiError> {
    Ok(Json(state.directory_service.list_faqs().await?))
}

async fn create_faq(
    State(state): State<AppState>,
    Json(input): Json<CreateFaqInput>,
) -> Result<impl IntoResponse, ApiError> {
    let faq = state.directory_service.create_faq(input).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

async fn get_faq(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Faq>, ApiError> {
    Ok(Json(state.directory_service.get_faq(id).await?))
}

async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateFaqInput>,
) -> Result<Json<Faq>, ApiError> {
    Ok(Json(state.directory_service.update_faq(id, input).await?))
}

async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.directory_service.delete_faq(id).await?;
    Ok(Json(DeletedResponse::new("FAQ", id)))
}

async fn create_agency(
    State(state): State<AppState>,
    Json(input): Json<CreateAgencyInput>,
) -> Result<impl IntoResponse, ApiError> {
    let agency = state.directory_service.create_agency(input).await?;
    Ok((StatusCode::CREATED, Json(agency)))
}

async fn get_agency(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Agency>, ApiError> {
    Ok(Json(state.directory_service.get_agency(id).await?))
}

async fn update_agency(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateAgencyInput>,
) -> Result<Json<Agency>, ApiError> {
    Ok(Json(state.directory_service.update_agency(id, input).await?))
}

async fn delete_agency(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.directory_service.delete_agency(id).await?;
    Ok(Json(DeletedResponse::new("Agency", id)))
}

async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<CreateLocationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state.directory_service.create_location(input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(state.directory_service.get_location(id).await?))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateLocationInput>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(state.directory_service.update_location(id, input).await?))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.directory_service.delete_location(id).await?;
    Ok(Json(DeletedResponse::new("Location", id)))
}
