//! Hero slider API endpoints
//!
//! - GET /api/sliders - Active sliders, in display order
//! - GET/POST /api/admin/sliders
//! - GET/PUT/DELETE /api/admin/sliders/{id}
//! - PATCH /api/admin/sliders/{id}/toggle-active

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};

use crate::api::extract::{Json, Path};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::DeletedResponse;
use crate::models::{CreateSliderInput, Slider, UpdateSliderInput};

/// GET /api/sliders
pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Slider>>, ApiError> {
    Ok(Json(state.slider_service.list_active().await?))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sliders).post(create_slider))
        .route(
            "/{id}",
            get(get_slider).put(update_slider).delete(delete_slider),
        )
        .route("/{id}/toggle-active", patch(toggle_slider))
}

async fn list_sliders(State(state): State<AppState>) -> Result<Json<Vec<Slider>>, ApiError> {
    Ok(Json(state.slider_service.list().await?))
}

async fn create_slider(
    State(state): State<AppState>,
    Json(input): Json<CreateSliderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let slider = state.slider_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(slider)))
}

async fn get_slider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Slider>, ApiError> {
    Ok(Json(state.slider_service.get(id).await?))
}

async fn update_slider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSliderInput>,
) -> Result<Json<Slider>, ApiError> {
    Ok(Json(state.slider_service.update(id, input).await?))
}

async fn toggle_slider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Slider>, ApiError> {
    Ok(Json(state.slider_service.toggle_active(id).await?))
}

async fn delete_slider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.slider_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("Slider", id)))
}
