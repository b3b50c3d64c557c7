//! Contact form and newsletter endpoints
//!
//! Public:
//! - POST /api/contact
//! - POST /api/newsletter/subscribe
//!
//! Admin:
//! - GET /api/admin/contact-messages
//! - GET/DELETE /api/admin/contact-messages/{id}
//! - PATCH /api/admin/contact-messages/{id}/read

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;

use crate::api::extract::{Json, Path};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{DeletedResponse, MessageResponse};
use crate::models::{ContactMessage, CreateContactMessageInput};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<CreateContactMessageInput>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.contact_service.submit(input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/newsletter/subscribe
///
/// Subscribing twice is not an error.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let added = state.contact_service.subscribe(&body.email).await?;
    let message = if added {
        "Subscribed successfully"
    } else {
        "Already subscribed"
    };
    Ok(Json(MessageResponse::new(message)))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages))
        .route("/{id}", get(get_message).delete(delete_message))
        .route("/{id}/read", patch(mark_read))
}

async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list().await?))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.get(id).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.mark_read(id).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.contact_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("Message", id)))
}
