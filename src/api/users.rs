//! User API endpoints
//!
//! Self-service (the user themselves or an admin):
//! - GET/PUT/DELETE /api/users/{id}
//! - PUT /api/users/{id}/preferences
//!
//! Admin:
//! - GET/POST /api/admin/users
//! - GET/PUT/DELETE /api/admin/users/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde_json::{Map, Value};

use crate::api::extract::{Json, Path};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::DeletedResponse;
use crate::models::{UpdateUserInput, User};
use crate::services::{AdminUpdateUserInput, NewUserInput};

/// Build routes for signed-in users
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/preferences", put(update_preferences))
}

/// Build admin user routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(admin_get_user)
                .put(admin_update_user)
                .delete(admin_delete_user),
        )
}

fn ensure_can_manage(user: &User, id: i64) -> Result<(), ApiError> {
    if user.can_manage(id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only manage your own account"))
    }
}

async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    ensure_can_manage(&user, id)?;
    Ok(Json(state.user_service.get(id).await?))
}

/// Profile fields only; role and status need the admin endpoint
async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    ensure_can_manage(&user, id)?;
    Ok(Json(state.user_service.update_profile(id, input).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    ensure_can_manage(&user, id)?;
    state.user_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("User", id)))
}

async fn update_preferences(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(preferences): Json<Map<String, Value>>,
) -> Result<Json<User>, ApiError> {
    ensure_can_manage(&user, id)?;
    Ok(Json(
        state.user_service.update_preferences(id, preferences).await?,
    ))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list().await?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn admin_get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get(id).await?))
}

async fn admin_update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AdminUpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.admin_update(id, input).await?))
}

async fn admin_delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.user_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("User", id)))
}
