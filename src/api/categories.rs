//! Category API endpoints
//!
//! Public:
//! - GET /api/categories - Active categories with their active subcategories
//! - GET /api/blog/categories - Active categories
//!
//! Admin:
//! - GET/POST /api/admin/categories, GET/PUT/DELETE /api/admin/categories/{id}
//! - GET/POST /api/admin/subcategories, GET/PUT/DELETE /api/admin/subcategories/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::extract::{Json, Path};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::DeletedResponse;
use crate::models::{
    Category, CategoryWithSubcategories, CreateCategoryInput, CreateSubcategoryInput,
    Subcategory, UpdateCategoryInput,
};

/// GET /api/categories
pub async fn category_tree(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithSubcategories>>, ApiError> {
    Ok(Json(state.category_service.public_tree().await?))
}

/// GET /api/blog/categories
pub async fn active_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.category_service.active_categories().await?))
}

/// Build admin category routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// Build admin subcategory routes
pub fn admin_subcategory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subcategories).post(create_subcategory))
        .route(
            "/{id}",
            get(get_subcategory)
                .put(update_subcategory)
                .delete(delete_subcategory),
        )
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.category_service.list().await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.category_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.get(id).await?))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.update(id, input).await?))
}

/// Subcategories of the category go with it
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.category_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("Category", id)))
}

async fn list_subcategories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Subcategory>>, ApiError> {
    Ok(Json(state.category_service.list_subcategories().await?))
}

async fn create_subcategory(
    State(state): State<AppState>,
    Json(input): Json<CreateSubcategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let subcategory = state.category_service.create_subcategory(input).await?;
    Ok((StatusCode::CREATED, Json(subcategory)))
}

async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Subcategory>, ApiError> {
    Ok(Json(state.category_service.get_subcategory(id).await?))
}

async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<Subcategory>, ApiError> {
    Ok(Json(state.category_service.update_subcategory(id, input).await?))
}

async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.category_service.delete_subcategory(id).await?;
    Ok(Json(DeletedResponse::new("Subcategory", id)))
}
