//! Article API endpoints
//!
//! - GET /api/articles - Published articles (`?type=&featured=`)
//! - GET /api/articles/{id} - One published article, counts a view
//! - GET /api/article-categories
//! - GET/POST /api/admin/articles
//! - GET/PUT/DELETE /api/admin/articles/{id}
//! - PATCH /api/admin/articles/{id}/toggle-publish
//! - GET/POST /api/admin/article-categories
//! - GET/PUT/DELETE /api/admin/article-categories/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};

use crate::api::extract::{Json, Path, Query};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::DeletedResponse;
use crate::models::{
    Article, ArticleCategory, ArticleFilter, CreateArticleCategoryInput, CreateArticleInput,
    UpdateArticleCategoryInput, UpdateArticleInput,
};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{id}", get(view_article))
}

/// GET /api/article-categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleCategory>>, ApiError> {
    Ok(Json(state.article_service.list_categories().await?))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route(
            "/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/{id}/toggle-publish", patch(toggle_publish))
}

pub fn admin_category_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_published(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.article_service.list_published(&filter).await?))
}

async fn view_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.view(id).await?))
}

async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.article_service.list().await?))
}

async fn create_article(
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state.article_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get(id).await?))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateArticleInput>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.update(id, input).await?))
}

async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.toggle_publish(id).await?))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.article_service.delete(id).await?;
    Ok(Json(DeletedResponse::new("Article", id)))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateArticleCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.article_service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleCategory>, ApiError> {
    Ok(Json(state.article_service.get_category(id).await?))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateArticleCategoryInput>,
) -> Result<Json<ArticleCategory>, ApiError> {
    Ok(Json(state.article_service.update_category(id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.article_service.delete_category(id).await?;
    Ok(Json(DeletedResponse::new("Article category", id)))
}
