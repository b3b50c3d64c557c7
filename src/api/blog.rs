//! Blog and video API endpoints
//!
//! Public:
//! - GET /api/blog/posts?category= - Published posts
//! - GET /api/blog/posts/{slug} - Published post (counts a view)
//! - GET /api/videos - Active videos
//!
//! Admin:
//! - GET/POST /api/admin/blog/posts, GET/PUT/DELETE /api/admin/blog/posts/{id}
//! - PATCH /api/admin/blog/posts/{id}/toggle-publish
//! - GET/POST /api/admin/videos, GET/PUT/DELETE /api/admin/videos/{id}
//! - PATCH /api/admin/videos/{id}/toggle-active

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;

use crate::api::extract::{Json, Path, Query};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::DeletedResponse;
use crate::models::{
    BlogPost, CreateBlogPostInput, CreateVideoInput, UpdateBlogPostInput, UpdateVideoInput, Video,
};

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
}

/// Build public blog routes, nested under `/blog`
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_published))
        .route("/posts/{slug}", get(view_post))
}

/// Build admin post routes
pub fn admin_post_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/toggle-publish", patch(toggle_publish))
}

/// Build admin video routes
pub fn admin_video_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(create_video))
        .route("/{id}", get(get_video).put(update_video).delete(delete_video))
        .route("/{id}/toggle-active", patch(toggle_video))
}

async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    Ok(Json(state.blog_service.list_published(category).await?))
}

async fn view_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.view_by_slug(&slug).await?))
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.blog_service.list_posts().await?))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreateBlogPostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.blog_service.create_post(input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.get_post(id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateBlogPostInput>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.update_post(id, input).await?))
}

async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.blog_service.toggle_publish(id).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.blog_service.delete_post(id).await?;
    Ok(Json(DeletedResponse::new("Blog post", id)))
}

/// GET /api/videos
pub async fn list_active_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<Video>>, ApiError> {
    Ok(Json(state.blog_service.list_active_videos().await?))
}

async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<Video>>, ApiError> {
    Ok(Json(state.blog_service.list_videos().await?))
}

async fn create_video(
    State(state): State<AppState>,
    Json(input): Json<CreateVideoInput>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state.blog_service.create_video(input).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Video>, ApiError> {
    Ok(Json(state.blog_service.get_video(id).await?))
}

async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateVideoInput>,
) -> Result<Json<Video>, ApiError> {
    Ok(Json(state.blog_service.update_video(id, input).await?))
}

async fn toggle_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Video>, ApiError> {
    Ok(Json(state.blog_service.toggle_video(id).await?))
}

async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse<i64>>, ApiError> {
    state.blog_service.delete_video(id).await?;
    Ok(Json(DeletedResponse::new("Video", id)))
}
