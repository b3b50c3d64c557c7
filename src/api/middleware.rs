//! API middleware
//!
//! Contains:
//! - Request statistics (lock-free counters)
//! - Shared application state
//! - The JSON error type and its conversions from service errors
//! - Authentication (session token) and admin authorization

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::Cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxAgencyRepository, SqlxArticleCategoryRepository, SqlxArticleRepository,
    SqlxBlogPostRepository, SqlxCategoryRepository, SqlxContactRepository, SqlxFaqRepository,
    SqlxListingRepository, SqlxLocationRepository, SqlxSessionRepository, SqlxSliderRepository,
    SqlxUserRepository, SqlxVideoRepository, SqlxWishlistRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    ArticleService, ArticleServiceError, BlogService, BlogServiceError, CategoryService,
    CategoryServiceError, ContactService, ContactServiceError, DirectoryService,
    DirectoryServiceError, ListingService, ListingServiceError, SearchService, SearchServiceError,
    SliderService, SliderServiceError, UserService, UserServiceError, WishlistService,
    WishlistServiceError,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Sum of response times in microseconds
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.total_response_time_us.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub search_service: Arc<SearchService>,
    pub category_service: Arc<CategoryService>,
    pub slider_service: Arc<SliderService>,
    pub blog_service: Arc<BlogService>,
    pub wishlist_service: Arc<WishlistService>,
    pub contact_service: Arc<ContactService>,
    pub article_service: Arc<ArticleService>,
    pub directory_service: Arc<DirectoryService>,
    pub upload_config: Arc<crate::config::UploadConfig>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool
    pub fn build(pool: DynDatabasePool, cache: Arc<Cache>, config: &Config) -> Self {
        let listing_repo = SqlxListingRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let blog_repo = SqlxBlogPostRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool.clone());

        let category_service = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
        let user_service = Arc::new(UserService::with_auth_config(
            user_repo.clone(),
            SqlxSessionRepository::boxed(pool.clone()),
            category_service.clone(),
            &config.auth,
        ));
        let search_service = Arc::new(SearchService::new(
            listing_repo.clone(),
            blog_repo.clone(),
            category_repo,
        ));

        Self {
            user_service,
            listing_service: Arc::new(ListingService::new(listing_repo)),
            search_service,
            category_service,
            slider_service: Arc::new(SliderService::new(
                SqlxSliderRepository::boxed(pool.clone()),
                cache,
            )),
            blog_service: Arc::new(BlogService::new(
                blog_repo,
                SqlxVideoRepository::boxed(pool.clone()),
            )),
            wishlist_service: Arc::new(WishlistService::new(SqlxWishlistRepository::boxed(
                pool.clone(),
            ))),
            contact_service: Arc::new(ContactService::new(SqlxContactRepository::boxed(
                pool.clone(),
            ))),
            article_service: Arc::new(ArticleService::new(
                SqlxArticleRepository::boxed(pool.clone()),
                SqlxArticleCategoryRepository::boxed(pool.clone()),
                user_repo,
            )),
            directory_service: Arc::new(DirectoryService::new(
                SqlxFaqRepository::boxed(pool.clone()),
                SqlxAgencyRepository::boxed(pool.clone()),
                SqlxLocationRepository::boxed(pool.clone()),
            )),
            upload_config: Arc::new(config.upload.clone()),
            request_stats: Arc::new(RequestStats::new()),
            pool,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMIT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and answer with a generic 500
    pub(crate) fn internal(cause: impl Display) -> Self {
        tracing::error!("Internal error: {:#}", cause);
        Self::internal_error("Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<ListingServiceError> for ApiError {
    fn from(e: ListingServiceError) -> Self {
        match e {
            ListingServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ListingServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ListingServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<SearchServiceError> for ApiError {
    fn from(e: SearchServiceError) -> Self {
        match e {
            SearchServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            CategoryServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            CategoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CategoryServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<SliderServiceError> for ApiError {
    fn from(e: SliderServiceError) -> Self {
        match e {
            SliderServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            SliderServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SliderServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            BlogServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            BlogServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            BlogServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            UserServiceError::RateLimited(msg) => ApiError::rate_limited(msg),
            UserServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<WishlistServiceError> for ApiError {
    fn from(e: WishlistServiceError) -> Self {
        match e {
            WishlistServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            WishlistServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            WishlistServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ArticleServiceError::DuplicateSlug(_) => ApiError::conflict(e.to_string()),
            ArticleServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ArticleServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<DirectoryServiceError> for ApiError {
    fn from(e: DirectoryServiceError) -> Self {
        match e {
            DirectoryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            DirectoryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            DirectoryServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(e: ContactServiceError) -> Self {
        match e {
            ContactServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            ContactServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ContactServiceError::InternalError(e) => ApiError::internal(e),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Session token from `Authorization: Bearer` or the `session` cookie.
/// The header wins when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

pub fn extract_session_token(request: &Request) -> Option<String> {
    session_token(request.headers())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware; runs after `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Records request count and response time
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}
