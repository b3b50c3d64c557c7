//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api`:
//! - Listings (public browse, admin CRUD per listing kind)
//! - Search across listings, blog posts and categories
//! - Categories, sliders, blog posts and videos
//! - Auth, users and the wishlist
//! - Articles, FAQs, agencies and locations
//! - Contact form, newsletter, stats and uploads
//!
//! Uploaded media are served from `/uploads`.

pub mod articles;
pub mod auth;
pub mod blog;
pub mod categories;
pub mod contact;
pub mod directory;
pub mod extract;
pub mod listings;
pub mod middleware;
pub mod responses;
pub mod search;
pub mod sliders;
pub mod stats;
pub mod upload;
pub mod users;
pub mod wishlist;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Multipart framing on top of the largest allowed file
const UPLOAD_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build the API router (mounted under `/api`)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let upload_limit = state
        .upload_config
        .max_file_size
        .max(state.upload_config.max_video_file_size)
        + UPLOAD_OVERHEAD_BYTES;

    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin/listings", listings::admin_router())
        .nest("/admin/categories", categories::admin_router())
        .nest("/admin/subcategories", categories::admin_subcategory_router())
        .nest("/admin/sliders", sliders::admin_router())
        .nest("/admin/blog/posts", blog::admin_post_router())
        .nest("/admin/videos", blog::admin_video_router())
        .nest("/admin/users", users::admin_router())
        .nest("/admin/contact-messages", contact::admin_router())
        .nest("/admin/articles", articles::admin_router())
        .nest("/admin/article-categories", articles::admin_category_router())
        .nest("/admin/faqs", directory::admin_faq_router())
        .nest("/admin/agencies", directory::admin_agency_router())
        .nest("/admin/locations", directory::admin_location_router())
        .route("/admin/upload", post(upload::upload_single))
        .route("/admin/upload-multiple", post(upload::upload_multiple))
        .layer(DefaultBodyLimit::max(usize::try_from(upload_limit).unwrap_or(usize::MAX)))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::protected_router())
        .nest("/wishlist", wishlist::router())
        .route("/seller/dashboard", get(stats::seller_dashboard))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/listings", listings::public_router())
        .nest("/search", search::router())
        .route("/categories", get(categories::category_tree))
        .nest(
            "/blog",
            blog::public_router().route("/categories", get(categories::active_categories)),
        )
        .route("/sliders", get(sliders::list_active))
        .route("/videos", get(blog::list_active_videos))
        .nest("/articles", articles::public_router())
        .route("/article-categories", get(articles::list_categories))
        .route("/faqs", get(directory::list_active_faqs))
        .route("/agencies", get(directory::list_agencies))
        .route("/locations", get(directory::list_locations))
        .route("/stats", get(stats::get_stats))
        .route("/contact", post(contact::submit))
        .route("/newsletter/subscribe", post(contact::subscribe))
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// CORS for the configured origin(s); `*` mirrors the caller so cookies still work
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let origin = if cors_origin.trim() == "*" {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = cors_origin
            .split(',')
            .filter_map(|o| {
                let o = o.trim();
                match o.parse::<HeaderValue>() {
                    Ok(value) if !o.is_empty() => Some(value),
                    _ => {
                        tracing::warn!("Ignoring invalid CORS origin: {:?}", o);
                        None
                    }
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service("/uploads", ServeDir::new(&config.upload.path))
        .layer(cors_layer(&config.server.cors_origin))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;
    use crate::services::{LoginInput, NewUserInput};
    use axum::http::{HeaderName, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    struct TestApp {
        server: TestServer,
        state: AppState,
        _uploads: tempfile::TempDir,
    }

    async fn setup() -> TestApp {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let mut config = Config::default();
        config.upload.path = uploads.path().to_path_buf();

        let cache = create_cache(&config.cache).await.expect("Failed to create cache");
        let state = AppState::build(pool, cache, &config);
        let server = TestServer::new(build_router(state.clone(), &config))
            .expect("Failed to start test server");

        TestApp {
            server,
            state,
            _uploads: uploads,
        }
    }

    async fn token_for(app: &TestApp, email: &str, role: UserRole) -> String {
        app.state
            .user_service
            .create(NewUserInput {
                email: email.to_string(),
                password: "secret123".to_string(),
                role,
                ..NewUserInput::default()
            })
            .await
            .expect("Failed to create user");
        app.state
            .user_service
            .login(LoginInput::new(email, "secret123"))
            .await
            .expect("Failed to log in")
            .token
    }

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_listing_lifecycle_and_public_visibility() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);

        let created = app
            .server
            .post("/api/admin/listings/rental-listings")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "title": "2BHK near MG Road",
                "price": "15000",
                "city": "Pune",
                "bedrooms": 2
            }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let listing: Value = created.json();
        let id = listing["id"].as_i64().unwrap();
        assert_eq!(listing["country"], "India");
        assert_eq!(listing["attributes"]["bedrooms"], 2);

        let fetched: Value = app
            .server
            .get(&format!("/api/listings/rental-listings/{}", id))
            .await
            .json();
        assert_eq!(fetched["title"], "2BHK near MG Road");
        assert_eq!(fetched["price"], 15000.0);

        app.server
            .patch(&format!("/api/admin/listings/rental-listings/{}/toggle-active", id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_ok();

        let public: Vec<Value> = app.server.get("/api/listings/rental-listings").await.json();
        assert!(public.is_empty());
        app.server
            .get(&format!("/api/listings/rental-listings/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let deleted: Value = app
            .server
            .delete(&format!("/api/admin/listings/rental-listings/{}", id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(deleted["id"], id);
        assert!(deleted["message"].as_str().unwrap().contains("deleted"));
    }

    #[tokio::test]
    async fn test_unknown_listing_kind_is_not_found() {
        let app = setup().await;
        let response = app.server.get("/api/listings/spaceships").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let app = setup().await;
        app.server
            .get("/api/admin/sliders")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = bearer(&token_for(&app, "ravi@example.in", UserRole::User).await);
        let response = app.server.get("/api/admin/sliders").add_header(name, value).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_signup_login_cookie_and_logout() {
        let app = setup().await;

        let signup = app
            .server
            .post("/api/auth/signup")
            .json(&json!({"email": "Asha@Example.in", "password": "secret123", "firstName": "Asha"}))
            .await;
        assert_eq!(signup.status_code(), StatusCode::CREATED);
        let body: Value = signup.json();
        assert_eq!(body["user"]["username"], "asha");
        assert!(body["user"].get("passwordHash").is_none());

        let login = app
            .server
            .post("/api/auth/login")
            .json(&json!({"email": "asha@example.in", "password": "secret123"}))
            .await;
        login.assert_status_ok();
        let cookie = login
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session=") && cookie.contains("HttpOnly"));
        let token = login.json::<Value>()["token"].as_str().unwrap().to_string();
        let session = HeaderValue::from_str(&format!("session={}", token)).unwrap();

        let me: Value = app
            .server
            .get("/api/auth/me")
            .add_header(header::COOKIE, session.clone())
            .await
            .json();
        assert_eq!(me["email"], "asha@example.in");

        app.server
            .post("/api/auth/logout")
            .add_header(header::COOKIE, session.clone())
            .await
            .assert_status_ok();
        app.server
            .get("/api/auth/me")
            .add_header(header::COOKIE, session)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_login_is_unauthorized() {
        let app = setup().await;
        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({"email": "nobody@example.in", "password": "whatever"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_users_cannot_read_other_accounts() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "ravi@example.in", UserRole::User).await);
        let other = app
            .state
            .user_service
            .create(NewUserInput {
                email: "meera@example.in".to_string(),
                password: "secret123".to_string(),
                ..NewUserInput::default()
            })
            .await
            .unwrap();

        app.server
            .get(&format!("/api/users/{}", other.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_wishlist_toggle_twice_restores_state() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "ravi@example.in", UserRole::User).await);
        let item = json!({"listingId": 12, "kind": "hostel-pg", "title": "PG near campus"});

        let added: Value = app
            .server
            .post("/api/wishlist/toggle")
            .add_header(name.clone(), value.clone())
            .json(&item)
            .await
            .json();
        assert_eq!(added["added"], true);

        let count: Value = app
            .server
            .get("/api/wishlist/count")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(count["count"], 1);

        let removed: Value = app
            .server
            .post("/api/wishlist/toggle")
            .add_header(name.clone(), value.clone())
            .json(&item)
            .await
            .json();
        assert_eq!(removed["added"], false);

        let list: Vec<Value> = app
            .server
            .get("/api/wishlist")
            .add_header(name, value)
            .await
            .json();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_search_finds_active_listings() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);
        for title in ["Maths tuition for class 10", "Spoken English classes"] {
            let kind = if title.contains("tuition") {
                "tuition-private-classes"
            } else {
                "language-classes"
            };
            app.server
                .post(&format!("/api/admin/listings/{}", kind))
                .add_header(name.clone(), value.clone())
                .json(&json!({"title": title}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let body: Value = app.server.get("/api/search?q=tuition").await.json();
        assert_eq!(body["q"], "tuition");
        let hits = body["results"]["tuition"].as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert!(body["results"].get("languageClasses").is_none());

        let empty: Value = app.server.get("/api/search?q=a").await.json();
        assert_eq!(empty["results"], json!({}));

        let sources: Vec<Value> = app.server.get("/api/search/sources").await.json();
        assert_eq!(sources.len(), 38 + 3);
    }

    #[tokio::test]
    async fn test_contact_and_newsletter() {
        let app = setup().await;
        app.server
            .post("/api/contact")
            .json(&json!({"name": "Asha", "email": "asha@example.in", "message": "Is the flat free?"}))
            .await
            .assert_status(StatusCode::CREATED);
        app.server
            .post("/api/contact")
            .json(&json!({"name": "Asha", "email": "nope", "message": "hi"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        for _ in 0..2 {
            app.server
                .post("/api/newsletter/subscribe")
                .json(&json!({"email": "news@example.in"}))
                .await
                .assert_status_ok();
        }
    }

    #[tokio::test]
    async fn test_upload_single_file() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);

        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(b"fake-png".to_vec())
                .file_name("front.png")
                .mime_type("image/png"),
        );
        let body: Value = app
            .server
            .post("/api/admin/upload")
            .add_header(name.clone(), value.clone())
            .multipart(form)
            .await
            .json();
        assert_eq!(body["success"], true);
        assert_eq!(body["originalName"], "front.png");
        let url = body["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

        let served = app.server.get(&url).await;
        served.assert_status_ok();
        assert_eq!(served.as_bytes().as_ref(), b"fake-png");

        let empty = MultipartForm::new().add_text("note", "no file here");
        app.server
            .post("/api/admin/upload")
            .add_header(name, value)
            .multipart(empty)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_multiple_reports_rejected_files() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);

        let form = MultipartForm::new()
            .add_part(
                "files",
                Part::bytes(b"fake-jpeg".to_vec())
                    .file_name("hall.jpg")
                    .mime_type("image/jpeg"),
            )
            .add_part(
                "files",
                Part::bytes(b"%PDF-1.4".to_vec())
                    .file_name("deed.pdf")
                    .mime_type("application/pdf"),
            );
        let response = app
            .server
            .post("/api/admin/upload-multiple")
            .add_header(name.clone(), value.clone())
            .multipart(form)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["files"].as_array().unwrap().len(), 1);
        assert_eq!(body["files"][0]["originalName"], "hall.jpg");
        let failed = body["failed"].as_array().unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].as_str().unwrap().starts_with("deed.pdf"));

        let empty = MultipartForm::new().add_text("note", "no files here");
        let response = app
            .server
            .post("/api/admin/upload-multiple")
            .add_header(name, value)
            .multipart(empty)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_listing_body_is_validation_error() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);

        let response = app
            .server
            .post("/api/admin/listings/hostel-pg")
            .add_header(name.clone(), value.clone())
            .json(&json!({"title": 5}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

        let response = app
            .server
            .get("/api/admin/listings/hostel-pg/not-a-number")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stats_counts_listings() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);
        app.server
            .post("/api/admin/listings/cars-bikes")
            .add_header(name, value)
            .json(&json!({"title": "Activa 2019", "isActive": false}))
            .await
            .assert_status(StatusCode::CREATED);

        let stats: Value = app.server.get("/api/stats").await.json();
        assert_eq!(stats["listings"]["total"], 1);
        assert_eq!(stats["listings"]["active"], 0);
        assert_eq!(stats["listings"]["byKind"][0]["kind"], "cars-bikes");
    }

    #[tokio::test]
    async fn test_article_publishing_and_public_reads() {
        let app = setup().await;
        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);

        let category: Value = app
            .server
            .post("/api/admin/article-categories")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Home Loans"}))
            .await
            .json();
        assert_eq!(category["slug"], "home-loans");

        app.server
            .post("/api/admin/article-categories")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Loans", "slug": "home-loans"}))
            .await
            .assert_status(StatusCode::CONFLICT);

        let created = app
            .server
            .post("/api/admin/articles")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "title": "EMI basics",
                "type": "guide",
                "pages": "24",
                "categoryId": category["id"],
                "authorId": 4040
            }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let article: Value = created.json();
        let id = article["id"].as_i64().unwrap();
        assert_eq!(article["pages"], 24);
        assert_eq!(article["categoryName"], "Home Loans");
        assert!(article["authorId"].is_null());

        let public: Vec<Value> = app.server.get("/api/articles").await.json();
        assert!(public.is_empty());
        app.server
            .get(&format!("/api/articles/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let published: Value = app
            .server
            .patch(&format!("/api/admin/articles/{}/toggle-publish", id))
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(published["isPublished"], true);
        assert!(published["publishedAt"].is_string());

        let guides: Vec<Value> = app
            .server
            .get("/api/articles")
            .add_query_param("type", "guide")
            .await
            .json();
        assert_eq!(guides.len(), 1);
        let viewed: Value = app.server.get(&format!("/api/articles/{}", id)).await.json();
        assert_eq!(viewed["viewCount"], 1);

        let categories: Vec<Value> = app.server.get("/api/article-categories").await.json();
        assert_eq!(categories.len(), 1);

        let deleted: Value = app
            .server
            .delete(&format!("/api/admin/articles/{}", id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(deleted["id"], id);
    }

    #[tokio::test]
    async fn test_directory_admin_and_public_lists() {
        let app = setup().await;
        app.server
            .post("/api/admin/faqs")
            .json(&json!({"question": "Q", "answer": "A", "category": "agent"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = bearer(&token_for(&app, "admin@jeevika.in", UserRole::Admin).await);
        for (question, category, sort_order, active) in [
            ("How do I list a flat?", "listing", 2, true),
            ("Is listing free?", "listing", 1, true),
            ("Old answer", "listing", 0, false),
            ("How do agents verify?", "agent", 0, true),
        ] {
            app.server
                .post("/api/admin/faqs")
                .add_header(name.clone(), value.clone())
                .json(&json!({
                    "question": question,
                    "answer": "See the help centre.",
                    "category": category,
                    "sortOrder": sort_order,
                    "isActive": active
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let listing: Vec<Value> = app
            .server
            .get("/api/faqs")
            .add_query_param("category", "listing")
            .await
            .json();
        let questions: Vec<&str> = listing.iter().filter_map(|f| f["question"].as_str()).collect();
        assert_eq!(questions, vec!["Is listing free?", "How do I list a flat?"]);

        app.server
            .post("/api/admin/faqs")
            .add_header(name.clone(), value.clone())
            .json(&json!({"question": "", "answer": "A", "category": "agent"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.server
            .post("/api/admin/agencies")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Konkan Realty", "phone": "+91 22 5550 1234"}))
            .await
            .assert_status(StatusCode::CREATED);
        let agencies: Vec<Value> = app.server.get("/api/agencies").await.json();
        assert_eq!(agencies[0]["name"], "Konkan Realty");
        assert_eq!(agencies[0]["propertyCount"], 0);

        let location: Value = app
            .server
            .post("/api/admin/locations")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Andheri West", "city": "Mumbai"}))
            .await
            .json();
        assert_eq!(location["country"], "India");
        let locations: Vec<Value> = app.server.get("/api/locations").await.json();
        assert_eq!(locations.len(), 1);

        app.server
            .delete(&format!("/api/admin/locations/{}", location["id"]))
            .add_header(name, value)
            .await
            .assert_status_ok();
        let locations: Vec<Value> = app.server.get("/api/locations").await.json();
        assert!(locations.is_empty());
    }

    #[test]
    fn test_cors_layer_accepts_lists_and_wildcard() {
        let _ = cors_layer("*");
        let _ = cors_layer("http://localhost:5173, https://jeevika.in");
    }
}
