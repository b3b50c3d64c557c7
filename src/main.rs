//! Jeevika - classifieds and real-estate marketplace backend

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jeevika::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
    models::UserRole,
    services::{NewUserInput, UserServiceError},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jeevika=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Jeevika Services...");

    let config_path = std::env::var("JEEVIKA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    tracing::info!("Configuration loaded from {}", config_path.display());

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized: {:?}", config.cache.driver);

    tokio::fs::create_dir_all(&config.upload.path).await?;

    let state = AppState::build(pool, cache, &config);

    let expired = state.user_service.cleanup_expired_sessions().await?;
    if expired > 0 {
        tracing::info!("Removed {} expired sessions", expired);
    }
    bootstrap_admin(&state).await?;

    let app = api::build_router(state, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the admin named by `JEEVIKA_ADMIN_EMAIL` / `JEEVIKA_ADMIN_PASSWORD` if missing
async fn bootstrap_admin(state: &AppState) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("JEEVIKA_ADMIN_EMAIL"),
        std::env::var("JEEVIKA_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let input = NewUserInput {
        email,
        password,
        role: UserRole::Admin,
        ..NewUserInput::default()
    };
    match state.user_service.create(input).await {
        Ok(user) => tracing::info!("Admin account created: {}", user.email),
        Err(UserServiceError::ValidationError(msg)) => {
            tracing::info!("Admin account not created: {}", msg)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
