//! Statistics endpoints
//!
//! - GET /api/stats - Listing counts per category plus request stats
//! - GET /api/seller/dashboard - Aggregates over the caller's own listings

use axum::extract::State;
use serde::Serialize;

use crate::api::extract::Json;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::ListingKind;
use crate::services::SellerDashboard;

/// Response for `GET /api/stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub listings: ListingStats,
    pub requests: RequestStatsResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    pub total: i64,
    pub active: i64,
    pub by_kind: Vec<KindStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindStats {
    pub kind: ListingKind,
    pub label: &'static str,
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatsResponse {
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
    pub uptime_seconds: u64,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let counts = state.listing_service.counts().await?;

    let by_kind: Vec<KindStats> = counts
        .into_iter()
        .map(|c| KindStats {
            kind: c.kind,
            label: c.kind.label(),
            total: c.total,
            active: c.active,
        })
        .collect();

    Ok(Json(StatsResponse {
        listings: ListingStats {
            total: by_kind.iter().map(|k| k.total).sum(),
            active: by_kind.iter().map(|k| k.active).sum(),
            by_kind,
        },
        requests: RequestStatsResponse {
            total_requests: state.request_stats.total_requests(),
            avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
            uptime_seconds: state.request_stats.uptime_seconds(),
        },
    }))
}

/// GET /api/seller/dashboard
pub async fn seller_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<SellerDashboard>, ApiError> {
    Ok(Json(state.listing_service.seller_dashboard(user.id).await?))
}
