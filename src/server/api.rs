//! REST handlers: price history queries and service health.

use crate::models::PricePoint;
use crate::server::AppState;
use crate::services::{CacheStats, SharedPriceFeed};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query parameters for the /history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Coin identifier (e.g. "bitcoin")
    pub coin: String,

    /// Timeframe in days: 1 (default), 7, 30, 90
    pub days: Option<String>,
}

/// GET /history?coin=bitcoin&days=7
///
/// Same data the WebSocket delivers, as a plain request/response. Always
/// returns a usable series; unsupported coins get mock data.
pub async fn get_history_handler(
    State(feed): State<SharedPriceFeed>,
    Query(params): Query<HistoryQuery>,
) -> Json<Vec<PricePoint>> {
    debug!(coin = %params.coin, days = ?params.days, "History request");

    let days = params.days.as_deref().unwrap_or("1");
    Json(feed.get_history(&params.coin, days).await)
}

/// Health endpoint response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub broadcast_iteration_count: u64,
    pub last_broadcast: Option<String>,
    pub preferred_provider: &'static str,
    pub cache: CacheStats,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.health.read().await.clone();
    let cache = state.feed.cache_stats().await;
    let preferred = state.feed.preferred_provider().await;

    Json(HealthResponse {
        status: "ok",
        uptime_secs: stats.uptime_secs,
        broadcast_iteration_count: stats.broadcast_iteration_count,
        last_broadcast: stats.last_broadcast,
        preferred_provider: preferred.name(),
        cache,
    })
}
