pub mod api;
pub mod broadcast;
pub mod ws;

use crate::services::SharedPriceFeed;
use axum::{extract::FromRef, routing::get, Router};
use broadcast::BroadcastHub;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Liveness counters maintained by the broadcast worker
#[derive(Clone, Debug, Default, Serialize)]
pub struct HealthStats {
    pub uptime_secs: u64,
    pub broadcast_iteration_count: u64,
    /// RFC 3339 timestamp of the last completed broadcast cycle
    pub last_broadcast: Option<String>,
}

pub type SharedHealthStats = Arc<RwLock<HealthStats>>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: SharedPriceFeed,
    pub hub: Arc<BroadcastHub>,
    pub health: SharedHealthStats,
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for SharedPriceFeed {
    fn from_ref(app_state: &AppState) -> SharedPriceFeed {
        app_state.feed.clone()
    }
}

impl FromRef<AppState> for SharedHealthStats {
    fn from_ref(app_state: &AppState) -> SharedHealthStats {
        app_state.health.clone()
    }
}

/// Start the axum server
pub async fn serve(
    feed: SharedPriceFeed,
    hub: Arc<BroadcastHub>,
    health: SharedHealthStats,
    port: u16,
) -> crate::error::Result<()> {
    let app_state = AppState { feed, hub, health };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    tracing::info!("Registering routes:");
    tracing::info!("  GET /history?coin=bitcoin&days=7");
    tracing::info!("  GET /health");
    tracing::info!("  GET /ws (WebSocket)");

    let app = Router::new()
        .route("/history", get(api::get_history_handler))
        .route("/health", get(api::health_handler))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::Other(format!("Server error: {}", e)))?;

    Ok(())
}
