use crate::server::{self, broadcast::BroadcastHub, HealthStats, SharedHealthStats};
use crate::services::PriceFeed;
use crate::worker;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub async fn run(port: u16) {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!(port, "Starting coinpulse server");

    let feed = match PriceFeed::new() {
        Ok(feed) => Arc::new(feed),
        Err(e) => {
            eprintln!("Failed to initialize price feed: {}", e);
            std::process::exit(1);
        }
    };

    let hub = Arc::new(BroadcastHub::new());
    let health: SharedHealthStats = Arc::new(RwLock::new(HealthStats::default()));

    // Periodic broadcast of all supported coins
    let worker_feed = feed.clone();
    let worker_hub = hub.clone();
    let worker_health = health.clone();
    tokio::spawn(async move {
        worker::run_broadcast_worker(worker_feed, worker_hub, worker_health).await;
    });

    // Uptime tracker
    let start_time = Instant::now();
    let uptime_health = health.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
            let mut stats = uptime_health.write().await;
            stats.uptime_secs = start_time.elapsed().as_secs();
        }
    });

    if let Err(e) = server::serve(feed, hub, health, port).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
