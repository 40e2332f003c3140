//! Periodic broadcast of default-timeframe history for every supported coin.
//!
//! Each cycle pulls every coin through the price feed (which serves from
//! cache when fresh) and publishes the result on the coin's channel. A
//! failure for one coin never stops the cycle; the feed itself degrades to
//! stale or mock data instead of erroring.

use crate::constants::{BROADCAST_INTERVAL_SECS, SUPPORTED_COINS};
use crate::server::broadcast::BroadcastHub;
use crate::server::ws::HistoryEvent;
use crate::server::SharedHealthStats;
use crate::services::SharedPriceFeed;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub async fn run_broadcast_worker(
    feed: SharedPriceFeed,
    hub: Arc<BroadcastHub>,
    health: SharedHealthStats,
) {
    info!(
        interval_secs = BROADCAST_INTERVAL_SECS,
        coins = SUPPORTED_COINS.len(),
        "Starting broadcast worker"
    );

    let mut iteration_count = 0u64;

    loop {
        iteration_count += 1;
        let cycle_start = std::time::Instant::now();
        let mut delivered = 0usize;

        for coin in SUPPORTED_COINS {
            let history = feed.get_history(coin, "1").await;
            let event = HistoryEvent::new(coin, history);

            match serde_json::to_string(&event) {
                Ok(payload) => {
                    delivered += hub.publish(coin, payload);
                }
                Err(e) => {
                    // Skip this coin, keep the cycle going
                    warn!(coin = coin, error = %e, "Failed to serialize broadcast event");
                }
            }
        }

        {
            let mut stats = health.write().await;
            stats.broadcast_iteration_count = iteration_count;
            stats.last_broadcast = Some(Utc::now().to_rfc3339());
        }

        info!(
            worker = "Broadcast",
            iteration = iteration_count,
            receivers = delivered,
            cycle_secs = cycle_start.elapsed().as_secs_f64(),
            "Broadcast cycle completed"
        );

        sleep(Duration::from_secs(BROADCAST_INTERVAL_SECS)).await;
    }
}
