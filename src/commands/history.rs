//! One-shot history fetch for the CLI.
//!
//! Runs the same cache/failover path the server uses and prints the series as
//! JSON. Useful for checking provider reachability without starting the
//! server.

use crate::services::PriceFeed;

pub async fn run(coin: String, days: String) {
    let feed = match PriceFeed::new() {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("Failed to initialize price feed: {}", e);
            std::process::exit(1);
        }
    };

    let history = feed.get_history(&coin, &days).await;

    match serde_json::to_string_pretty(&history) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize history: {}", e);
            std::process::exit(1);
        }
    }
}
