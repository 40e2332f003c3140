//! Central broadcast hub. Each supported coin has a `broadcast::Sender`
//! carrying serialized history events.
//!
//! The channel set is fixed at construction (one per supported coin), so the
//! map itself needs no locking. Publishing is fire-and-forget: a send with no
//! subscribers simply reports zero receivers.

use crate::constants::SUPPORTED_COINS;
use std::collections::HashMap;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Event name a coin's history updates are delivered on
pub fn history_topic(coin_id: &str) -> String {
    format!("{coin_id}_history")
}

pub struct BroadcastHub {
    channels: HashMap<String, broadcast::Sender<String>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        let channels = SUPPORTED_COINS
            .iter()
            .map(|coin| (coin.to_string(), broadcast::channel(CHANNEL_CAPACITY).0))
            .collect();
        Self { channels }
    }

    /// Subscribe to a coin's history channel. Returns None for coins outside
    /// the supported set; those are only served on demand.
    pub fn subscribe(&self, coin_id: &str) -> Option<broadcast::Receiver<String>> {
        self.channels.get(coin_id).map(|tx| tx.subscribe())
    }

    /// Publish a message to every subscriber of a coin's channel and return
    /// the receiver count. Returns 0 when nobody is listening or the coin is
    /// unsupported.
    pub fn publish(&self, coin_id: &str, message: String) -> usize {
        match self.channels.get(coin_id) {
            Some(tx) => tx.send(message).unwrap_or(0),
            None => 0,
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_topic() {
        assert_eq!(history_topic("bitcoin"), "bitcoin_history");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.publish("bitcoin", "{}".to_string()), 0);
        assert_eq!(hub.publish("shibainu", "{}".to_string()), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_message() {
        let hub = BroadcastHub::new();
        let mut rx = hub.subscribe("bitcoin").unwrap();

        assert_eq!(hub.publish("bitcoin", "payload".to_string()), 1);
        assert_eq!(rx.recv().await.unwrap(), "payload");
    }

    #[test]
    fn test_unsupported_coin_has_no_channel() {
        let hub = BroadcastHub::new();
        assert!(hub.subscribe("shibainu").is_none());
    }
}
