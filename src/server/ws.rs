//! WebSocket endpoint for live price history delivery.
//!
//! Every connection is subscribed to the broadcast channel of each supported
//! coin. Clients can additionally request an arbitrary coin and timeframe
//! with a `request_coin_data` message; the reply goes to that client only.
//! Malformed frames are dropped without a reply, and pushes to a closed
//! connection are silently lost.

use crate::constants::SUPPORTED_COINS;
use crate::models::PricePoint;
use crate::server::broadcast::history_topic;
use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::StreamExt;
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Outbound event: a coin's history series on its `{coin}_history` channel
#[derive(Debug, Serialize)]
pub struct HistoryEvent {
    pub event: String,
    pub data: Vec<PricePoint>,
}

impl HistoryEvent {
    pub fn new(coin_id: &str, data: Vec<PricePoint>) -> Self {
        Self {
            event: history_topic(coin_id),
            data,
        }
    }
}

/// Inbound client message
#[derive(Debug, Deserialize)]
struct ClientMessage {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(rename = "coinId")]
    coin_id: Option<String>,
    days: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Single writer task; broadcast forwarders and request replies funnel
    // through this channel.
    let (tx_to_client, mut rx_to_client) = mpsc::channel::<String>(64);

    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx_to_client.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Every connection listens to all supported coins' broadcast channels.
    for coin in SUPPORTED_COINS {
        if let Some(mut rx) = state.hub.subscribe(coin) {
            let tx = tx_to_client.clone();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(msg) => {
                            if tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "WebSocket client lagged behind broadcast");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(parsed) = serde_json::from_str::<ClientMessage>(&text) else {
                    // Malformed request: no reply
                    continue;
                };
                if parsed.msg_type == "request_coin_data" {
                    let Some(coin_id) = parsed.coin_id else {
                        continue;
                    };
                    let days = validate_days(parsed.days.as_deref());
                    let history = state.feed.get_history(&coin_id, days).await;
                    let event = HistoryEvent::new(&coin_id, history);
                    match serde_json::to_string(&event) {
                        Ok(payload) => {
                            let _ = tx_to_client.send(payload).await;
                        }
                        Err(e) => warn!(error = %e, "Failed to serialize history event"),
                    }
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    forward_task.abort();
}

/// Client-supplied timeframes outside the fixed set fall back to one day
fn validate_days(days: Option<&str>) -> &str {
    match days {
        Some(d) if crate::models::Timeframe::parse(d).is_some() => d,
        _ => "1",
    }
}
