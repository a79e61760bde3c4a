//! Reload broadcast over websockets, plus the health probe.
//!
//! Browser clients connect to `/ws` and receive one reload message per
//! settled change. The channel is strictly one-way; anything a client sends
//! is ignored, and a closed socket just ends that client's loop.

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::server::SyncState;

/// Messages pushed to connected browser clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    /// A watched file settled; the page should refresh.
    Reload {
        file: String,
        /// Extension with its leading dot, or empty when the file has none.
        extension: String,
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
}

/// Liveness probe for container orchestration.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Gets called for every new browser client and spins up an event loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SyncState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| reload_ws_loop(socket, state.ws_tx.subscribe()))
}

async fn send_ws_message(socket: &mut WebSocket, msg: &WsMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to serialize websocket message: {}", e);
            Err(axum::Error::new(e))
        }
    }
}

/// One event loop per connected client.
async fn reload_ws_loop(mut socket: WebSocket, mut rx: broadcast::Receiver<WsMessage>) {
    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(msg) => {
                        if let Err(e) = send_ws_message(&mut socket, &msg).await {
                            warn!("Failed to send reload, closing connection: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Reload receiver lagged, continuing");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    info!("WebSocket connection closed");
                    break;
                }
                // Clients have nothing to say to us; drop whatever arrived.
            }
        }
    }
}
