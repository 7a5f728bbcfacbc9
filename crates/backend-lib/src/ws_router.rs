// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use crate::dispatcher::Transport;
use crate::error::AppError;
use crate::handlers::live;
use crate::metrics::{WS_ACTIVE, WS_CONNECTION};
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use serde::Deserialize;
use std::sync::Arc;
use tasklive_common::{ClientToServer, ConnectionId, ServerToClient};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outbound buffer per connection
const OUTBOUND_CAPACITY: usize = 32;

/// Live connections and their outbound queues
#[derive(Default)]
pub struct WsHub {
    senders: DashMap<ConnectionId, mpsc::Sender<Message>>,
}

impl WsHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an outbound queue for a new connection
    pub fn register(&self, connection_id: ConnectionId) -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.senders.insert(connection_id, tx.clone());
        (tx, rx)
    }

    pub fn unregister(&self, connection_id: &ConnectionId) {
        self.senders.remove(connection_id);
    }
}

#[async_trait]
impl Transport for WsHub {
    async fn push(&self, connection_id: &ConnectionId, message: ServerToClient) -> Result<(), AppError> {
        let tx = self
            .senders
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("connection {connection_id} is gone")))?;

        let json = serde_json::to_string(&message)?;
        // full queue: drop the push
        tx.try_send(Message::Text(json.into())).map_err(|e| match e {
            TrySendError::Full(_) => AppError::Internal(format!("outbound queue full for {connection_id}")),
            TrySendError::Closed(_) => AppError::NotFound(format!("connection {connection_id} is gone")),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    counter!(WS_CONNECTION).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, state, params.user_id))
}

fn error_frame(code: &str, message: String) -> Message {
    let frame = ServerToClient::Error {
        code: code.to_string(),
        message,
    };
    Message::Text(serde_json::to_string(&frame).unwrap_or_default().into())
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, announced: Option<String>) {
    let connection_id: ConnectionId = Uuid::new_v4();
    gauge!(WS_ACTIVE).increment(1.0);
    info!(%connection_id, "live connection opened");

    let (mut tx, mut rx) = socket.split();

    // Outbound queue must exist before any bind so the first push lands
    let (direct, mut outbound) = state.hub.register(connection_id);

    // Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if tx.send(message).await.is_err() {
                break;
            }
        }
    });

    live::on_connect(&state, connection_id, announced.as_deref()).await;

    while let Some(Ok(message)) = rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(&text) {
                Ok(client_msg) => {
                    live::handle_client_message(&state, connection_id, client_msg).await;
                },
                Err(e) => {
                    debug!(%connection_id, error = %e, "malformed client frame");
                    if direct
                        .send(error_frame("MALFORMED_MESSAGE", e.to_string()))
                        .await
                        .is_err()
                    {
                        warn!(%connection_id, "failed to send error frame");
                        break;
                    }
                },
            },
            Message::Close(_) => break,
            _ => {},
        }
    }

    // Cleanup: drop the queue and any binding still pointing here
    state.hub.unregister(&connection_id);
    state.registry.evict_connection(connection_id);
    gauge!(WS_ACTIVE).decrement(1.0);
    info!(%connection_id, "live connection closed");

    drop(direct);
    send_task.abort();
}
