//! WebSocket upgrade and per-connection read/write loops.
//!
//! Each accepted socket gets a fresh [`ConnectionId`], a bounded outbound
//! channel feeding a write task, and a read loop that parses inbound frames
//! into [`ClientEvent`]s for the engine. Malformed frames are logged and
//! dropped at this boundary; the state machine only ever sees valid events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use trivia_core::events::ClientEvent;
use trivia_core::ids::ConnectionId;

use crate::connection::ClientConnection;
use crate::server::AppState;

/// GET /ws — upgrade to a WebSocket session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = ConnectionId::new();
    counter!("ws_connections_total").increment(1);
    info!(conn = %id, "client connected");

    let (tx, mut rx) = mpsc::channel::<Arc<String>>(state.send_buffer);
    state
        .table
        .add(Arc::new(ClientConnection::new(id.clone(), tx)));

    let (mut sink, mut stream) = socket.split();

    // Write task: drain the outbound channel into the socket. Ends when the
    // connection is removed from the table (all senders dropped) or the
    // socket goes away.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink
                .send(Message::Text(message.as_str().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Read loop: parse frames and hand them to the engine.
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    debug!(conn = %id, ?event, "inbound event");
                    state.engine.handle_event(&id, event);
                }
                Err(error) => {
                    warn!(conn = %id, %error, "dropping malformed message");
                }
            },
            Message::Close(_) => break,
            // Axum answers pings itself; binary frames are not part of the protocol.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    info!(conn = %id, "client disconnected");
    state.table.remove(&id);
    state.engine.handle_disconnect(&id);
    let _ = writer.await;
}
