// libs/signaling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{SignalFrame, SignalKind};
use crate::relay::RoomRegistry;

pub async fn ws_handler(
    State(registry): State<Arc<RoomRegistry>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Per-connection loop: Connecting -> Joined(room) -> Closed.
///
/// A connection joins at most one room for its lifetime; relayed kinds are
/// fanned out to the other room members, and the registry entry is removed
/// when the socket goes away for any reason.
async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>) {
    let conn_id = Uuid::new_v4();
    info!("Client {} connected", conn_id);

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task drains the outbound channel so a slow socket never blocks
    // the peer doing the fan-out.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut joined_room: Option<String> = None;

    while let Some(Ok(message)) = ws_rx.next().await {
        let text = match message {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: SignalFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(err) => {
                debug!("Dropping malformed frame from {}: {}", conn_id, err);
                continue;
            }
        };

        match frame.kind {
            SignalKind::Join => {
                if joined_room.is_some() {
                    debug!("Client {} already joined a room, ignoring join", conn_id);
                    continue;
                }
                let Some(room_id) = frame.room_id else {
                    debug!("Join from {} without roomId, dropping", conn_id);
                    continue;
                };
                registry.join(&room_id, conn_id, tx.clone()).await;
                joined_room = Some(room_id);
            }
            kind if kind.is_relayed() => {
                // Silently dropped when the sender never joined a room.
                if let Some(room_id) = &joined_room {
                    registry.broadcast(room_id, conn_id, text).await;
                }
            }
            _ => {}
        }
    }

    if let Some(room_id) = &joined_room {
        registry.leave(room_id, conn_id).await;
    }
    writer.abort();
    info!("Client {} disconnected", conn_id);
}
