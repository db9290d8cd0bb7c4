// libs/signaling-cell/src/relay.rs
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Outbound channel for one connected peer. Unbounded so a slow peer never
/// stalls fan-out to the others; the writer task drains it.
pub type PeerSender = mpsc::UnboundedSender<String>;

/// The relay's room table: room id to the set of connected peers, keyed by
/// connection id so a re-sent join cannot create duplicate membership.
/// Rooms exist only while they have members.
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, HashMap<Uuid, PeerSender>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a connection to a room, creating the room if absent. Joining a
    /// room the connection is already in is a no-op.
    pub async fn join(&self, room_id: &str, conn_id: Uuid, sender: PeerSender) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.to_string()).or_default();
        if members.insert(conn_id, sender).is_none() {
            info!("Connection {} joined room {}", conn_id, room_id);
        } else {
            debug!("Connection {} re-joined room {}, membership unchanged", conn_id, room_id);
        }
    }

    /// Remove a connection from its room; the room itself is dropped once
    /// the last member leaves.
    pub async fn leave(&self, room_id: &str, conn_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(room_id);
                info!("Room {} is empty, removed", room_id);
            }
        }
    }

    /// Forward a frame to every member of the room except the sender.
    /// Returns how many peers it was handed to; a peer whose channel has
    /// closed is skipped.
    pub async fn broadcast(&self, room_id: &str, sender_id: Uuid, frame: String) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (conn_id, sender) in members {
            if *conn_id == sender_id {
                continue;
            }
            if sender.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("Peer {} in room {} is gone, skipping", conn_id, room_id);
            }
        }
        delivered
    }

    pub async fn member_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map(|members| members.len()).unwrap_or(0)
    }

    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RoomRegistry {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
        }
    }
}
