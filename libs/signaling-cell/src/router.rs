// libs/signaling-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::relay::RoomRegistry;

pub fn signaling_routes(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/ws", get(handlers::ws_handler))
        .with_state(registry)
}
