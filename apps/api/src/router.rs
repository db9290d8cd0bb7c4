use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use scheduling_cell::router::{booking_routes, slot_routes, SchedulingState};
use scheduling_cell::store::{
    IdentityStore, MemoryIdentity, MemoryStore, SchedulingStore, SupabaseIdentity, SupabaseStore,
};
use shared_config::AppConfig;
use signaling_cell::relay::RoomRegistry;
use signaling_cell::router::signaling_routes;

pub fn create_router(config: AppConfig) -> Router {
    let (store, identity): (Arc<dyn SchedulingStore>, Arc<dyn IdentityStore>) =
        if config.is_configured() {
            info!("Using Supabase-backed scheduling store");
            (
                Arc::new(SupabaseStore::new(&config)),
                Arc::new(SupabaseIdentity::new(&config)),
            )
        } else {
            info!("Using in-memory scheduling store");
            (
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryIdentity::permissive()),
            )
        };

    let scheduling = Arc::new(SchedulingState::new(
        store,
        identity,
        config.auto_approve_direct_bookings,
    ));
    let registry = Arc::new(RoomRegistry::new());

    Router::new()
        .route("/", get(|| async { "Telecare API is running!" }))
        .nest("/time-slots", slot_routes(scheduling.clone()))
        .nest("/bookings", booking_routes(scheduling))
        .nest("/signaling", signaling_routes(registry))
}
