// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::services::{BookingService, SlotService};
use crate::store::{IdentityStore, SchedulingStore};

use crate::handlers;

/// Shared state for the scheduling cell: the two services over one store
/// and identity collaborator pair.
pub struct SchedulingState {
    pub slots: SlotService,
    pub bookings: BookingService,
}

impl SchedulingState {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        identity: Arc<dyn IdentityStore>,
        auto_approve_direct: bool,
    ) -> Self {
        Self {
            slots: SlotService::new(Arc::clone(&store), Arc::clone(&identity)),
            bookings: BookingService::new(store, identity, auto_approve_direct),
        }
    }
}

pub fn slot_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_slots))
        .route("/weekly", post(handlers::generate_weekly_slots))
        .route("/available", get(handlers::get_available_slots))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_slots))
        .route("/{slot_id}", delete(handlers::delete_slot))
        .with_state(state)
}

pub fn booking_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/slot", post(handlers::book_slot))
        .route(
            "/doctors/{doctor_id}",
            post(handlers::create_direct_booking).get(handlers::get_doctor_bookings),
        )
        .route("/patients/{patient_id}", get(handlers::get_patient_bookings))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/status", patch(handlers::update_booking_status))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/video-access", get(handlers::check_video_access))
        .with_state(state)
}
