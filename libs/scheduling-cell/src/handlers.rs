// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    AvailableSlotsQuery, BookSlotRequest, CancelBookingRequest, CreateSlotsRequest,
    DeleteSlotRequest, DirectBookingRequest, SchedulingError, SlotRangeQuery,
    UpdateStatusRequest, WeeklyScheduleRequest,
};
use crate::router::SchedulingState;

fn map_scheduling_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::SlotNotFound
        | SchedulingError::BookingNotFound
        | SchedulingError::DoctorNotFound
        | SchedulingError::PatientNotFound => AppError::NotFound(err.to_string()),
        SchedulingError::SlotAlreadyBooked | SchedulingError::SlotExists { .. } => {
            AppError::Conflict(err.to_string())
        }
        SchedulingError::InvalidTime(_) => AppError::BadRequest(err.to_string()),
        SchedulingError::InvalidStatusTransition { .. }
        | SchedulingError::AlreadyCancelled
        | SchedulingError::CannotCancelCompleted
        | SchedulingError::SlotInUse => AppError::InvalidState(err.to_string()),
        SchedulingError::NotBookingOwner => AppError::PermissionDenied(err.to_string()),
        SchedulingError::Unavailable(_) => AppError::Database(err.to_string()),
    }
}

// ==============================================================================
// TIME SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_slots(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<CreateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .slots
        .create_slots(request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Time slots created successfully",
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn generate_weekly_slots(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<WeeklyScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .slots
        .generate_weekly_slots(request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Created {} time slots", slots.len()),
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .slots
        .get_available_slots(query.doctor_id, query.date)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_slots(
    State(state): State<Arc<SchedulingState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .slots
        .get_doctor_slots(doctor_id, query.from, query.to)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<SchedulingState>>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<DeleteSlotRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .slots
        .delete_slot(request.doctor_id, slot_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Time slot deleted successfully"
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .bookings
        .book_slot(request)
        .await
        .map_err(map_scheduling_error)?;
    let video_room_id = booking.video_room_id.clone();

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "booking": booking,
        "video_room_id": video_room_id
    })))
}

#[axum::debug_handler]
pub async fn create_direct_booking(
    State(state): State<Arc<SchedulingState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<DirectBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .bookings
        .create_direct_booking(doctor_id, request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking created successfully",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .bookings
        .update_status(booking_id, request.status)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking status updated",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .bookings
        .cancel_booking(request.patient_id, booking_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn check_video_access(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let access = state
        .bookings
        .check_video_access(booking_id, Utc::now())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "access": access
    })))
}

#[axum::debug_handler]
pub async fn get_patient_bookings(
    State(state): State<Arc<SchedulingState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let bookings = state
        .bookings
        .get_patient_bookings(patient_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "bookings": bookings
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_bookings(
    State(state): State<Arc<SchedulingState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let bookings = state
        .bookings
        .get_doctor_bookings(doctor_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "bookings": bookings
    })))
}
