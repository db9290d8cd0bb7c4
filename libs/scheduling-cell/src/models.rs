// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// A bookable interval owned by one doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// 0 = Sunday .. 6 = Saturday, derived from `date` and cached for
    /// recurrence matching.
    pub day_of_week: i32,
    pub is_booked: bool,
    pub booking_id: Option<Uuid>,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    /// The appointment instant a booking against this slot refers to.
    pub fn appointment_datetime(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }
}

/// A patient's claim on a doctor's time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub price: f64,
    pub status: BookingStatus,
    pub time_slot_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    /// Assigned at creation, never changed afterwards. Consumed by the
    /// signaling relay and client UIs.
    pub video_room_id: String,
    pub notes: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn appointment_datetime(&self) -> DateTime<Utc> {
        self.appointment_date.and_time(self.appointment_time).and_utc()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Cancelled and completed bookings accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Approved => write!(f, "approved"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// IDENTITY PROFILES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub consultation_fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub full_name: String,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// A (start, end) pair in "HH:MM" wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotInterval {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotsRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotInterval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleRequest {
    pub doctor_id: Uuid,
    /// Day-of-week (0 = Sunday .. 6 = Saturday) to the intervals offered
    /// on that day.
    pub schedule: HashMap<u8, Vec<SlotInterval>>,
    pub start_date: NaiveDate,
    pub weeks_ahead: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub patient_id: Uuid,
    pub slot_id: Uuid,
    pub price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectBookingRequest {
    pub patient_id: Uuid,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub patient_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSlotRequest {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Result of the time-windowed video access check. `room_id` is populated
/// only while the call may actually be joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAccess {
    pub accessible: bool,
    pub room_id: Option<String>,
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Time slot not found")]
    SlotNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Time slot already booked")]
    SlotAlreadyBooked,

    #[error("Time slot already exists at {date} {start_time}")]
    SlotExists { date: NaiveDate, start_time: String },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: BookingStatus, to: BookingStatus },

    #[error("Booking already cancelled")]
    AlreadyCancelled,

    #[error("Cannot cancel a completed booking")]
    CannotCancelCompleted,

    #[error("Booking belongs to another patient")]
    NotBookingOwner,

    #[error("Cannot delete a booked slot")]
    SlotInUse,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Parse an "HH:MM" wall-clock string from the wire.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| SchedulingError::InvalidTime(format!("expected HH:MM, got {value:?}")))
}
