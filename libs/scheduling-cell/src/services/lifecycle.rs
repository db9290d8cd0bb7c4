// libs/scheduling-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{BookingStatus, SchedulingError};

/// The call room opens this many minutes before the appointment.
pub const JOIN_WINDOW_BEFORE_MINUTES: i64 = 5;
/// The call room stays open this many minutes after the appointment start.
pub const JOIN_WINDOW_AFTER_MINUTES: i64 = 60;

pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed by the monotone table
    /// pending -> approved -> completed/cancelled.
    pub fn validate_status_transition(
        &self,
        current: BookingStatus,
        new: BookingStatus,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition from {} to {}", current, new);

        if !self.valid_transitions(current).contains(&new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(SchedulingError::InvalidStatusTransition {
                from: current,
                to: new,
            });
        }

        Ok(())
    }

    /// All valid next statuses for a given current status.
    pub fn valid_transitions(&self, current: BookingStatus) -> Vec<BookingStatus> {
        match current {
            BookingStatus::Pending => vec![BookingStatus::Approved, BookingStatus::Cancelled],
            BookingStatus::Approved => vec![BookingStatus::Completed, BookingStatus::Cancelled],
            // Terminal states - no transitions allowed
            BookingStatus::Cancelled => vec![],
            BookingStatus::Completed => vec![],
        }
    }

    /// The interval during which the call room may be joined, inclusive at
    /// both ends.
    pub fn video_access_window(
        &self,
        appointment: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            appointment - Duration::minutes(JOIN_WINDOW_BEFORE_MINUTES),
            appointment + Duration::minutes(JOIN_WINDOW_AFTER_MINUTES),
        )
    }

    /// Whether the call may be joined right now. Only approved bookings ever
    /// qualify; the window is re-evaluated on every call since accessibility
    /// is purely a function of the clock.
    pub fn can_join_video(
        &self,
        status: BookingStatus,
        appointment: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        if status != BookingStatus::Approved {
            return false;
        }

        let (start, end) = self.video_access_window(appointment);
        now >= start && now <= end
    }
}

impl Default for BookingLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
