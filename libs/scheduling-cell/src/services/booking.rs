// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, BookSlotRequest, DirectBookingRequest, SchedulingError,
    VideoAccess, parse_hhmm,
};
use crate::services::lifecycle::BookingLifecycleService;
use crate::store::{IdentityStore, SchedulingStore};

/// Sentinel appointment time for ad-hoc bookings made without a slot.
const DIRECT_BOOKING_TIME: NaiveTime = NaiveTime::MIN;

pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    identity: Arc<dyn IdentityStore>,
    lifecycle: BookingLifecycleService,
    auto_approve_direct: bool,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        identity: Arc<dyn IdentityStore>,
        auto_approve_direct: bool,
    ) -> Self {
        Self {
            store,
            identity,
            lifecycle: BookingLifecycleService::new(),
            auto_approve_direct,
        }
    }

    /// Book a concrete time slot. The slot claim and the booking insert form
    /// one atomic unit: the claim is a conditional update only one caller
    /// can win, and a failed insert releases the claim again.
    pub async fn book_slot(&self, request: BookSlotRequest) -> Result<Booking, SchedulingError> {
        info!(
            "Booking slot {} for patient {}",
            request.slot_id, request.patient_id
        );

        let slot = self
            .store
            .get_slot(request.slot_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::SlotNotFound)?;

        if slot.is_booked {
            return Err(SchedulingError::SlotAlreadyBooked);
        }

        let booking_id = Uuid::new_v4();
        let claimed = self
            .store
            .try_claim_slot(slot.id, booking_id)
            .await
            .map_err(unavailable)?;
        if !claimed {
            debug!("Lost claim race for slot {}", slot.id);
            return Err(SchedulingError::SlotAlreadyBooked);
        }

        let now = Utc::now();
        let booking = Booking {
            id: booking_id,
            patient_id: request.patient_id,
            doctor_id: slot.doctor_id,
            price: request.price,
            status: BookingStatus::Pending,
            time_slot_id: Some(slot.id),
            appointment_date: slot.date,
            appointment_time: slot.start_time,
            video_room_id: generate_room_id(),
            notes: request.notes,
            is_paid: false,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_booking(booking).await {
            Ok(booking) => {
                info!(
                    "Booked slot {} as booking {} (room {})",
                    slot.id, booking.id, booking.video_room_id
                );
                Ok(booking)
            }
            Err(err) => {
                // Undo the claim so the slot is not stranded without a
                // booking behind it.
                if let Err(release_err) = self.store.release_slot(slot.id).await {
                    warn!(
                        "Failed to release slot {} after booking insert failure: {}",
                        slot.id, release_err
                    );
                }
                Err(unavailable(err))
            }
        }
    }

    /// Ad-hoc booking without a slot. Appointment date defaults to today and
    /// the time to a midnight sentinel; approval and payment follow the
    /// configured policy.
    pub async fn create_direct_booking(
        &self,
        doctor_id: Uuid,
        request: DirectBookingRequest,
    ) -> Result<Booking, SchedulingError> {
        info!(
            "Creating direct booking for patient {} with doctor {}",
            request.patient_id, doctor_id
        );

        let doctor = self
            .identity
            .resolve_doctor(doctor_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::DoctorNotFound)?;
        self.identity
            .resolve_patient(request.patient_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::PatientNotFound)?;

        let appointment_time = match &request.appointment_time {
            Some(value) => parse_hhmm(value)?,
            None => DIRECT_BOOKING_TIME,
        };

        let (status, is_paid) = if self.auto_approve_direct {
            (BookingStatus::Approved, true)
        } else {
            (BookingStatus::Pending, false)
        };

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id,
            price: doctor.consultation_fee,
            status,
            time_slot_id: None,
            appointment_date: request.appointment_date.unwrap_or_else(|| now.date_naive()),
            appointment_time,
            video_room_id: generate_room_id(),
            notes: request.notes,
            is_paid,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_booking(booking).await.map_err(unavailable)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, SchedulingError> {
        self.store
            .get_booking(booking_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::BookingNotFound)
    }

    /// Move a booking along the status lifecycle. Transitions outside the
    /// monotone table are rejected; terminal statuses never change.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, SchedulingError> {
        let booking = self.get_booking(booking_id).await?;

        self.lifecycle
            .validate_status_transition(booking.status, new_status)?;

        let updated = self
            .store
            .set_booking_status(booking_id, new_status)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::BookingNotFound)?;

        // Cancellation frees the slot no matter which path requested it.
        if new_status == BookingStatus::Cancelled {
            self.release_linked_slot(&booking).await?;
        }

        info!(
            "Booking {} status {} -> {}",
            booking_id, booking.status, new_status
        );
        Ok(updated)
    }

    /// Cancel a booking on behalf of its owning patient and release the
    /// originating slot back to availability.
    pub async fn cancel_booking(
        &self,
        patient_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, SchedulingError> {
        let booking = self.get_booking(booking_id).await?;

        if booking.patient_id != patient_id {
            return Err(SchedulingError::NotBookingOwner);
        }
        match booking.status {
            BookingStatus::Cancelled => return Err(SchedulingError::AlreadyCancelled),
            BookingStatus::Completed => return Err(SchedulingError::CannotCancelCompleted),
            _ => {}
        }

        let cancelled = self
            .store
            .set_booking_status(booking_id, BookingStatus::Cancelled)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::BookingNotFound)?;

        self.release_linked_slot(&booking).await?;

        info!("Booking {} cancelled by patient {}", booking_id, patient_id);
        Ok(cancelled)
    }

    /// Put the originating slot back into availability, if there is one.
    async fn release_linked_slot(&self, booking: &Booking) -> Result<(), SchedulingError> {
        if let Some(slot_id) = booking.time_slot_id {
            self.store.release_slot(slot_id).await.map_err(unavailable)?;
            debug!("Released slot {} after cancellation of {}", slot_id, booking.id);
        }
        Ok(())
    }

    /// The time-windowed gate on the booking's call room. Pure of side
    /// effects; `now` is passed in so the predicate is evaluated fresh on
    /// every check.
    pub async fn check_video_access(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoAccess, SchedulingError> {
        let booking = self.get_booking(booking_id).await?;

        if booking.status != BookingStatus::Approved {
            return Ok(VideoAccess {
                accessible: false,
                room_id: None,
                reason: Some(format!(
                    "Booking is {}; video access requires an approved booking",
                    booking.status
                )),
            });
        }

        let appointment = booking.appointment_datetime();
        if self
            .lifecycle
            .can_join_video(booking.status, appointment, now)
        {
            Ok(VideoAccess {
                accessible: true,
                room_id: Some(booking.video_room_id),
                reason: None,
            })
        } else {
            let (start, end) = self.lifecycle.video_access_window(appointment);
            Ok(VideoAccess {
                accessible: false,
                room_id: None,
                reason: Some(format!(
                    "Video call can be joined between {} and {}",
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%Y-%m-%d %H:%M")
                )),
            })
        }
    }

    pub async fn get_patient_bookings(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Booking>, SchedulingError> {
        self.store
            .bookings_for_patient(patient_id)
            .await
            .map_err(unavailable)
    }

    pub async fn get_doctor_bookings(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Booking>, SchedulingError> {
        self.store
            .bookings_for_doctor(doctor_id)
            .await
            .map_err(unavailable)
    }
}

fn generate_room_id() -> String {
    format!("room_{}", Uuid::new_v4())
}

fn unavailable(err: anyhow::Error) -> SchedulingError {
    SchedulingError::Unavailable(err.to_string())
}
