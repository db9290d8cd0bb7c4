// libs/scheduling-cell/src/store/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, DoctorProfile, PatientProfile, TimeSlot};

pub mod memory;
pub mod supabase;

pub use memory::{MemoryIdentity, MemoryStore};
pub use supabase::{SupabaseIdentity, SupabaseStore};

/// Persistence collaborator for slots and bookings.
///
/// `try_claim_slot` is the one atomic conditional update the engine relies
/// on: flipping a slot's booked flag succeeds for exactly one caller when
/// several race on the same slot.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn insert_slot(&self, slot: TimeSlot) -> Result<TimeSlot>;

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlot>>;

    /// Lookup by the (doctor, date, start) uniqueness key.
    async fn find_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<TimeSlot>>;

    /// Unbooked slots for one calendar day, ordered by start time ascending.
    async fn available_slots_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>>;

    /// All slots (booked included) in an optional date range, ordered by
    /// (date, start time).
    async fn slots_in_range(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimeSlot>>;

    /// Conditionally mark the slot booked and attach the booking reference.
    /// Returns false when the slot was already booked; the flag and the
    /// back-reference always change together.
    async fn try_claim_slot(&self, slot_id: Uuid, booking_id: Uuid) -> Result<bool>;

    /// Clear the booked flag and the booking back-reference together.
    async fn release_slot(&self, slot_id: Uuid) -> Result<()>;

    async fn delete_slot(&self, slot_id: Uuid) -> Result<()>;

    async fn insert_booking(&self, booking: Booking) -> Result<Booking>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>>;

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>>;

    async fn bookings_for_patient(&self, patient_id: Uuid) -> Result<Vec<Booking>>;

    async fn bookings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Booking>>;
}

/// Identity collaborator: resolves opaque identifiers to basic profile
/// fields. The engine only reads from it.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn resolve_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>>;

    async fn resolve_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>>;
}
