// libs/scheduling-cell/src/store/memory.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, DoctorProfile, PatientProfile, TimeSlot};
use crate::store::{IdentityStore, SchedulingStore};

/// In-memory store used by tests and as the fallback when no database is
/// configured. The claim in `try_claim_slot` runs under the write lock, so
/// concurrent bookings of one slot resolve to a single winner.
pub struct MemoryStore {
    slots: Arc<RwLock<HashMap<Uuid, TimeSlot>>>,
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            bookings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            bookings: Arc::clone(&self.bookings),
        }
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn insert_slot(&self, slot: TimeSlot) -> Result<TimeSlot> {
        let mut slots = self.slots.write().await;
        slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlot>> {
        let slots = self.slots.read().await;
        Ok(slots.get(&slot_id).cloned())
    }

    async fn find_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<TimeSlot>> {
        let slots = self.slots.read().await;
        Ok(slots
            .values()
            .find(|s| s.doctor_id == doctor_id && s.date == date && s.start_time == start_time)
            .cloned())
    }

    async fn available_slots_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>> {
        let slots = self.slots.read().await;
        let mut result: Vec<TimeSlot> = slots
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.date == date && !s.is_booked)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(result)
    }

    async fn slots_in_range(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimeSlot>> {
        let slots = self.slots.read().await;
        let mut result: Vec<TimeSlot> = slots
            .values()
            .filter(|s| {
                s.doctor_id == doctor_id
                    && from.map(|d| s.date >= d).unwrap_or(true)
                    && to.map(|d| s.date <= d).unwrap_or(true)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(result)
    }

    async fn try_claim_slot(&self, slot_id: Uuid, booking_id: Uuid) -> Result<bool> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if !slot.is_booked => {
                slot.is_booked = true;
                slot.booking_id = Some(booking_id);
                slot.updated_at = Utc::now();
                Ok(true)
            }
            Some(_) => {
                debug!("Slot {} already claimed", slot_id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn release_slot(&self, slot_id: Uuid) -> Result<()> {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(&slot_id) {
            slot.is_booked = false;
            slot.booking_id = None;
            slot.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_slot(&self, slot_id: Uuid) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.remove(&slot_id);
        Ok(())
    }

    async fn insert_booking(&self, booking: Booking) -> Result<Booking> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&booking_id).cloned())
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.get_mut(&booking_id).map(|booking| {
            booking.status = status;
            booking.updated_at = Utc::now();
            booking.clone()
        }))
    }

    async fn bookings_for_patient(&self, patient_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn bookings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.doctor_id == doctor_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

/// In-memory identity lookup. Profiles are registered up front; the
/// permissive mode synthesizes a profile for any identifier, which keeps the
/// API usable in storage-less development runs.
pub struct MemoryIdentity {
    doctors: Arc<RwLock<HashMap<Uuid, DoctorProfile>>>,
    patients: Arc<RwLock<HashMap<Uuid, PatientProfile>>>,
    allow_unknown: bool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            doctors: Arc::new(RwLock::new(HashMap::new())),
            patients: Arc::new(RwLock::new(HashMap::new())),
            allow_unknown: false,
        }
    }

    pub fn permissive() -> Self {
        Self {
            allow_unknown: true,
            ..Self::new()
        }
    }

    pub async fn register_doctor(&self, profile: DoctorProfile) {
        let mut doctors = self.doctors.write().await;
        doctors.insert(profile.id, profile);
    }

    pub async fn register_patient(&self, profile: PatientProfile) {
        let mut patients = self.patients.write().await;
        patients.insert(profile.id, profile);
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentity {
    async fn resolve_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>> {
        let doctors = self.doctors.read().await;
        if let Some(profile) = doctors.get(&doctor_id) {
            return Ok(Some(profile.clone()));
        }
        if self.allow_unknown {
            return Ok(Some(DoctorProfile {
                id: doctor_id,
                full_name: "Unknown Doctor".to_string(),
                consultation_fee: 0.0,
            }));
        }
        Ok(None)
    }

    async fn resolve_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>> {
        let patients = self.patients.read().await;
        if let Some(profile) = patients.get(&patient_id) {
            return Ok(Some(profile.clone()));
        }
        if self.allow_unknown {
            return Ok(Some(PatientProfile {
                id: patient_id,
                full_name: "Unknown Patient".to_string(),
            }));
        }
        Ok(None)
    }
}
