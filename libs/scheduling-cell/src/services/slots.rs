// libs/scheduling-cell/src/services/slots.rs
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    CreateSlotsRequest, SchedulingError, SlotInterval, TimeSlot, WeeklyScheduleRequest,
    parse_hhmm,
};
use crate::store::{IdentityStore, SchedulingStore};

const DEFAULT_WEEKS_AHEAD: u32 = 4;

pub fn day_of_week(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

pub struct SlotService {
    store: Arc<dyn SchedulingStore>,
    identity: Arc<dyn IdentityStore>,
}

impl SlotService {
    pub fn new(store: Arc<dyn SchedulingStore>, identity: Arc<dyn IdentityStore>) -> Self {
        Self { store, identity }
    }

    /// Create one or more slots for a single date.
    pub async fn create_slots(
        &self,
        request: CreateSlotsRequest,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        info!(
            "Creating {} slot(s) for doctor {} on {}",
            request.slots.len(),
            request.doctor_id,
            request.date
        );

        self.verify_doctor(request.doctor_id).await?;

        // Validate the whole batch before inserting anything, so a bad
        // interval cannot leave a partial batch behind.
        let mut pending: Vec<TimeSlot> = Vec::with_capacity(request.slots.len());
        for interval in &request.slots {
            let slot = self
                .build_slot(request.doctor_id, request.date, interval, false)
                .await?;

            // One slot per (doctor, date, start); duplicates are rejected
            // rather than silently stacked.
            let in_batch = pending.iter().any(|s| s.start_time == slot.start_time);
            if in_batch
                || self
                    .store
                    .find_slot(request.doctor_id, request.date, slot.start_time)
                    .await
                    .map_err(unavailable)?
                    .is_some()
            {
                return Err(SchedulingError::SlotExists {
                    date: request.date,
                    start_time: interval.start_time.clone(),
                });
            }

            pending.push(slot);
        }

        let mut created = Vec::with_capacity(pending.len());
        for slot in pending {
            let slot = self.store.insert_slot(slot).await.map_err(unavailable)?;
            created.push(slot);
        }

        Ok(created)
    }

    /// Expand a weekly template over the coming weeks. Slots that already
    /// exist for (doctor, date, start) are skipped, so re-running the same
    /// template is a no-op beyond the first invocation.
    pub async fn generate_weekly_slots(
        &self,
        request: WeeklyScheduleRequest,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        let weeks_ahead = request.weeks_ahead.unwrap_or(DEFAULT_WEEKS_AHEAD);
        info!(
            "Generating weekly slots for doctor {} from {} over {} week(s)",
            request.doctor_id, request.start_date, weeks_ahead
        );

        self.verify_doctor(request.doctor_id).await?;

        let mut created = Vec::new();
        for week in 0..weeks_ahead {
            for day in 0..7u8 {
                let Some(intervals) = request.schedule.get(&day) else {
                    continue;
                };
                if intervals.is_empty() {
                    continue;
                }

                let date =
                    request.start_date + Duration::days((week as i64) * 7 + day as i64);

                for interval in intervals {
                    let slot = self
                        .build_slot(request.doctor_id, date, interval, true)
                        .await?;

                    let existing = self
                        .store
                        .find_slot(request.doctor_id, date, slot.start_time)
                        .await
                        .map_err(unavailable)?;
                    if existing.is_some() {
                        debug!(
                            "Slot for doctor {} at {} {} already exists, skipping",
                            request.doctor_id, date, interval.start_time
                        );
                        continue;
                    }

                    let slot = self.store.insert_slot(slot).await.map_err(unavailable)?;
                    created.push(slot);
                }
            }
        }

        info!("Created {} recurring slot(s)", created.len());
        Ok(created)
    }

    /// Unbooked slots for the doctor on the given calendar day, start time
    /// ascending. Read-only.
    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        debug!("Fetching available slots for doctor {} on {}", doctor_id, date);
        self.store
            .available_slots_for_day(doctor_id, date)
            .await
            .map_err(unavailable)
    }

    /// All slots in an optional date range, for the calendar view.
    pub async fn get_doctor_slots(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        debug!("Fetching slot calendar for doctor {}", doctor_id);
        self.store
            .slots_in_range(doctor_id, from, to)
            .await
            .map_err(unavailable)
    }

    /// Delete an unbooked slot. The owning doctor only; a booked slot is
    /// never deleted.
    pub async fn delete_slot(
        &self,
        doctor_id: Uuid,
        slot_id: Uuid,
    ) -> Result<(), SchedulingError> {
        let slot = self
            .store
            .get_slot(slot_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::SlotNotFound)?;

        if slot.doctor_id != doctor_id {
            return Err(SchedulingError::SlotNotFound);
        }
        if slot.is_booked {
            return Err(SchedulingError::SlotInUse);
        }

        self.store.delete_slot(slot_id).await.map_err(unavailable)?;
        info!("Deleted slot {} for doctor {}", slot_id, doctor_id);
        Ok(())
    }

    async fn verify_doctor(&self, doctor_id: Uuid) -> Result<(), SchedulingError> {
        self.identity
            .resolve_doctor(doctor_id)
            .await
            .map_err(unavailable)?
            .ok_or(SchedulingError::DoctorNotFound)?;
        Ok(())
    }

    async fn build_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        interval: &SlotInterval,
        is_recurring: bool,
    ) -> Result<TimeSlot, SchedulingError> {
        let start_time = parse_hhmm(&interval.start_time)?;
        let end_time = parse_hhmm(&interval.end_time)?;
        if start_time >= end_time {
            return Err(SchedulingError::InvalidTime(format!(
                "start {} must be before end {}",
                interval.start_time, interval.end_time
            )));
        }

        let now = Utc::now();
        Ok(TimeSlot {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            start_time,
            end_time,
            day_of_week: day_of_week(date),
            is_booked: false,
            booking_id: None,
            is_recurring,
            created_at: now,
            updated_at: now,
        })
    }
}

fn unavailable(err: anyhow::Error) -> SchedulingError {
    SchedulingError::Unavailable(err.to_string())
}
