// libs/scheduling-cell/src/store/supabase.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Booking, BookingStatus, DoctorProfile, PatientProfile, TimeSlot};
use crate::store::{IdentityStore, SchedulingStore};

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// Supabase-backed store. The conditional claim is a filtered PATCH on
/// `is_booked=eq.false`: PostgREST applies the update only to matching rows
/// and returns them, so an empty result set means the race was lost.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn parse_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| anyhow!("row parse error: {e}")))
            .collect()
    }
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn insert_slot(&self, slot: TimeSlot) -> Result<TimeSlot> {
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/time_slots",
                Some(serde_json::to_value(&slot)?),
                Some(representation_headers()),
            )
            .await?;

        let mut rows: Vec<TimeSlot> = Self::parse_rows(result)?;
        rows.pop().ok_or_else(|| anyhow!("failed to insert time slot"))
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlot>> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", slot_id);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(Self::parse_rows(result)?.pop())
    }

    async fn find_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<TimeSlot>> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&date=eq.{}&start_time=eq.{}",
            doctor_id,
            date,
            start_time.format("%H:%M:%S")
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(Self::parse_rows(result)?.pop())
    }

    async fn available_slots_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&date=eq.{}&is_booked=eq.false&order=start_time.asc",
            doctor_id, date
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::parse_rows(result)
    }

    async fn slots_in_range(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimeSlot>> {
        let mut path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&order=date.asc,start_time.asc",
            doctor_id
        );
        if let Some(from) = from {
            path.push_str(&format!("&date=gte.{}", from));
        }
        if let Some(to) = to {
            path.push_str(&format!("&date=lte.{}", to));
        }

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::parse_rows(result)
    }

    async fn try_claim_slot(&self, slot_id: Uuid, booking_id: Uuid) -> Result<bool> {
        let path = format!("/rest/v1/time_slots?id=eq.{}&is_booked=eq.false", slot_id);
        let body = json!({
            "is_booked": true,
            "booking_id": booking_id,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(representation_headers()),
            )
            .await?;

        let claimed = !result.is_empty();
        debug!("Claim of slot {} by booking {}: {}", slot_id, booking_id, claimed);
        Ok(claimed)
    }

    async fn release_slot(&self, slot_id: Uuid) -> Result<()> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", slot_id);
        let body = json!({
            "is_booked": false,
            "booking_id": Value::Null,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(representation_headers()),
            )
            .await?;
        Ok(())
    }

    async fn delete_slot(&self, slot_id: Uuid) -> Result<()> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", slot_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await?;
        Ok(())
    }

    async fn insert_booking(&self, booking: Booking) -> Result<Booking> {
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/bookings",
                Some(serde_json::to_value(&booking)?),
                Some(representation_headers()),
            )
            .await?;

        let mut rows: Vec<Booking> = Self::parse_rows(result)?;
        rows.pop().ok_or_else(|| anyhow!("failed to insert booking"))
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(Self::parse_rows(result)?.pop())
    }

    async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let body = json!({
            "status": status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(representation_headers()),
            )
            .await?;
        Ok(Self::parse_rows(result)?.pop())
    }

    async fn bookings_for_patient(&self, patient_id: Uuid) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::parse_rows(result)
    }

    async fn bookings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/bookings?doctor_id=eq.{}&order=created_at.desc",
            doctor_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Self::parse_rows(result)
    }
}

/// Identity lookups against the doctors/patients tables.
pub struct SupabaseIdentity {
    supabase: SupabaseClient,
}

impl SupabaseIdentity {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl IdentityStore for SupabaseIdentity {
    async fn resolve_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=id,full_name,consultation_fee",
            doctor_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(SupabaseStore::parse_rows(result)?.pop())
    }

    async fn resolve_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>> {
        let path = format!(
            "/rest/v1/patients?id=eq.{}&select=id,full_name",
            patient_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(SupabaseStore::parse_rows(result)?.pop())
    }
}
