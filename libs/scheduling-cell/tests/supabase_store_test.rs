use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::store::{IdentityStore, SchedulingStore, SupabaseIdentity, SupabaseStore};
use shared_config::AppConfig;

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        auto_approve_direct_bookings: true,
    }
}

fn slot_row(id: Uuid, doctor_id: Uuid, is_booked: bool) -> Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "date": "2024-06-10",
        "start_time": "09:00:00",
        "end_time": "09:30:00",
        "day_of_week": 1,
        "is_booked": is_booked,
        "booking_id": null,
        "is_recurring": false,
        "created_at": "2024-06-01T00:00:00Z",
        "updated_at": "2024-06-01T00:00:00Z"
    })
}

fn booking_row(id: Uuid, patient_id: Uuid, doctor_id: Uuid, status: &str) -> Value {
    json!({
        "id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "price": 50.0,
        "status": status,
        "time_slot_id": null,
        "appointment_date": "2024-06-10",
        "appointment_time": "09:00:00",
        "video_room_id": format!("room_{}", Uuid::new_v4()),
        "notes": null,
        "is_paid": false,
        "created_at": "2024-06-01T00:00:00Z",
        "updated_at": "2024-06-01T00:00:00Z"
    })
}

#[tokio::test]
async fn claim_wins_when_the_filtered_patch_returns_the_row() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let booking_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(query_param("is_booked", "eq.false"))
        .and(header("Prefer", "return=representation"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([slot_row(slot_id, doctor_id, true)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let claimed = store.try_claim_slot(slot_id, booking_id).await.unwrap();
    assert!(claimed);
}

#[tokio::test]
async fn claim_loses_when_no_row_matched_the_filter() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();

    // An already-booked slot fails the is_booked=eq.false filter, so the
    // PATCH updates nothing and returns an empty representation.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let claimed = store.try_claim_slot(slot_id, Uuid::new_v4()).await.unwrap();
    assert!(!claimed);
}

#[tokio::test]
async fn available_slots_query_filters_and_orders() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let date: NaiveDate = "2024-06-10".parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2024-06-10"))
        .and(query_param("is_booked", "eq.false"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            slot_row(Uuid::new_v4(), doctor_id, false),
            slot_row(Uuid::new_v4(), doctor_id, false),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let slots = store.available_slots_for_day(doctor_id, date).await.unwrap();
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|s| !s.is_booked));
}

#[tokio::test]
async fn missing_slot_resolves_to_none() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let slot = store.get_slot(slot_id).await.unwrap();
    assert!(slot.is_none());
}

#[tokio::test]
async fn release_patches_the_slot_back_to_free() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([slot_row(slot_id, Uuid::new_v4(), false)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    store.release_slot(slot_id).await.unwrap();
}

#[tokio::test]
async fn status_update_returns_the_patched_booking() {
    let server = MockServer::start().await;
    let booking_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking_row(
            booking_id, patient_id, doctor_id, "approved"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let updated = store
        .set_booking_status(booking_id, scheduling_cell::models::BookingStatus::Approved)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, booking_id);
    assert_eq!(updated.status, scheduling_cell::models::BookingStatus::Approved);
}

#[tokio::test]
async fn patient_bookings_query_orders_newest_first() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking_row(
            Uuid::new_v4(),
            patient_id,
            Uuid::new_v4(),
            "pending"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let bookings = store.bookings_for_patient(patient_id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].patient_id, patient_id);
}

#[tokio::test]
async fn server_errors_surface_as_store_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&test_config(&server));
    let result = store.get_slot(Uuid::new_v4()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn doctor_identity_resolves_profile_fields() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(query_param("select", "id,full_name,consultation_fee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": doctor_id,
            "full_name": "Dr. Remote",
            "consultation_fee": 75.0
        }])))
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(&test_config(&server));
    let profile = identity.resolve_doctor(doctor_id).await.unwrap().unwrap();
    assert_eq!(profile.full_name, "Dr. Remote");
    assert_eq!(profile.consultation_fee, 75.0);

    let missing = identity.resolve_patient(Uuid::new_v4()).await;
    // No mock for patients; the 404 from the mock server surfaces as an error.
    assert!(missing.is_err());
}
