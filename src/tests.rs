// HTTP tests for the Optica booking API
// Runs the full router against the in-memory store

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use crate::booking::{Appointment, AppointmentStatus, InMemoryBookingStore};
use crate::models::{AvailabilityWindow, Branch, DayOfWeek, Practitioner, TimeSlot};

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    server: TestServer,
    store: InMemoryBookingStore,
    branch_id: Uuid,
    practitioner_id: Uuid,
}

/// One branch with one practitioner working Monday mornings
async fn create_test_app() -> Fixture {
    let store = InMemoryBookingStore::new();
    let branch_id = Uuid::new_v4();
    store
        .add_branch(Branch {
            id: branch_id,
            name: "Central".to_string(),
            address: "5 Market Sq".to_string(),
            phone: None,
            email: Some("central@optica.test".to_string()),
        })
        .await;

    let practitioner_id = Uuid::new_v4();
    store
        .add_practitioner(Practitioner {
            id: practitioner_id,
            staff_member_id: Uuid::new_v4(),
            specialty: "Contact lenses".to_string(),
            license_number: "OPT-77".to_string(),
            years_experience: 9,
            availability_windows: vec![AvailabilityWindow {
                weekday: DayOfWeek::Monday,
                start_time: TimeSlot::parse("08:00").unwrap(),
                end_time: TimeSlot::parse("12:00").unwrap(),
            }],
            assigned_branch_ids: vec![branch_id],
            is_generally_available: true,
        })
        .await;

    let app = create_router(AppState::new(Arc::new(store.clone())));

    Fixture {
        server: TestServer::new(app).unwrap(),
        store,
        branch_id,
        practitioner_id,
    }
}

fn booking_payload(branch_id: Uuid) -> serde_json::Value {
    json!({
        "branchId": branch_id,
        "date": "2024-06-10",
        "time": "9:00",
        "status": "scheduled",
        "reason": "Annual eye exam",
        "lensType": "progressive"
    })
}

// ============================================================================
// POST /api/appointments
// ============================================================================

#[tokio::test]
async fn test_create_appointment_success() {
    let fixture = create_test_app().await;

    let response = fixture
        .server
        .post("/api/appointments")
        .json(&booking_payload(fixture.branch_id))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let appointment: Appointment = response.json();
    assert_eq!(appointment.practitioner_id, Some(fixture.practitioner_id));
    assert_eq!(appointment.time_slot.as_str(), "09:00");
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.lens_type.as_deref(), Some("progressive"));
    assert_eq!(appointment.client_id, None);
}

#[tokio::test]
async fn test_create_appointment_missing_time() {
    let fixture = create_test_app().await;
    let mut payload = booking_payload(fixture.branch_id);
    payload.as_object_mut().unwrap().remove("time");

    let response = fixture.server.post("/api/appointments").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("time"));
    assert!(fixture.store.appointments().await.is_empty());
}

#[tokio::test]
async fn test_create_appointment_missing_reason() {
    let fixture = create_test_app().await;
    let mut payload = booking_payload(fixture.branch_id);
    payload.as_object_mut().unwrap().remove("reason");

    let response = fixture.server.post("/api/appointments").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(fixture.store.appointments().await.is_empty());
}

#[tokio::test]
async fn test_create_appointment_conflict_when_slot_taken() {
    let fixture = create_test_app().await;
    let payload = booking_payload(fixture.branch_id);

    let first = fixture.server.post("/api/appointments").json(&payload).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = fixture.server.post("/api/appointments").json(&payload).await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    let body: serde_json::Value = second.json();
    assert_eq!(body["error_code"], "NO_PRACTITIONER_AVAILABLE");
    assert_eq!(body["details"]["reason"], "no_available_practitioner");
    assert_eq!(fixture.store.appointments().await.len(), 1);
}

#[tokio::test]
async fn test_create_appointment_explicit_practitioner_conflict() {
    let fixture = create_test_app().await;
    let mut payload = booking_payload(fixture.branch_id);
    payload["practitionerId"] = json!(fixture.practitioner_id);

    let first = fixture.server.post("/api/appointments").json(&payload).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = fixture.server.post("/api/appointments").json(&payload).await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    let body: serde_json::Value = second.json();
    assert_eq!(body["details"]["reason"], "concurrent_booking_lost");
}

#[tokio::test]
async fn test_create_appointment_malformed_fields() {
    let fixture = create_test_app().await;

    let mut bad_branch = booking_payload(fixture.branch_id);
    bad_branch["branchId"] = json!("not-a-uuid");
    let mut numeric_time = booking_payload(fixture.branch_id);
    numeric_time["time"] = json!(900);

    for payload in [bad_branch, numeric_time] {
        let response = fixture.server.post("/api/appointments").json(&payload).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
        assert!(body["timestamp"].is_string());
    }
    assert!(fixture.store.appointments().await.is_empty());
}

#[tokio::test]
async fn test_create_appointment_outside_hours() {
    let fixture = create_test_app().await;
    let mut payload = booking_payload(fixture.branch_id);
    payload["time"] = json!("14:00");

    let response = fixture.server.post("/api/appointments").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_appointment_unknown_branch() {
    let fixture = create_test_app().await;

    let response = fixture
        .server
        .post("/api/appointments")
        .json(&booking_payload(Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Reads and status updates
// ============================================================================

#[tokio::test]
async fn test_get_and_list_appointments() {
    let fixture = create_test_app().await;
    let created: Appointment = fixture
        .server
        .post("/api/appointments")
        .json(&booking_payload(fixture.branch_id))
        .await
        .json();

    let response = fixture
        .server
        .get(&format!("/api/appointments/{}", created.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Appointment>(), created);

    let response = fixture
        .server
        .get("/api/appointments")
        .add_query_param("branch_id", fixture.branch_id)
        .add_query_param("date", "2024-06-10")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Vec<Appointment> = response.json();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_get_appointment_not_found() {
    let fixture = create_test_app().await;

    let response = fixture
        .server
        .get(&format!("/api/appointments/{}", Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_update_status_flow() {
    let fixture = create_test_app().await;
    let created: Appointment = fixture
        .server
        .post("/api/appointments")
        .json(&booking_payload(fixture.branch_id))
        .await
        .json();
    let path = format!("/api/appointments/{}/status", created.id);

    let response = fixture
        .server
        .patch(&path)
        .json(&json!({ "status": "confirmed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Appointment>().status, AppointmentStatus::Confirmed);

    let response = fixture
        .server
        .patch(&path)
        .json(&json!({ "status": "scheduled" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_envelope() {
    let fixture = create_test_app().await;

    let response = fixture.server.get("/api/appointments/not-a-uuid").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "VALIDATION_ERROR");

    let response = fixture
        .server
        .get("/api/appointments")
        .add_query_param("date", "10/06/2024")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "VALIDATION_ERROR");

    let response = fixture
        .server
        .get("/api/availability")
        .add_query_param("branch_id", fixture.branch_id)
        .add_query_param("date", "2024-06-10")
        .add_query_param("time", "25:00")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>()["error_code"], "VALIDATION_ERROR");
}

// ============================================================================
// Availability, metrics, health
// ============================================================================

#[tokio::test]
async fn test_availability_preview() {
    let fixture = create_test_app().await;

    let response = fixture
        .server
        .get("/api/availability")
        .add_query_param("branch_id", fixture.branch_id)
        .add_query_param("date", "2024-06-10")
        .add_query_param("time", "10:30")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["weekday"], "monday");
    assert_eq!(body["time"], "10:30");
    assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(body["suggested_practitioner_id"], json!(fixture.practitioner_id));
    assert!(fixture.store.appointments().await.is_empty());
}

#[tokio::test]
async fn test_booking_metrics_endpoint() {
    let fixture = create_test_app().await;
    fixture
        .server
        .post("/api/appointments")
        .json(&booking_payload(fixture.branch_id))
        .await;

    let body: serde_json::Value = fixture.server.get("/api/metrics/booking").await.json();

    assert_eq!(body["bookings_attempted"], 1);
    assert_eq!(body["bookings_committed"], 1);
}

#[tokio::test]
async fn test_health_check() {
    let fixture = create_test_app().await;

    let response = fixture.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let fixture = create_test_app().await;

    let response = fixture.server.get("/api/nowhere").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "NOT_FOUND");
}
