//! End-to-end tests for ownership-scoped access to patients and
//! appointments.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`clinic-cli migrate`)
//! - The clinic server running (`cargo run -p clinic-server`)
//! - `CLINIC_DATABASE_URL` pointing at the server's database
//!
//! Run with: `cargo test -p clinic-integration-tests -- --ignored`

use clinic_core::{AppointmentId, PatientId};
use clinic_integration_tests::{
    PASSWORD, TestContext, TestDoctor, TestPatient, connect_db, json_body,
};
use clinic_server::db::{AppointmentRepository, PatientRepository};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

/// A date far enough out that tests never collide with each other's slots.
fn unique_slot() -> (String, String) {
    let [a, b, ..] = Uuid::new_v4().into_bytes();
    let day = u32::from(a) % 28 + 1;
    let month = u32::from(b) % 12 + 1;
    let year = 2030 + u32::from(a ^ b) % 50;
    (format!("{year}-{month:02}-{day:02}"), "10:30".to_owned())
}

async fn book(ctx: &TestContext, patient: &TestPatient, doctor: &TestDoctor) -> Value {
    let (date, time) = unique_slot();
    let resp = ctx
        .post(
            "/patients/appointments",
            Some(&patient.access),
            &json!({"doctor": doctor.id, "date": date, "time": time, "reason": "Checkup"}),
        )
        .send()
        .await
        .expect("Failed to book appointment");
    assert_eq!(resp.status(), StatusCode::CREATED, "booking failed");
    json_body(resp).await
}

// ============================================================================
// Patients
// ============================================================================

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_created_patient_is_owned_by_creator() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let patient = ctx.patient(&doctor).await;

    let resp = ctx
        .get(&format!("/doctors/patients/{}", patient.id), Some(&doctor.access))
        .send()
        .await
        .expect("Failed to get patient");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["created_by"], json!(doctor.id));
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_other_doctor_cannot_read_patient() {
    let ctx = TestContext::new();
    let owner = ctx.doctor().await;
    let other = ctx.doctor().await;
    let patient = ctx.patient(&owner).await;

    let resp = ctx
        .get(&format!("/doctors/patients/{}", patient.id), Some(&other.access))
        .send()
        .await
        .expect("Failed to get patient");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // And the patient does not appear in the other doctor's roster
    let resp = ctx
        .get("/doctors/patients", Some(&other.access))
        .send()
        .await
        .expect("Failed to list patients");
    let roster = json_body(resp).await;
    assert!(
        roster
            .as_array()
            .is_some_and(|list| list.iter().all(|p| p["id"] != json!(patient.id)))
    );
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_missing_patient_is_not_found() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;

    let resp = ctx
        .get("/doctors/patients/2147483647", Some(&doctor.access))
        .send()
        .await
        .expect("Failed to get patient");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_created_by_in_body_is_ignored() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let other = ctx.doctor().await;

    let resp = ctx
        .post(
            "/doctors/patients",
            Some(&doctor.access),
            &json!({
                "first_name": "Sneaky",
                "last_name": "Patient",
                "email": clinic_integration_tests::unique_email("sneaky"),
                "password": PASSWORD,
                "created_by": other.id,
            }),
        )
        .send()
        .await
        .expect("Failed to create patient");
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["created_by"], json!(doctor.id));
}

// ============================================================================
// Appointments
// ============================================================================

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_patient_cannot_read_other_patients_appointment() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let alice = ctx.patient(&doctor).await;
    let bob = ctx.patient(&doctor).await;
    let appointment = book(&ctx, &alice, &doctor).await;
    let id = appointment["id"].as_i64().expect("appointment id");

    let resp = ctx
        .get(&format!("/patients/appointments/{id}"), Some(&alice.access))
        .send()
        .await
        .expect("Failed to get appointment");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .get(&format!("/patients/appointments/{id}"), Some(&bob.access))
        .send()
        .await
        .expect("Failed to get appointment");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_booking_starts_scheduled_and_lists_for_both_sides() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let patient = ctx.patient(&doctor).await;
    let appointment = book(&ctx, &patient, &doctor).await;

    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["patient"], json!(patient.id));

    for token in [&doctor.access, &patient.access] {
        let path = if token == &doctor.access {
            "/doctors/appointments"
        } else {
            "/patients/appointments"
        };
        let resp = ctx
            .get(path, Some(token))
            .send()
            .await
            .expect("Failed to list appointments");
        let list = json_body(resp).await;
        assert!(
            list.as_array()
                .is_some_and(|l| l.iter().any(|a| a["id"] == appointment["id"]))
        );
    }
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_double_booking_a_slot_is_rejected() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let alice = ctx.patient(&doctor).await;
    let bob = ctx.patient(&doctor).await;
    let first = book(&ctx, &alice, &doctor).await;

    let resp = ctx
        .post(
            "/patients/appointments",
            Some(&bob.access),
            &json!({"doctor": doctor.id, "date": first["date"], "time": first["time"]}),
        )
        .send()
        .await
        .expect("Failed to book appointment");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["errors"]["time"].is_array());
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_booking_unknown_doctor_is_a_field_error() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let patient = ctx.patient(&doctor).await;

    let resp = ctx
        .post(
            "/patients/appointments",
            Some(&patient.access),
            &json!({"doctor": 2_147_483_647, "date": "2031-01-02", "time": "09:00"}),
        )
        .send()
        .await
        .expect("Failed to book appointment");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["errors"]["doctor"].is_array());
}

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_only_owning_doctor_updates_appointment() {
    let ctx = TestContext::new();
    let doctor = ctx.doctor().await;
    let other = ctx.doctor().await;
    let patient = ctx.patient(&doctor).await;
    let appointment = book(&ctx, &patient, &doctor).await;
    let path = format!(
        "/doctors/appointments/{}",
        appointment["id"].as_i64().expect("appointment id")
    );

    let resp = ctx
        .patch(&path, &other.access, &json!({"status": "completed"}))
        .send()
        .await
        .expect("Failed to update appointment");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .patch(&path, &doctor.access, &json!({"status": "rescheduled"}))
        .send()
        .await
        .expect("Failed to update appointment");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["errors"]["status"].is_array());

    let resp = ctx
        .patch(&path, &doctor.access, &json!({"status": "completed"}))
        .send()
        .await
        .expect("Failed to update appointment");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "completed");
}

// ============================================================================
// Account deletion
// ============================================================================

#[tokio::test]
#[ignore = "Requires running clinic server and PostgreSQL"]
async fn test_deleting_doctor_removes_patients_and_appointments() {
    let ctx = TestContext::new();
    let pool = connect_db().await;
    let doctor = ctx.doctor().await;
    let bystander = ctx.doctor().await;
    let patient = ctx.patient(&doctor).await;
    let appointment = book(&ctx, &patient, &doctor).await;
    let appointment_id = appointment["id"].as_i64().expect("appointment id");

    doctor.delete(&pool).await;

    let resp = ctx
        .post_credentials(
            "/patients/login",
            &json!({"email": patient.email, "password": PASSWORD}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .patch(
            &format!("/doctors/appointments/{appointment_id}"),
            &bystander.access,
            &json!({"status": "completed"}),
        )
        .send()
        .await
        .expect("Failed to update appointment");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let patient_id = PatientId::new(i32::try_from(patient.id).expect("patient id fits i32"));
    let appointment_id =
        AppointmentId::new(i32::try_from(appointment_id).expect("appointment id fits i32"));
    assert!(
        PatientRepository::new(&pool)
            .get_by_id(patient_id)
            .await
            .expect("Failed to look up patient")
            .is_none()
    );
    assert!(
        AppointmentRepository::new(&pool)
            .get_by_id(appointment_id)
            .await
            .expect("Failed to look up appointment")
            .is_none()
    );
}
