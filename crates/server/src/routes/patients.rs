//! Patient route handlers.
//!
//! Patients are created by doctors, so there is no signup here. A patient
//! can log in, manage its own profile, and book and view its appointments.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use clinic_core::AppointmentId;

use crate::error::Result;
use crate::middleware::RequirePatient;
use crate::models::{
    AppointmentView, BookAppointmentRequest, LoginRequest, PatientProfileUpdate,
    PatientProfileView,
};
use crate::routes::{ApiJson, ApiPath};
use crate::services::auth::AuthService;
use crate::services::records::RecordsService;
use crate::state::AppState;

/// Response body of a successful patient login.
#[derive(Debug, Serialize)]
pub struct PatientLoginResponse {
    pub access: String,
    pub refresh: String,
    pub patient: PatientProfileView,
}

/// Log a patient in.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<PatientLoginResponse>> {
    let login = AuthService::new(state.pool(), state.tokens())
        .login_patient(&request.email, &request.password)
        .await?;

    Ok(Json(PatientLoginResponse {
        access: login.tokens.access,
        refresh: login.tokens.refresh,
        patient: PatientProfileView::from(&login.patient),
    }))
}

/// Show the calling patient's profile.
pub async fn profile(
    State(state): State<AppState>,
    patient: RequirePatient,
) -> Result<Json<PatientProfileView>> {
    let profile = RecordsService::new(state.pool())
        .patient_profile(patient.principal(), patient.0)
        .await?;

    Ok(Json(PatientProfileView::from(&profile)))
}

/// Partially update the calling patient's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    patient: RequirePatient,
    ApiJson(request): ApiJson<PatientProfileUpdate>,
) -> Result<Json<PatientProfileView>> {
    let changes = request.validate()?;

    let profile = RecordsService::new(state.pool())
        .update_patient_profile(patient.principal(), patient.0, changes)
        .await?;

    Ok(Json(PatientProfileView::from(&profile)))
}

/// List the calling patient's appointments.
pub async fn list_appointments(
    State(state): State<AppState>,
    patient: RequirePatient,
) -> Result<Json<Vec<AppointmentView>>> {
    let appointments = RecordsService::new(state.pool())
        .list_appointments(patient.principal())
        .await?;

    Ok(Json(appointments.iter().map(AppointmentView::from).collect()))
}

/// Book an appointment for the calling patient.
pub async fn book_appointment(
    State(state): State<AppState>,
    patient: RequirePatient,
    ApiJson(request): ApiJson<BookAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let appointment = RecordsService::new(state.pool())
        .book_appointment(patient.principal(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(AppointmentView::from(&appointment))))
}

/// Show one of the calling patient's appointments.
pub async fn get_appointment(
    State(state): State<AppState>,
    patient: RequirePatient,
    ApiPath(id): ApiPath<AppointmentId>,
) -> Result<Json<AppointmentView>> {
    let appointment = RecordsService::new(state.pool())
        .get_appointment(patient.principal(), id)
        .await?;

    Ok(Json(AppointmentView::from(&appointment)))
}
