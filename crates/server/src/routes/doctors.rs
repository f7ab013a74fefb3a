//! Doctor route handlers.
//!
//! Signup and login are public; everything else requires a doctor's access
//! token and is scoped to that doctor's own records.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use clinic_core::{AppointmentId, DoctorId, FieldErrors, PatientId};

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireDoctor;
use crate::models::{
    AppointmentUpdateRequest, AppointmentView, DoctorProfileUpdate, DoctorProfileView,
    DoctorSignupRequest, LoginRequest, NewPatientRequest, PatientRecordView,
};
use crate::routes::{ApiJson, ApiPath};
use crate::services::auth::{AuthError, AuthService, TokenPair};
use crate::services::records::RecordsService;
use crate::state::AppState;

/// Response body of a successful signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: DoctorId,
}

/// Register a new doctor.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DoctorSignupRequest>,
) -> Result<impl IntoResponse> {
    let doctor = request.validate()?;

    let created = AuthService::new(state.pool(), state.tokens())
        .register_doctor(&doctor)
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::Conflict(_)) => AppError::Validation(
                FieldErrors::single("email", "A doctor with this email already exists."),
            ),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(SignupResponse { id: created.id })))
}

/// Log a doctor in.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = AuthService::new(state.pool(), state.tokens())
        .login_doctor(&request.email, &request.password)
        .await?;

    Ok(Json(tokens))
}

/// Show the calling doctor's profile.
pub async fn profile(
    State(state): State<AppState>,
    doctor: RequireDoctor,
) -> Result<Json<DoctorProfileView>> {
    let profile = RecordsService::new(state.pool())
        .doctor_profile(doctor.principal(), doctor.0)
        .await?;

    Ok(Json(DoctorProfileView::from(&profile)))
}

/// Partially update the calling doctor's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    doctor: RequireDoctor,
    ApiJson(request): ApiJson<DoctorProfileUpdate>,
) -> Result<Json<DoctorProfileView>> {
    let changes = request.validate()?;

    let profile = RecordsService::new(state.pool())
        .update_doctor_profile(doctor.principal(), doctor.0, changes)
        .await?;

    Ok(Json(DoctorProfileView::from(&profile)))
}

/// Create a patient owned by the calling doctor.
pub async fn create_patient(
    State(state): State<AppState>,
    doctor: RequireDoctor,
    ApiJson(request): ApiJson<NewPatientRequest>,
) -> Result<impl IntoResponse> {
    let patient = request.validate()?;

    let created = RecordsService::new(state.pool())
        .create_patient(doctor.principal(), &patient)
        .await?;

    Ok((StatusCode::CREATED, Json(PatientRecordView::from(&created))))
}

/// List the calling doctor's patients.
pub async fn list_patients(
    State(state): State<AppState>,
    doctor: RequireDoctor,
) -> Result<Json<Vec<PatientRecordView>>> {
    let patients = RecordsService::new(state.pool())
        .list_patients(doctor.principal())
        .await?;

    Ok(Json(patients.iter().map(PatientRecordView::from).collect()))
}

/// Show one of the calling doctor's patients.
pub async fn get_patient(
    State(state): State<AppState>,
    doctor: RequireDoctor,
    ApiPath(id): ApiPath<PatientId>,
) -> Result<Json<PatientRecordView>> {
    let patient = RecordsService::new(state.pool())
        .get_patient(doctor.principal(), id)
        .await?;

    Ok(Json(PatientRecordView::from(&patient)))
}

/// List appointments with the calling doctor.
pub async fn list_appointments(
    State(state): State<AppState>,
    doctor: RequireDoctor,
) -> Result<Json<Vec<AppointmentView>>> {
    let appointments = RecordsService::new(state.pool())
        .list_appointments(doctor.principal())
        .await?;

    Ok(Json(appointments.iter().map(AppointmentView::from).collect()))
}

/// Update the status, schedule, or reason of one of the calling doctor's
/// appointments.
pub async fn update_appointment(
    State(state): State<AppState>,
    doctor: RequireDoctor,
    ApiPath(id): ApiPath<AppointmentId>,
    ApiJson(request): ApiJson<AppointmentUpdateRequest>,
) -> Result<Json<AppointmentView>> {
    let changes = request.validate()?;

    let appointment = RecordsService::new(state.pool())
        .update_appointment(doctor.principal(), id, changes)
        .await?;

    Ok(Json(AppointmentView::from(&appointment)))
}
