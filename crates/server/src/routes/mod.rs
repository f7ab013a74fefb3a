//! HTTP route handlers for the clinic API.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                       - Liveness check
//! GET   /health/ready                 - Readiness check (database ping)
//!
//! # Credentials (rate limited)
//! POST  /doctors/signup               - Register a doctor
//! POST  /doctors/login                - Doctor login
//! POST  /patients/login               - Patient login
//! POST  /auth/token/refresh           - Exchange a refresh token
//!
//! # Doctor (doctor token)
//! GET   /doctors/profile              - Own profile
//! PATCH /doctors/profile              - Update own profile
//! GET   /doctors/patients             - Own patients
//! POST  /doctors/patients             - Create a patient
//! GET   /doctors/patients/{id}        - One own patient
//! GET   /doctors/appointments         - Own appointments
//! PATCH /doctors/appointments/{id}    - Update an own appointment
//!
//! # Patient (patient token)
//! GET   /patients/profile             - Own profile
//! PATCH /patients/profile             - Update own profile
//! GET   /patients/appointments        - Own appointments
//! POST  /patients/appointments        - Book an appointment
//! GET   /patients/appointments/{id}   - One own appointment
//! ```

pub mod auth;
pub mod doctors;
pub mod patients;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// JSON body extractor whose rejections are reported as field errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor whose rejections are reported as field errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Signup, login, and refresh: the routes that take credentials.
pub fn credential_routes(limits: &RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/doctors/signup", post(doctors::signup))
        .route("/doctors/login", post(doctors::login))
        .route("/patients/login", post(patients::login))
        .route("/auth/token/refresh", post(auth::refresh))
        .layer(auth_rate_limiter(limits))
}

/// Create the doctor routes router.
pub fn doctor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(doctors::profile).patch(doctors::update_profile),
        )
        .route(
            "/patients",
            get(doctors::list_patients).post(doctors::create_patient),
        )
        .route("/patients/{id}", get(doctors::get_patient))
        .route("/appointments", get(doctors::list_appointments))
        .route(
            "/appointments/{id}",
            axum::routing::patch(doctors::update_appointment),
        )
}

/// Create the patient routes router.
pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(patients::profile).patch(patients::update_profile),
        )
        .route(
            "/appointments",
            get(patients::list_appointments).post(patients::book_appointment),
        )
        .route("/appointments/{id}", get(patients::get_appointment))
}

/// Create all routes for the clinic API.
pub fn routes(limits: &RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(credential_routes(limits))
        .nest("/doctors", doctor_routes())
        .nest("/patients", patient_routes())
}

/// Build the application with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState) -> Router {
    routes(&state.config().rate_limit)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
