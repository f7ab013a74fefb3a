//! Authentication extractors.
//!
//! Protected handlers take one of these extractors to get the calling
//! principal. Resolution order:
//!
//! 1. `Authorization: Bearer <token>` must be present (401 otherwise).
//! 2. The token must be a valid, unexpired access token (401).
//! 3. The principal must have the endpoint's role (403, before any database
//!    access).
//! 4. The account must still exist and be active (401).

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use clinic_core::access::PrincipalKind;
use clinic_core::{DoctorId, PatientId, Principal};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, AuthService, TokenType};
use crate::state::AppState;

/// Extractor that requires an authenticated, active doctor.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireDoctor(doctor_id): RequireDoctor,
/// ) -> impl IntoResponse {
///     format!("Hello, doctor {doctor_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireDoctor(pub DoctorId);

/// Extractor that requires an authenticated, active patient.
#[derive(Debug, Clone, Copy)]
pub struct RequirePatient(pub PatientId);

impl RequireDoctor {
    /// The doctor as a principal.
    #[must_use]
    pub const fn principal(self) -> Principal {
        Principal::Doctor(self.0)
    }
}

impl RequirePatient {
    /// The patient as a principal.
    #[must_use]
    pub const fn principal(self) -> Principal {
        Principal::Patient(self.0)
    }
}

impl FromRequestParts<AppState> for RequireDoctor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, PrincipalKind::Doctor).await? {
            Principal::Doctor(id) => Ok(Self(id)),
            principal @ Principal::Patient(_) => Err(AppError::RoleRequired {
                principal,
                required: PrincipalKind::Doctor,
            }),
        }
    }
}

impl FromRequestParts<AppState> for RequirePatient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, PrincipalKind::Patient).await? {
            Principal::Patient(id) => Ok(Self(id)),
            principal @ Principal::Doctor(_) => Err(AppError::RoleRequired {
                principal,
                required: PrincipalKind::Patient,
            }),
        }
    }
}

/// Resolve the bearer token to a principal of the `required` kind.
async fn authenticate(
    parts: &Parts,
    state: &AppState,
    required: PrincipalKind,
) -> Result<Principal, AppError> {
    let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
    let principal = state.tokens().verify(token, TokenType::Access)?;

    if principal.kind() != required {
        tracing::warn!(%principal, %required, "Wrong role for endpoint");
        return Err(AppError::RoleRequired {
            principal,
            required,
        });
    }

    AuthService::new(state.pool(), state.tokens())
        .ensure_active(principal)
        .await?;

    set_sentry_user(&principal);
    Ok(principal)
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
