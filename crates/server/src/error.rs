//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! | Error | Status | Body |
//! |---|---|---|
//! | `Validation` | 400 | `{"errors": {"<field>": ["<message>"]}}` |
//! | `Auth` (client side) | 401 | `{"error": "<generic message>"}` |
//! | `Forbidden` | 403 | `{"error": "You do not have permission to perform this action."}` |
//! | `NotFound` | 404 | `{"error": "Not found."}` |
//! | everything else | 500 | `{"error": "Internal server error."}` |

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use clinic_core::access::PrincipalKind;
use clinic_core::{AccessDenied, FieldErrors, Principal};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::records::RecordsError;

/// Message for every 403.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Application-level error type for the clinic API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] FieldErrors),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(#[from] AccessDenied),

    /// Authenticated with the wrong kind of account for the endpoint.
    #[error("Forbidden: {principal} is not a {required}")]
    RoleRequired {
        principal: Principal,
        required: PrincipalKind,
    },

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RecordsError> for AppError {
    fn from(err: RecordsError) -> Self {
        match err {
            RecordsError::Denied(denied) => Self::Forbidden(denied),
            RecordsError::NotFound => Self::NotFound,
            RecordsError::Invalid(errors) => Self::Validation(errors),
            RecordsError::Repository(e) => Self::Database(e),
            RecordsError::PasswordHash => Self::Internal("password hashing failed".to_owned()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(FieldErrors::single(
            "non_field_errors",
            rejection.body_text(),
        ))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                Self::Validation(FieldErrors::single("id", err.body_text()))
            }
            other => Self::Internal(other.body_text()),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) if err.is_unauthorized() => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::RoleRequired { .. } => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Auth(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Auth(AuthError::InvalidCredentials) => {
                json!({ "error": "Invalid email or password." })
            }
            Self::Auth(AuthError::MissingToken) => {
                json!({ "error": "Authentication credentials were not provided." })
            }
            Self::Auth(err) if err.is_unauthorized() => {
                json!({ "error": "Given token is not valid or has expired." })
            }
            Self::Forbidden(_) | Self::RoleRequired { .. } => {
                json!({ "error": PERMISSION_DENIED })
            }
            Self::NotFound => json!({ "error": "Not found." }),
            Self::Database(_) | Self::Auth(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error." })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an authenticated principal.
pub fn set_sentry_user(principal: &Principal) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(principal.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use clinic_core::access::ResourceKind;
    use clinic_core::{DoctorId, Operation, PatientId};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation(FieldErrors::single("email", "bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::WrongTokenType).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::PasswordHash).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal("boom".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let (status, body) =
            body_json(FieldErrors::single("password", "Passwords must match.").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"errors": {"password": ["Passwords must match."]}})
        );
    }

    #[tokio::test]
    async fn test_forbidden_body_is_generic() {
        let denied = AccessDenied {
            principal: Principal::Patient(PatientId::new(2)),
            resource: ResourceKind::Appointment,
            operation: Operation::Read,
        };
        let (status, body) = body_json(denied.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": PERMISSION_DENIED}));
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let err = AppError::RoleRequired {
            principal: Principal::Doctor(DoctorId::new(1)),
            required: PrincipalKind::Patient,
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": PERMISSION_DENIED}));
    }

    #[tokio::test]
    async fn test_login_failure_is_generic() {
        let (status, body) = body_json(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid email or password."}));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) =
            body_json(AppError::Internal("secret stack trace".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret stack trace"));
    }

    #[test]
    fn test_records_error_mapping() {
        assert!(matches!(
            AppError::from(RecordsError::NotFound),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(RecordsError::Invalid(FieldErrors::single("doctor", "x"))),
            AppError::Validation(_)
        ));
    }
}
