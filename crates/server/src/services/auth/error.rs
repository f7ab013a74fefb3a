//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password, unknown email, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No bearer token on a protected request.
    #[error("missing bearer token")]
    MissingToken,

    /// Token failed signature, issuer, or claim validation.
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// Token signature is valid but `exp` has passed.
    #[error("token expired")]
    TokenExpired,

    /// A refresh token was used as an access token, or the reverse.
    #[error("wrong token type")]
    WrongTokenType,

    /// The token's account no longer exists or was deactivated.
    #[error("account unavailable")]
    AccountUnavailable,

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the client should be told to (re-)authenticate.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        !matches!(
            self,
            Self::Signing(_) | Self::Repository(_) | Self::PasswordHash
        )
    }
}
