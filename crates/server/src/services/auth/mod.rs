//! Authentication service.
//!
//! Password login for doctors and patients, doctor registration, refresh
//! token exchange, and bearer-token resolution for protected requests.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenKeys, TokenPair, TokenType};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use clinic_core::{Email, Principal};

use crate::db::{DoctorRepository, PatientRepository};
use crate::models::{Doctor, NewDoctor, Patient};

/// Hash checked when a login email matches no account, so unknown emails
/// cost the same Argon2 work as wrong passwords.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-account").ok());

/// Outcome of a successful patient login.
#[derive(Debug)]
pub struct PatientLogin {
    pub tokens: TokenPair,
    pub patient: Patient,
}

/// Authentication service.
pub struct AuthService<'a> {
    doctors: DoctorRepository<'a>,
    patients: PatientRepository<'a>,
    keys: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a TokenKeys) -> Self {
        Self {
            doctors: DoctorRepository::new(pool),
            patients: PatientRepository::new(pool),
            keys,
        }
    }

    /// Register a doctor.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository(RepositoryError::Conflict)` if the email
    /// is already registered.
    pub async fn register_doctor(&self, doctor: &NewDoctor) -> Result<Doctor, AuthError> {
        let password_hash = hash_password(&doctor.password)?;
        let created = self.doctors.create(doctor, &password_hash).await?;

        tracing::info!(doctor_id = %created.id, "Doctor registered");
        Ok(created)
    }

    /// Log a doctor in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown or malformed
    /// email, a wrong password, or an inactive account.
    pub async fn login_doctor(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (doctor, password_hash) = self
            .doctors
            .get_password_hash(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Doctor login for unknown email");
                reject_unknown_account(password)
            })?;

        verify_password(password, &password_hash).inspect_err(|_| {
            tracing::warn!(doctor_id = %doctor.id, "Doctor login with wrong password");
        })?;
        if !doctor.is_active {
            tracing::warn!(doctor_id = %doctor.id, "Login attempt on inactive doctor");
            return Err(AuthError::InvalidCredentials);
        }

        self.keys.issue_pair(Principal::Doctor(doctor.id))
    }

    /// Log a patient in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown or malformed
    /// email, a wrong password, or an inactive account.
    pub async fn login_patient(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PatientLogin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (patient, password_hash) = self
            .patients
            .get_password_hash(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Patient login for unknown email");
                reject_unknown_account(password)
            })?;

        verify_password(password, &password_hash).inspect_err(|_| {
            tracing::warn!(patient_id = %patient.id, "Patient login with wrong password");
        })?;
        if !patient.is_active {
            tracing::warn!(patient_id = %patient.id, "Login attempt on inactive patient");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.keys.issue_pair(Principal::Patient(patient.id))?;
        Ok(PatientLogin { tokens, patient })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Returns a token error if `refresh` is not a valid refresh token, or
    /// `AuthError::AccountUnavailable` if the account is gone or inactive.
    pub async fn refresh(&self, refresh: &str) -> Result<TokenPair, AuthError> {
        let principal = self.keys.verify(refresh, TokenType::Refresh)?;
        self.ensure_active(principal).await?;
        self.keys.issue_pair(principal)
    }

    /// Check that the account behind `principal` still exists and is active.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountUnavailable` otherwise.
    pub async fn ensure_active(&self, principal: Principal) -> Result<(), AuthError> {
        let active = match principal {
            Principal::Doctor(id) => self
                .doctors
                .get_by_id(id)
                .await?
                .is_some_and(|d| d.is_active),
            Principal::Patient(id) => self
                .patients
                .get_by_id(id)
                .await?
                .is_some_and(|p| p.is_active),
        };

        if active {
            Ok(())
        } else {
            Err(AuthError::AccountUnavailable)
        }
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Verify `password` against a hash no account owns, then reject.
fn reject_unknown_account(password: &str) -> AuthError {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_account_hash_matches_real_hash_cost() {
        let dummy = UNKNOWN_ACCOUNT_HASH.as_deref().unwrap();
        let real = hash_password("correct-horse-battery").unwrap();

        let dummy = PasswordHash::new(dummy).unwrap();
        let real = PasswordHash::new(&real).unwrap();
        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.params, real.params);
    }

    #[test]
    fn test_unknown_account_is_invalid_credentials() {
        assert!(matches!(
            reject_unknown_account("correct-horse-battery"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            reject_unknown_account("unknown-account"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_hash_is_argon2id_and_verifies() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert!(matches!(
            verify_password("wrong-horse-battery", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
