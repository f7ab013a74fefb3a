//! Doctor account administration.
//!
//! # Usage
//!
//! ```bash
//! # Create a doctor (password read from stdin)
//! echo 'a-long-password' | clinic-cli doctor create -e house@example.com -f Gregory -l House
//!
//! # Block or restore login
//! clinic-cli doctor deactivate -e house@example.com
//! clinic-cli doctor activate -e house@example.com
//!
//! # Permanently delete, with the doctor's patients and appointments
//! clinic-cli doctor delete -e house@example.com
//!
//! # List all doctors
//! clinic-cli doctor list
//! ```

use std::io::BufRead;

use clinic_core::{DoctorId, Email};
use clinic_server::db::{DoctorRepository, RepositoryError};
use clinic_server::models::DoctorSignupRequest;
use clinic_server::services::auth::hash_password;

use super::{CliError, connect};

/// Create a doctor account.
///
/// The password is read from the first line of `input`. Name, email, and
/// password go through the same validation as API signup.
///
/// # Returns
///
/// The ID of the created doctor.
///
/// # Errors
///
/// Returns `CliError::Invalid` for rejected input and
/// `CliError::DoctorExists` if the email is taken.
pub async fn create(
    email: &str,
    first_name: &str,
    last_name: &str,
    input: impl BufRead,
) -> Result<DoctorId, CliError> {
    let password = read_password(input)?;
    let doctor = DoctorSignupRequest {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: email.to_owned(),
        confirm_password: password.clone(),
        password,
    }
    .validate()?;

    let pool = connect().await?;
    let password_hash = hash_password(&doctor.password)?;

    tracing::info!("Creating doctor: {}", doctor.email);
    let created = DoctorRepository::new(&pool)
        .create(&doctor, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CliError::DoctorExists(email.to_owned()),
            other => other.into(),
        })?;

    tracing::info!(
        "Doctor created successfully! ID: {}, Email: {}",
        created.id,
        created.email
    );
    Ok(created.id)
}

/// Allow or block a doctor's logins.
///
/// # Errors
///
/// Returns `CliError::DoctorNotFound` if no doctor has this email.
pub async fn set_active(email: &str, active: bool) -> Result<(), CliError> {
    let parsed = parse_email(email)?;
    let pool = connect().await?;

    DoctorRepository::new(&pool)
        .set_active(&parsed, active)
        .await
        .map_err(|e| not_found(e, email))?;

    if active {
        tracing::info!("Doctor activated: {}", parsed);
    } else {
        tracing::info!("Doctor deactivated: {}", parsed);
    }
    Ok(())
}

/// Permanently delete a doctor.
///
/// # Errors
///
/// Returns `CliError::DoctorNotFound` if no doctor has this email.
pub async fn delete(email: &str) -> Result<(), CliError> {
    let parsed = parse_email(email)?;
    let pool = connect().await?;

    DoctorRepository::new(&pool)
        .delete(&parsed)
        .await
        .map_err(|e| not_found(e, email))?;

    tracing::warn!("Doctor deleted with all patients and appointments: {}", parsed);
    Ok(())
}

/// Print every doctor, one per line.
///
/// # Errors
///
/// Returns `CliError` if the database query fails.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let doctors = DoctorRepository::new(&pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        for doctor in &doctors {
            let status = if doctor.is_active { "active" } else { "inactive" };
            println!(
                "{}\t{}\t{} {}\t{}",
                doctor.id, doctor.email, doctor.first_name, doctor.last_name, status
            );
        }
    }
    Ok(())
}

fn read_password(mut input: impl BufRead) -> Result<String, CliError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| CliError::Password(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn parse_email(email: &str) -> Result<Email, CliError> {
    Email::parse(email).map_err(|_| CliError::DoctorNotFound(email.to_owned()))
}

fn not_found(e: RepositoryError, email: &str) -> CliError {
    match e {
        RepositoryError::NotFound => CliError::DoctorNotFound(email.to_owned()),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline() {
        let password = read_password("hunter2-hunter2\r\n".as_bytes()).unwrap();
        assert_eq!(password, "hunter2-hunter2");
    }

    #[test]
    fn test_read_password_keeps_inner_spaces() {
        let password = read_password(" two words \n".as_bytes()).unwrap();
        assert_eq!(password, " two words ");
    }

    #[tokio::test]
    async fn test_create_rejects_short_password_before_connecting() {
        let err = create("house@example.com", "Gregory", "House", "short\n".as_bytes())
            .await
            .unwrap_err();
        let CliError::Invalid(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn test_not_found_mapping() {
        assert!(matches!(
            not_found(RepositoryError::NotFound, "a@b.co"),
            CliError::DoctorNotFound(_)
        ));
    }
}
