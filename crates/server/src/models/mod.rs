//! Domain models and request payloads.
//!
//! Domain types (`Doctor`, `Patient`, `Appointment`) are validated objects,
//! separate from database row types. Request payloads deserialize leniently
//! (missing fields default to empty) and are turned into validated inputs by
//! their `validate()` method, which reports every bad field at once through
//! [`FieldErrors`].
//!
//! Profile and appointment updates are partial: an absent field is left
//! unchanged, and an empty string clears an optional field.

pub mod appointment;
pub mod doctor;
pub mod patient;

use serde::Deserialize;

use clinic_core::{Email, FieldErrors, PhoneNumber};

pub use appointment::{
    Appointment, AppointmentChanges, AppointmentUpdateRequest, AppointmentView,
    BookAppointmentRequest, NewAppointment,
};
pub use doctor::{
    Doctor, DoctorChanges, DoctorProfileUpdate, DoctorProfileView, DoctorSignupRequest, NewDoctor,
};
pub use patient::{
    NewPatient, NewPatientRequest, Patient, PatientChanges, PatientProfileUpdate,
    PatientProfileView, PatientRecordView,
};

/// Maximum length of first and last names.
pub const MAX_NAME_LENGTH: usize = 30;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const BLANK: &str = "This field may not be blank.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Email and password, as posted to the login endpoints.
///
/// `Debug` is implemented manually to keep the password out of logs.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Validate a required free-text field and return it trimmed.
fn required_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max {
        errors.add(field, too_long(max));
    }
    value.to_owned()
}

/// Validate an optional free-text field. Blank input becomes `None`.
fn optional_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > max {
        errors.add(field, too_long(max));
    }
    Some(value.to_owned())
}

fn email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Email> {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    Email::parse(value)
        .map_err(|_| errors.add(field, INVALID_EMAIL))
        .ok()
}

/// Validate an optional phone number. Blank input becomes `None`.
fn phone_number(errors: &mut FieldErrors, field: &str, value: &str) -> Option<PhoneNumber> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    PhoneNumber::parse(value)
        .map_err(|e| errors.add(field, e.to_string()))
        .ok()
}

fn password(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
            ),
        );
    }
}
