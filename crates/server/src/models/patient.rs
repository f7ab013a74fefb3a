//! Patient domain types.
//!
//! A patient is a credentialed account owned by the doctor that created it.
//! The owner is taken from the authenticated doctor, never from the request
//! body, and never changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{DoctorId, Email, FieldErrors, PatientId, PhoneNumber, Resource};

use super::MAX_NAME_LENGTH;

/// A patient account (domain type).
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: PatientId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<PhoneNumber>,
    /// The doctor that created, and owns, this patient.
    pub created_by: DoctorId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// This patient as seen by its owning doctor.
    #[must_use]
    pub const fn record(&self) -> Resource {
        Resource::PatientRecord {
            id: self.id,
            created_by: self.created_by,
        }
    }
}

/// Patient record as returned to the owning doctor.
#[derive(Debug, Clone, Serialize)]
pub struct PatientRecordView {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
    pub created_by: DoctorId,
    pub created_at: DateTime<Utc>,
}

impl From<&Patient> for PatientRecordView {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            phone_number: patient.phone_number.clone(),
            created_by: patient.created_by,
            created_at: patient.created_at,
        }
    }
}

/// Patient profile as returned to the patient.
#[derive(Debug, Clone, Serialize)]
pub struct PatientProfileView {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
}

impl From<&Patient> for PatientProfileView {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            phone_number: patient.phone_number.clone(),
        }
    }
}

/// Body of `POST /doctors/patients`.
///
/// Has no `created_by` field, so a value sent by the client is dropped during
/// deserialization.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct NewPatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
}

impl NewPatientRequest {
    /// Validate every field and produce a [`NewPatient`].
    ///
    /// # Errors
    ///
    /// Returns all field problems found.
    pub fn validate(self) -> Result<NewPatient, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name =
            super::required_text(&mut errors, "first_name", &self.first_name, MAX_NAME_LENGTH);
        let last_name =
            super::required_text(&mut errors, "last_name", &self.last_name, MAX_NAME_LENGTH);
        let email = super::email(&mut errors, "email", &self.email);
        super::password(&mut errors, "password", &self.password);
        let phone_number = self
            .phone_number
            .and_then(|v| super::phone_number(&mut errors, "phone_number", &v));

        match email {
            Some(email) if errors.is_empty() => Ok(NewPatient {
                email,
                first_name,
                last_name,
                phone_number,
                password: self.password,
            }),
            _ => Err(errors),
        }
    }
}

/// A validated patient creation.
pub struct NewPatient {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<PhoneNumber>,
    /// Plaintext; hashed by the records service before storage.
    pub password: String,
}

impl std::fmt::Debug for NewPatient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPatient")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone_number", &self.phone_number)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `PATCH /patients/profile`. Email is read-only.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl PatientProfileUpdate {
    /// Validate the fields present in the update.
    ///
    /// # Errors
    ///
    /// Returns all field problems found.
    pub fn validate(self) -> Result<PatientChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = self
            .first_name
            .map(|v| super::required_text(&mut errors, "first_name", &v, MAX_NAME_LENGTH));
        let last_name = self
            .last_name
            .map(|v| super::required_text(&mut errors, "last_name", &v, MAX_NAME_LENGTH));
        let phone_number = self
            .phone_number
            .map(|v| super::phone_number(&mut errors, "phone_number", &v));

        errors.finish(PatientChanges {
            first_name,
            last_name,
            phone_number,
        })
    }
}

/// Validated patient profile changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<Option<PhoneNumber>>,
}

impl PatientChanges {
    /// Apply the changes to a loaded patient.
    pub fn apply(self, patient: &mut Patient) {
        if let Some(v) = self.first_name {
            patient.first_name = v;
        }
        if let Some(v) = self.last_name {
            patient.last_name = v;
        }
        if let Some(v) = self.phone_number {
            patient.phone_number = v;
        }
    }
}
