//! Patient repository for database operations.
//!
//! `created_by` is written once, on insert. No statement here updates it, and
//! a trigger rejects any update that tries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clinic_core::{DoctorId, Email, PatientId, PhoneNumber};

use super::{RepositoryError, conflict_on_unique, corrupt};
use crate::models::{NewPatient, Patient, PatientChanges};

const PATIENT_COLUMNS: &str = "id, email, first_name, last_name, phone_number, created_by, \
     is_active, created_at, updated_at";

/// Internal row type for `PostgreSQL` patient queries.
#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
    created_by: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = RepositoryError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| corrupt("email", e))?;
        let phone_number = row
            .phone_number
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()
            .map_err(|e| corrupt("phone number", e))?;

        Ok(Self {
            id: PatientId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number,
            created_by: DoctorId::new(row.created_by),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PatientWithHashRow {
    #[sqlx(flatten)]
    patient: PatientRow,
    password_hash: String,
}

/// Repository for patient database operations.
pub struct PatientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PatientRepository<'a> {
    /// Create a new patient repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a patient owned by `created_by`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        created_by: DoctorId,
        patient: &NewPatient,
        password_hash: &str,
    ) -> Result<Patient, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            r"
            INSERT INTO clinic.patient
                (email, password_hash, first_name, last_name, phone_number, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PATIENT_COLUMNS}
            "
        ))
        .bind(&patient.email)
        .bind(password_hash)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        row.try_into()
    }

    /// Get a patient by ID, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_id(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM clinic.patient WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a patient and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Patient, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, PatientWithHashRow>(&format!(
            "SELECT {PATIENT_COLUMNS}, password_hash FROM clinic.patient WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.patient.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// List the patients a doctor created, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_by_doctor(&self, doctor: DoctorId) -> Result<Vec<Patient>, RepositoryError> {
        let rows = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM clinic.patient WHERE created_by = $1 ORDER BY id"
        ))
        .bind(doctor)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Apply profile changes to a patient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the patient does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: PatientId,
        changes: PatientChanges,
    ) -> Result<Patient, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM clinic.patient WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut patient: Patient = row.try_into()?;
        changes.apply(&mut patient);

        let row = sqlx::query_as::<_, PatientRow>(&format!(
            r"
            UPDATE clinic.patient
            SET first_name = $2,
                last_name = $3,
                phone_number = $4
            WHERE id = $1
            RETURNING {PATIENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.phone_number.as_ref().map(PhoneNumber::as_str))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }
}
