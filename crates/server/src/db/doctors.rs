//! Doctor repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clinic_core::{DoctorId, Email, PhoneNumber, TimeRange};

use super::{RepositoryError, conflict_on_unique, corrupt};
use crate::models::{Doctor, DoctorChanges, NewDoctor};

const DOCTOR_COLUMNS: &str = "id, email, first_name, last_name, phone_number, address, \
     medical_specialization, availability_days, availability_time_range, is_active, \
     created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` doctor queries.
#[derive(Debug, sqlx::FromRow)]
struct DoctorRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
    address: Option<String>,
    medical_specialization: Option<String>,
    availability_days: Option<String>,
    availability_time_range: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DoctorRow> for Doctor {
    type Error = RepositoryError;

    fn try_from(row: DoctorRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| corrupt("email", e))?;
        let phone_number = row
            .phone_number
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()
            .map_err(|e| corrupt("phone number", e))?;
        let availability_time_range = row
            .availability_time_range
            .as_deref()
            .map(TimeRange::parse)
            .transpose()
            .map_err(|e| corrupt("availability time range", e))?;

        Ok(Self {
            id: DoctorId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number,
            address: row.address,
            medical_specialization: row.medical_specialization,
            availability_days: row.availability_days,
            availability_time_range,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Doctor row joined with its password hash, for login.
#[derive(Debug, sqlx::FromRow)]
struct DoctorWithHashRow {
    #[sqlx(flatten)]
    doctor: DoctorRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for doctor database operations.
pub struct DoctorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DoctorRepository<'a> {
    /// Create a new doctor repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a doctor account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        doctor: &NewDoctor,
        password_hash: &str,
    ) -> Result<Doctor, RepositoryError> {
        let row = sqlx::query_as::<_, DoctorRow>(&format!(
            r"
            INSERT INTO clinic.doctor (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {DOCTOR_COLUMNS}
            "
        ))
        .bind(&doctor.email)
        .bind(password_hash)
        .bind(&doctor.first_name)
        .bind(&doctor.last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        row.try_into()
    }

    /// Get a doctor by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_id(&self, id: DoctorId) -> Result<Option<Doctor>, RepositoryError> {
        let row = sqlx::query_as::<_, DoctorRow>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM clinic.doctor WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a doctor and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Doctor, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, DoctorWithHashRow>(&format!(
            "SELECT {DOCTOR_COLUMNS}, password_hash FROM clinic.doctor WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.doctor.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// List doctors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Doctor>, RepositoryError> {
        let rows = sqlx::query_as::<_, DoctorRow>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM clinic.doctor ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Apply profile changes to a doctor.
    ///
    /// The row is locked while the changes are applied. Email is never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the doctor does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: DoctorId,
        changes: DoctorChanges,
    ) -> Result<Doctor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DoctorRow>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM clinic.doctor WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut doctor: Doctor = row.try_into()?;
        changes.apply(&mut doctor);

        let row = sqlx::query_as::<_, DoctorRow>(&format!(
            r"
            UPDATE clinic.doctor
            SET first_name = $2,
                last_name = $3,
                phone_number = $4,
                address = $5,
                medical_specialization = $6,
                availability_days = $7,
                availability_time_range = $8
            WHERE id = $1
            RETURNING {DOCTOR_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&doctor.first_name)
        .bind(&doctor.last_name)
        .bind(doctor.phone_number.as_ref().map(PhoneNumber::as_str))
        .bind(&doctor.address)
        .bind(&doctor.medical_specialization)
        .bind(&doctor.availability_days)
        .bind(doctor.availability_time_range.map(|r| r.to_string()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Activate or deactivate a doctor by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no doctor has this email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(&self, email: &Email, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE clinic.doctor SET is_active = $2 WHERE email = $1")
            .bind(email)
            .bind(active)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Permanently delete a doctor by email, with their patients and appointments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no doctor has this email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, email: &Email) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clinic.doctor WHERE email = $1")
            .bind(email)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
