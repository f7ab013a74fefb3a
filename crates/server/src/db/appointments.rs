//! Appointment repository for database operations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

use clinic_core::{AppointmentId, AppointmentStatus, DoctorId, PatientId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Appointment, AppointmentChanges, NewAppointment};

const APPOINTMENT_COLUMNS: &str =
    "id, doctor_id, patient_id, date, time, status, reason, created_at, updated_at";

const SLOT_TAKEN: &str = "doctor already has an appointment at this time";

/// Internal row type for `PostgreSQL` appointment queries.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i32,
    doctor_id: i32,
    patient_id: i32,
    date: NaiveDate,
    time: NaiveTime,
    status: AppointmentStatus,
    reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: AppointmentId::new(row.id),
            doctor: DoctorId::new(row.doctor_id),
            patient: PatientId::new(row.patient_id),
            date: row.date,
            time: row.time,
            status: row.status,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for appointment database operations.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    /// Create a new appointment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Book an appointment with an active doctor.
    ///
    /// The active-doctor check and the insert are a single statement. Returns
    /// `None` when the doctor does not exist or is inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the doctor's slot is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r"
            INSERT INTO clinic.appointment (doctor_id, patient_id, date, time, reason)
            SELECT d.id, $2, $3, $4, $5
            FROM clinic.doctor d
            WHERE d.id = $1 AND d.is_active
            RETURNING {APPOINTMENT_COLUMNS}
            "
        ))
        .bind(appointment.doctor)
        .bind(appointment.patient)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(&appointment.reason)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, SLOT_TAKEN))?;

        Ok(row.map(Into::into))
    }

    /// Get an appointment by ID, regardless of participants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM clinic.appointment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a doctor's appointments in schedule order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_doctor(
        &self,
        doctor: DoctorId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r"
            SELECT {APPOINTMENT_COLUMNS} FROM clinic.appointment
            WHERE doctor_id = $1
            ORDER BY date, time, id
            "
        ))
        .bind(doctor)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List a patient's appointments in schedule order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_patient(
        &self,
        patient: PatientId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r"
            SELECT {APPOINTMENT_COLUMNS} FROM clinic.appointment
            WHERE patient_id = $1
            ORDER BY date, time, id
            "
        ))
        .bind(patient)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply changes to an appointment. Doctor and patient are never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    /// Returns `RepositoryError::Conflict` if rescheduling hits a taken slot.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: AppointmentId,
        changes: AppointmentChanges,
    ) -> Result<Appointment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut appointment: Appointment = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM clinic.appointment WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .into();

        changes.apply(&mut appointment);

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r"
            UPDATE clinic.appointment
            SET status = $2,
                date = $3,
                time = $4,
                reason = $5
            WHERE id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(appointment.status)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(&appointment.reason)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, SLOT_TAKEN))?;

        tx.commit().await?;

        Ok(row.into())
    }
}
