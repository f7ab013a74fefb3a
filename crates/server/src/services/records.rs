//! Ownership-scoped record operations.
//!
//! Every read and write of a profile, patient, or appointment goes through
//! this service, and every operation asks [`clinic_core::authorize`] before
//! returning or changing data. Records are loaded first, so the policy sees
//! the stored ownership edges: a missing record is `NotFound`, an existing
//! record owned by someone else is `Denied`.

use sqlx::PgPool;
use thiserror::Error;

use clinic_core::access::ResourceKind;
use clinic_core::{
    AccessDenied, AppointmentId, DoctorId, FieldErrors, Operation, PatientId, Principal, Resource,
    authorize,
};

use crate::db::{AppointmentRepository, DoctorRepository, PatientRepository, RepositoryError};
use crate::models::{
    Appointment, AppointmentChanges, BookAppointmentRequest, Doctor, DoctorChanges, NewPatient,
    Patient, PatientChanges,
};
use crate::services::auth::hash_password;

/// Errors from record operations.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// The principal may not act on the record.
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    /// No record with the requested ID.
    #[error("not found")]
    NotFound,

    /// Input rejected by the store, reported per field.
    #[error("invalid input: {0}")]
    Invalid(#[from] FieldErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Record operations on behalf of an authenticated principal.
pub struct RecordsService<'a> {
    doctors: DoctorRepository<'a>,
    patients: PatientRepository<'a>,
    appointments: AppointmentRepository<'a>,
}

impl<'a> RecordsService<'a> {
    /// Create a new records service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            doctors: DoctorRepository::new(pool),
            patients: PatientRepository::new(pool),
            appointments: AppointmentRepository::new(pool),
        }
    }

    // =========================================================================
    // Doctor profile
    // =========================================================================

    /// Read a doctor's profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` unless the principal is that doctor.
    pub async fn doctor_profile(
        &self,
        principal: Principal,
        id: DoctorId,
    ) -> Result<Doctor, RecordsError> {
        check(principal, &Resource::DoctorProfile(id), Operation::Read)?;
        self.doctors
            .get_by_id(id)
            .await?
            .ok_or(RecordsError::NotFound)
    }

    /// Update a doctor's profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` unless the principal is that doctor.
    pub async fn update_doctor_profile(
        &self,
        principal: Principal,
        id: DoctorId,
        changes: DoctorChanges,
    ) -> Result<Doctor, RecordsError> {
        check(principal, &Resource::DoctorProfile(id), Operation::Write)?;
        let doctor = self
            .doctors
            .update_profile(id, changes)
            .await
            .map_err(not_found)?;

        tracing::info!(doctor_id = %id, "Doctor profile updated");
        Ok(doctor)
    }

    // =========================================================================
    // Patients
    // =========================================================================

    /// Create a patient owned by the calling doctor.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` for non-doctors and
    /// `RecordsError::Invalid` if the email is taken.
    pub async fn create_patient(
        &self,
        principal: Principal,
        patient: &NewPatient,
    ) -> Result<Patient, RecordsError> {
        check(principal, &Resource::PatientRoster, Operation::Write)?;
        let created_by = principal
            .as_doctor()
            .ok_or_else(|| denied(principal, ResourceKind::PatientRoster, Operation::Write))?;

        let password_hash =
            hash_password(&patient.password).map_err(|_| RecordsError::PasswordHash)?;
        let created = self
            .patients
            .create(created_by, patient, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => RecordsError::Invalid(FieldErrors::single(
                    "email",
                    "A patient with this email already exists.",
                )),
                other => other.into(),
            })?;

        tracing::info!(patient_id = %created.id, doctor_id = %created_by, "Patient created");
        Ok(created)
    }

    /// List the patients the calling doctor created.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` for non-doctors.
    pub async fn list_patients(&self, principal: Principal) -> Result<Vec<Patient>, RecordsError> {
        check(principal, &Resource::PatientRoster, Operation::Read)?;
        let doctor = principal
            .as_doctor()
            .ok_or_else(|| denied(principal, ResourceKind::PatientRoster, Operation::Read))?;

        Ok(self.patients.list_by_doctor(doctor).await?)
    }

    /// Read one patient record.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` if no such patient exists and
    /// `RecordsError::Denied` if the caller did not create it.
    pub async fn get_patient(
        &self,
        principal: Principal,
        id: PatientId,
    ) -> Result<Patient, RecordsError> {
        let patient = self
            .patients
            .get_by_id(id)
            .await?
            .ok_or(RecordsError::NotFound)?;
        check(principal, &patient.record(), Operation::Read)?;
        Ok(patient)
    }

    /// Read a patient's own profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` unless the principal is that patient.
    pub async fn patient_profile(
        &self,
        principal: Principal,
        id: PatientId,
    ) -> Result<Patient, RecordsError> {
        check(principal, &Resource::PatientProfile(id), Operation::Read)?;
        self.patients
            .get_by_id(id)
            .await?
            .ok_or(RecordsError::NotFound)
    }

    /// Update a patient's own profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` unless the principal is that patient.
    pub async fn update_patient_profile(
        &self,
        principal: Principal,
        id: PatientId,
        changes: PatientChanges,
    ) -> Result<Patient, RecordsError> {
        check(principal, &Resource::PatientProfile(id), Operation::Write)?;
        let patient = self
            .patients
            .update_profile(id, changes)
            .await
            .map_err(not_found)?;

        tracing::info!(patient_id = %id, "Patient profile updated");
        Ok(patient)
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    /// List the caller's appointments: as treating doctor, or as patient.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Repository` if the query fails.
    pub async fn list_appointments(
        &self,
        principal: Principal,
    ) -> Result<Vec<Appointment>, RecordsError> {
        check(principal, &Resource::AppointmentBook, Operation::Read)?;
        let appointments = match principal {
            Principal::Doctor(id) => self.appointments.list_for_doctor(id).await?,
            Principal::Patient(id) => self.appointments.list_for_patient(id).await?,
        };
        Ok(appointments)
    }

    /// Read one appointment.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` if no such appointment exists and
    /// `RecordsError::Denied` if the caller is not its doctor or patient.
    pub async fn get_appointment(
        &self,
        principal: Principal,
        id: AppointmentId,
    ) -> Result<Appointment, RecordsError> {
        let appointment = self
            .appointments
            .get_by_id(id)
            .await?
            .ok_or(RecordsError::NotFound)?;
        check(principal, &appointment.resource(), Operation::Read)?;
        Ok(appointment)
    }

    /// Book an appointment for the calling patient.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::Denied` for non-patients and
    /// `RecordsError::Invalid` for bad input, an unknown or inactive doctor,
    /// or a taken slot.
    pub async fn book_appointment(
        &self,
        principal: Principal,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, RecordsError> {
        check(principal, &Resource::AppointmentBook, Operation::Write)?;
        let patient = principal
            .as_patient()
            .ok_or_else(|| denied(principal, ResourceKind::AppointmentBook, Operation::Write))?;

        let new = request.validate(patient)?;
        let appointment = self
            .appointments
            .create(&new)
            .await
            .map_err(slot_taken)?
            .ok_or_else(|| {
                FieldErrors::single(
                    "doctor",
                    format!("Invalid pk \"{}\" - object does not exist.", new.doctor),
                )
            })?;

        tracing::info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor,
            patient_id = %appointment.patient,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// Change an appointment's status, schedule, or reason.
    ///
    /// # Errors
    ///
    /// Returns `RecordsError::NotFound` if no such appointment exists,
    /// `RecordsError::Denied` unless the caller is its doctor, and
    /// `RecordsError::Invalid` if rescheduling hits a taken slot.
    pub async fn update_appointment(
        &self,
        principal: Principal,
        id: AppointmentId,
        changes: AppointmentChanges,
    ) -> Result<Appointment, RecordsError> {
        let current = self
            .appointments
            .get_by_id(id)
            .await?
            .ok_or(RecordsError::NotFound)?;
        check(principal, &current.resource(), Operation::Write)?;

        let updated = self
            .appointments
            .update(id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RecordsError::NotFound,
                other => slot_taken(other),
            })?;

        tracing::info!(appointment_id = %id, status = %updated.status, "Appointment updated");
        Ok(updated)
    }
}

/// Authorize, logging denials.
fn check(
    principal: Principal,
    resource: &Resource,
    operation: Operation,
) -> Result<(), RecordsError> {
    authorize(principal, resource, operation).map_err(|denied| {
        tracing::warn!(%denied, "Access denied");
        RecordsError::Denied(denied)
    })
}

const fn denied(
    principal: Principal,
    resource: ResourceKind,
    operation: Operation,
) -> RecordsError {
    RecordsError::Denied(AccessDenied {
        principal,
        resource,
        operation,
    })
}

fn not_found(e: RepositoryError) -> RecordsError {
    match e {
        RepositoryError::NotFound => RecordsError::NotFound,
        other => other.into(),
    }
}

fn slot_taken(e: RepositoryError) -> RecordsError {
    match e {
        RepositoryError::Conflict(_) => RecordsError::Invalid(FieldErrors::single(
            "time",
            "The doctor already has an appointment at this date and time.",
        )),
        other => other.into(),
    }
}
