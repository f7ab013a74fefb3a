//! Appointment domain types.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{AppointmentId, AppointmentStatus, DoctorId, FieldErrors, PatientId, Resource};

const DATE_FORMAT_ERROR: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const TIME_FORMAT_ERROR: &str =
    "Time has wrong format. Use one of these formats instead: hh:mm[:ss].";
const REQUIRED: &str = "This field is required.";

/// An appointment between a doctor and a patient (domain type).
///
/// The doctor and patient never change after booking.
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: AppointmentId,
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// This appointment as an access-control resource.
    #[must_use]
    pub const fn resource(&self) -> Resource {
        Resource::Appointment {
            id: self.id,
            doctor: self.doctor,
            patient: self.patient,
        }
    }
}

/// Appointment as returned to doctors and patients.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub id: AppointmentId,
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
}

impl From<&Appointment> for AppointmentView {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            doctor: appointment.doctor,
            patient: appointment.patient,
            date: appointment.date,
            time: appointment.time,
            status: appointment.status,
            reason: appointment.reason.clone(),
        }
    }
}

/// Body of `POST /patients/appointments`.
///
/// The patient is the caller. Any `patient` or `status` sent by the client is
/// dropped; new appointments always start as scheduled.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookAppointmentRequest {
    pub doctor: Option<DoctorId>,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

impl BookAppointmentRequest {
    /// Validate the booking for `patient`.
    ///
    /// Whether the doctor exists and accepts bookings is checked against the
    /// store, not here.
    ///
    /// # Errors
    ///
    /// Returns all field problems found.
    pub fn validate(self, patient: PatientId) -> Result<NewAppointment, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.doctor.is_none() {
            errors.add("doctor", REQUIRED);
        }
        let date = parse_date(&mut errors, &self.date);
        let time = parse_time(&mut errors, &self.time);

        match (self.doctor, date, time) {
            (Some(doctor), Some(date), Some(time)) if errors.is_empty() => Ok(NewAppointment {
                doctor,
                patient,
                date,
                time,
                reason: normalize_reason(self.reason),
            }),
            _ => Err(errors),
        }
    }
}

/// A validated booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub doctor: DoctorId,
    pub patient: PatientId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: Option<String>,
}

/// Body of `PATCH /doctors/appointments/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentUpdateRequest {
    pub status: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub reason: Option<String>,
}

impl AppointmentUpdateRequest {
    /// Validate the fields present in the update.
    ///
    /// # Errors
    ///
    /// Returns all field problems found, e.g. an unknown `status`.
    pub fn validate(self) -> Result<AppointmentChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let status = self.status.and_then(|s| {
            s.parse::<AppointmentStatus>()
                .map_err(|e| errors.add("status", e.to_string()))
                .ok()
        });
        let date = self.date.and_then(|d| parse_date(&mut errors, &d));
        let time = self.time.and_then(|t| parse_time(&mut errors, &t));
        let reason = self.reason.map(|r| normalize_reason(Some(r)));

        errors.finish(AppointmentChanges {
            status,
            date,
            time,
            reason,
        })
    }
}

/// Validated appointment changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentChanges {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub reason: Option<Option<String>>,
}

impl AppointmentChanges {
    /// Apply the changes to a loaded appointment.
    pub fn apply(self, appointment: &mut Appointment) {
        if let Some(v) = self.status {
            appointment.status = v;
        }
        if let Some(v) = self.date {
            appointment.date = v;
        }
        if let Some(v) = self.time {
            appointment.time = v;
        }
        if let Some(v) = self.reason {
            appointment.reason = v;
        }
    }
}

fn parse_date(errors: &mut FieldErrors, value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        errors.add("date", REQUIRED);
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| errors.add("date", DATE_FORMAT_ERROR))
        .ok()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time(errors: &mut FieldErrors, value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        errors.add("time", REQUIRED);
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| errors.add("time", TIME_FORMAT_ERROR))
        .ok()
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_owned())
        .filter(|r| !r.is_empty())
}
