//! Doctor domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{DoctorId, Email, FieldErrors, PhoneNumber, TimeRange, availability_summary};

use super::MAX_NAME_LENGTH;

/// Maximum length of the free-text address.
pub const MAX_ADDRESS_LENGTH: usize = 255;
/// Maximum length of the specialization label.
pub const MAX_SPECIALIZATION_LENGTH: usize = 100;
/// Maximum length of the free-text day list.
pub const MAX_AVAILABILITY_DAYS_LENGTH: usize = 100;
/// Maximum length of the stored time range.
pub const MAX_TIME_RANGE_LENGTH: usize = 50;

/// A doctor account (domain type).
#[derive(Debug, Clone)]
pub struct Doctor {
    pub id: DoctorId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<PhoneNumber>,
    pub address: Option<String>,
    pub medical_specialization: Option<String>,
    /// Free-text, comma-separated day list, e.g. "Monday,Wednesday".
    pub availability_days: Option<String>,
    pub availability_time_range: Option<TimeRange>,
    /// Inactive doctors cannot log in or be booked.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// Human-readable availability line.
    #[must_use]
    pub fn availability(&self) -> String {
        availability_summary(
            self.availability_days.as_deref(),
            self.availability_time_range.as_ref(),
        )
    }
}

/// Doctor profile as returned to the doctor.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorProfileView {
    pub id: DoctorId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<PhoneNumber>,
    pub address: Option<String>,
    pub medical_specialization: Option<String>,
    pub availability_days: Option<String>,
    pub availability_time_range: Option<TimeRange>,
    pub availability: String,
}

impl From<&Doctor> for DoctorProfileView {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            email: doctor.email.clone(),
            first_name: doctor.first_name.clone(),
            last_name: doctor.last_name.clone(),
            phone_number: doctor.phone_number.clone(),
            address: doctor.address.clone(),
            medical_specialization: doctor.medical_specialization.clone(),
            availability_days: doctor.availability_days.clone(),
            availability_time_range: doctor.availability_time_range,
            availability: doctor.availability(),
        }
    }
}

/// Body of `POST /doctors/signup`.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DoctorSignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl DoctorSignupRequest {
    /// Validate every field and produce a [`NewDoctor`].
    ///
    /// # Errors
    ///
    /// Returns all field problems, including a `password` error when the
    /// confirmation does not match.
    pub fn validate(self) -> Result<NewDoctor, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name =
            super::required_text(&mut errors, "first_name", &self.first_name, MAX_NAME_LENGTH);
        let last_name =
            super::required_text(&mut errors, "last_name", &self.last_name, MAX_NAME_LENGTH);
        let email = super::email(&mut errors, "email", &self.email);
        super::password(&mut errors, "password", &self.password);
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", super::BLANK);
        }
        errors.check(
            self.password == self.confirm_password,
            "password",
            "Passwords must match.",
        );

        match email {
            Some(email) if errors.is_empty() => Ok(NewDoctor {
                email,
                first_name,
                last_name,
                password: self.password,
            }),
            _ => Err(errors),
        }
    }
}

/// A validated doctor registration.
pub struct NewDoctor {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Plaintext; hashed by the auth service before storage.
    pub password: String,
}

impl std::fmt::Debug for NewDoctor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewDoctor")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `PATCH /doctors/profile`.
///
/// `email` is not listed and is therefore ignored if sent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoctorProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub medical_specialization: Option<String>,
    pub availability_days: Option<String>,
    pub availability_time_range: Option<String>,
}

impl DoctorProfileUpdate {
    /// Validate the fields present in the update.
    ///
    /// # Errors
    ///
    /// Returns all field problems found.
    pub fn validate(self) -> Result<DoctorChanges, FieldErrors> {
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
        let address = self
            .address
            .map(|v| super::optional_text(&mut errors, "address", &v, MAX_ADDRESS_LENGTH));
        let medical_specialization = self.medical_specialization.map(|v| {
            super::optional_text(
                &mut errors,
                "medical_specialization",
                &v,
                MAX_SPECIALIZATION_LENGTH,
            )
        });
        let availability_days = self.availability_days.map(|v| {
            super::optional_text(
                &mut errors,
                "availability_days",
                &v,
                MAX_AVAILABILITY_DAYS_LENGTH,
            )
        });
        let availability_time_range = self
            .availability_time_range
            .map(|v| time_range(&mut errors, &v));

        errors.finish(DoctorChanges {
            first_name,
            last_name,
            phone_number,
            address,
            medical_specialization,
            availability_days,
            availability_time_range,
        })
    }
}

fn time_range(errors: &mut FieldErrors, value: &str) -> Option<TimeRange> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > MAX_TIME_RANGE_LENGTH {
        errors.add("availability_time_range", super::too_long(MAX_TIME_RANGE_LENGTH));
        return None;
    }
    TimeRange::parse(value)
        .map_err(|e| errors.add("availability_time_range", e.to_string()))
        .ok()
}

/// Validated profile changes. `None` leaves a field untouched; `Some(None)`
/// clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<Option<PhoneNumber>>,
    pub address: Option<Option<String>>,
    pub medical_specialization: Option<Option<String>>,
    pub availability_days: Option<Option<String>>,
    pub availability_time_range: Option<Option<TimeRange>>,
}

impl DoctorChanges {
    /// Apply the changes to a loaded doctor.
    pub fn apply(self, doctor: &mut Doctor) {
        if let Some(v) = self.first_name {
            doctor.first_name = v;
        }
        if let Some(v) = self.last_name {
            doctor.last_name = v;
        }
        if let Some(v) = self.phone_number {
            doctor.phone_number = v;
        }
        if let Some(v) = self.address {
            doctor.address = v;
        }
        if let Some(v) = self.medical_specialization {
            doctor.medical_specialization = v;
        }
        if let Some(v) = self.availability_days {
            doctor.availability_days = v;
        }
        if let Some(v) = self.availability_time_range {
            doctor.availability_time_range = v;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signup() -> DoctorSignupRequest {
        DoctorSignupRequest {
            first_name: "Gregory".to_owned(),
            last_name: "House".to_owned(),
            email: "house@Princeton.EDU".to_owned(),
            password: "vicodin-4-ever".to_owned(),
            confirm_password: "vicodin-4-ever".to_owned(),
        }
    }

    fn doctor() -> Doctor {
        Doctor {
            id: DoctorId::new(1),
            email: Email::parse("house@princeton.edu").unwrap(),
            first_name: "Gregory".to_owned(),
            last_name: "House".to_owned(),
            phone_number: None,
            address: None,
            medical_specialization: None,
            availability_days: None,
            availability_time_range: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_signup_valid() {
        let new = signup().validate().unwrap();
        assert_eq!(new.email.as_str(), "house@princeton.edu");
        assert_eq!(new.first_name, "Gregory");
    }

    #[test]
    fn test_signup_password_mismatch_reports_on_password() {
        let mut request = signup();
        request.confirm_password = "something-else".to_owned();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["Passwords must match."]);
    }

    #[test]
    fn test_signup_collects_every_field() {
        let errors = DoctorSignupRequest::default().validate().unwrap_err();
        for field in ["first_name", "last_name", "email", "password", "confirm_password"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_signup_rejects_long_names() {
        let mut request = signup();
        request.last_name = "L".repeat(MAX_NAME_LENGTH + 1);
        let errors = request.validate().unwrap_err();
        assert!(errors.get("last_name").is_some());
    }

    #[test]
    fn test_signup_debug_redacts_password() {
        let new = signup().validate().unwrap();
        assert!(!format!("{new:?}").contains("vicodin"));
    }

    #[test]
    fn test_profile_update_applies_only_present_fields() {
        let update: DoctorProfileUpdate = serde_json::from_value(serde_json::json!({
            "address": "221B Baker St",
            "availability_days": "Monday,Thursday",
            "availability_time_range": "08:00-12:00",
            "email": "ignored@example.com"
        }))
        .unwrap();

        let mut doc = doctor();
        update.validate().unwrap().apply(&mut doc);

        assert_eq!(doc.first_name, "Gregory");
        assert_eq!(doc.email.as_str(), "house@princeton.edu");
        assert_eq!(doc.address.as_deref(), Some("221B Baker St"));
        assert_eq!(doc.availability(), "Available on: Monday, Thursday from 08:00 - 12:00");
    }

    #[test]
    fn test_profile_update_blank_clears_optional_field() {
        let mut doc = doctor();
        doc.address = Some("old".to_owned());
        let changes = DoctorProfileUpdate {
            address: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        changes.apply(&mut doc);
        assert_eq!(doc.address, None);
    }

    #[test]
    fn test_profile_update_validates_phone_and_range() {
        let errors = DoctorProfileUpdate {
            phone_number: Some("12-34".to_owned()),
            availability_time_range: Some("17:00-09:00".to_owned()),
            first_name: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.get("phone_number").unwrap(), ["Enter a valid phone number."]);
        assert!(errors.get("availability_time_range").is_some());
        assert!(errors.get("first_name").is_some());
    }

    #[test]
    fn test_profile_view_includes_summary() {
        let view = DoctorProfileView::from(&doctor());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["availability"], "No availability set.");
        assert_eq!(json["email"], "house@princeton.edu");
        assert!(json.get("is_active").is_none());
    }
}
