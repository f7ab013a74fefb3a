//! Appointment status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known [`AppointmentStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct StatusParseError(pub String);

/// Lifecycle state of an appointment.
///
/// New appointments start as `Scheduled`. Only the treating doctor moves an
/// appointment to `Completed` or `Canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "clinic.appointment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::Completed, Self::Canceled];

    /// The wire and database spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the appointment still occupies its doctor's timeslot.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        !matches!(self, Self::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_scheduled() {
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_parse_known_statuses() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_unknown_status() {
        let err = "unknown".parse::<AppointmentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "\"unknown\" is not a valid choice.");
        assert!("Scheduled".parse::<AppointmentStatus>().is_err());
        assert!("cancelled".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_serde_spelling() {
        let json = serde_json::to_string(&AppointmentStatus::Canceled).unwrap();
        assert_eq!(json, "\"canceled\"");
    }

    #[test]
    fn test_only_canceled_releases_slot() {
        assert!(AppointmentStatus::Scheduled.holds_slot());
        assert!(AppointmentStatus::Completed.holds_slot());
        assert!(!AppointmentStatus::Canceled.holds_slot());
    }
}
