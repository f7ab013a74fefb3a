//! Phone number type.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Optional leading `+`, optional leading `1`, then 9 to 15 ASCII digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?1?[0-9]{9,15}$").expect("phone pattern is a valid regex"));

/// Error returned when a phone number does not match the accepted format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Enter a valid phone number.")]
pub struct PhoneNumberError;

/// A contact phone number for a doctor or patient.
///
/// Separators are not accepted; store `+15551234567`, not `+1 (555) 123-4567`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Longest value the pattern accepts: `+`, `1`, and 15 digits.
    pub const MAX_LENGTH: usize = 17;

    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneNumberError`] if the input is not an optional `+`,
    /// an optional `1`, and 9-15 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let s = s.trim();
        if PHONE_PATTERN.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(PhoneNumberError)
        }
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_international() {
        assert!(PhoneNumber::parse("123456789").is_ok());
        assert!(PhoneNumber::parse("+1234567890").is_ok());
        assert!(PhoneNumber::parse("+15551234567").is_ok());
        assert!(PhoneNumber::parse("123456789012345").is_ok());
    }

    #[test]
    fn test_rejects_separators_and_short_numbers() {
        assert_eq!(PhoneNumber::parse("123-456-7890"), Err(PhoneNumberError));
        assert_eq!(PhoneNumber::parse("12345678"), Err(PhoneNumberError));
        assert_eq!(PhoneNumber::parse(""), Err(PhoneNumberError));
        assert_eq!(PhoneNumber::parse("++123456789"), Err(PhoneNumberError));
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        assert!(PhoneNumber::parse("١٢٣٤٥٦٧٨٩٠").is_err());
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(PhoneNumber::parse(" +1234567890 ").unwrap().as_str(), "+1234567890");
    }
}
