//! Core types for the clinic backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod availability;
pub mod email;
pub mod id;
pub mod phone;
pub mod status;

pub use availability::{AvailabilityError, TimeRange, availability_summary};
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use status::{AppointmentStatus, StatusParseError};
