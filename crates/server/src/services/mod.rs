//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login, doctor registration, and bearer tokens
//! - `records` - Ownership-scoped profile, patient, and appointment operations

pub mod auth;
pub mod records;
