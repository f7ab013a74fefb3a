//! Clinic Core - Shared domain types and access policy.
//!
//! This crate provides the types used across all clinic components:
//! - `server` - JSON API for doctors and patients
//! - `cli` - Command-line tools for migrations and account administration
//!
//! # Architecture
//!
//! The core crate contains only types, validation, and the authorization
//! policy - no I/O, no database access, no HTTP. Every ownership decision the
//! server makes goes through [`access::authorize`], so the policy can be
//! audited and tested without a running database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, phone numbers, appointment status, availability
//! - [`access`] - Ownership-scoped access control policy
//! - [`validation`] - Field-by-field validation error collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;
pub mod validation;

pub use access::{AccessDenied, Operation, Principal, Resource, authorize, can};
pub use types::*;
pub use validation::FieldErrors;
