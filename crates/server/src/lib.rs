//! Clinic API server library.
//!
//! Doctors register and log in, create patients, and manage appointments;
//! patients log in, manage their profiles, and book appointments. Every
//! record access is checked against the ownership policy in
//! [`clinic_core::access`].
//!
//! The binary in `main.rs` wires this library to Sentry, tracing, and a TCP
//! listener; everything else is here so it can be tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
