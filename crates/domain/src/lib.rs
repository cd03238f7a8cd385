//! Domain layer for the wedding RSVP backend.
//!
//! This crate contains:
//! - Typed records for invitation codes and RSVP responses
//! - The document store interface and an in-memory implementation
//! - Dashboard view models, filtering, statistics and CSV export
//! - The invitation gate, RSVP submission and live feed services

pub mod models;
pub mod services;
pub mod store;
