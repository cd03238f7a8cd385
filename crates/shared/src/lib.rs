//! Shared utilities and common types for the wedding RSVP backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Invitation code normalisation and code-list parsing
//! - Hashing helpers for the admin key
//! - Common validation logic

pub mod codes;
pub mod crypto;
pub mod validation;
