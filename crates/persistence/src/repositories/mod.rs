//! Repository implementations for database operations.

pub mod document;

pub use document::DocumentRepository;
