//! Database entity definitions (row mappings).

pub mod document;

pub use document::DocumentEntity;
