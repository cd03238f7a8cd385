//! Document entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::store::Document;
use sqlx::FromRow;

/// Database row mapping for the documents table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentEntity {
    pub key: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentEntity> for Document {
    fn from(entity: DocumentEntity) -> Self {
        Self {
            key: entity.key,
            data: entity.data,
            updated_at: entity.updated_at,
        }
    }
}
