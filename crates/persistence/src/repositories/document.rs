//! Document repository for database operations.

use serde_json::Value;
use sqlx::PgPool;

use crate::entities::DocumentEntity;
use crate::metrics::{QueryTimer, NO_COLLECTION};

/// Next modification time of a row: server clock, strictly after the previous value.
const NEXT_UPDATED_AT: &str = "GREATEST(now(), documents.updated_at + interval '1 microsecond')";

/// Repository for document-related database operations.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a document by collection and key.
    pub async fn find(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find", collection);
        let result = sqlx::query_as::<_, DocumentEntity>(
            r#"
            SELECT key, data, updated_at
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List every document of a collection, ordered by key.
    pub async fn list(&self, collection: &str) -> Result<Vec<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list", collection);
        let result = sqlx::query_as::<_, DocumentEntity>(
            r#"
            SELECT key, data, updated_at
            FROM documents
            WHERE collection = $1
            ORDER BY key
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Insert or overwrite a document.
    pub async fn upsert(
        &self,
        collection: &str,
        key: &str,
        data: &Value,
    ) -> Result<DocumentEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert", collection);
        let query = format!(
            r#"
            INSERT INTO documents (collection, key, data, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (collection, key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = {NEXT_UPDATED_AT}
            RETURNING key, data, updated_at
            "#
        );
        let result = sqlx::query_as::<_, DocumentEntity>(&query)
            .bind(collection)
            .bind(key)
            .bind(data)
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Insert a document only if the key is free. Returns `None` if it already exists.
    pub async fn insert_if_absent(
        &self,
        collection: &str,
        key: &str,
        data: &Value,
    ) -> Result<Option<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_if_absent", collection);
        let result = sqlx::query_as::<_, DocumentEntity>(
            r#"
            INSERT INTO documents (collection, key, data, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (collection, key) DO NOTHING
            RETURNING key, data, updated_at
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(data)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Overwrite a document only if it still carries `expected` as its modification time.
    ///
    /// Returns `None` when the document is missing or was modified since.
    pub async fn replace_if_unmodified(
        &self,
        collection: &str,
        key: &str,
        data: &Value,
        expected: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("replace_if_unmodified", collection);
        let query = format!(
            r#"
            UPDATE documents
            SET data = $3, updated_at = {NEXT_UPDATED_AT}
            WHERE collection = $1 AND key = $2 AND updated_at = $4
            RETURNING key, data, updated_at
            "#
        );
        let result = sqlx::query_as::<_, DocumentEntity>(&query)
            .bind(collection)
            .bind(key)
            .bind(data)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Set one top-level field to the new modification time, as an RFC 3339 string.
    pub async fn touch(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> Result<Option<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("touch", collection);
        let result = sqlx::query_as::<_, DocumentEntity>(
            r#"
            UPDATE documents AS d
            SET updated_at = s.ts,
                data = jsonb_set(
                    d.data,
                    ARRAY[$3]::text[],
                    to_jsonb(to_char(s.ts AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"')),
                    true
                )
            FROM (
                SELECT GREATEST(now(), updated_at + interval '1 microsecond') AS ts
                FROM documents
                WHERE collection = $1 AND key = $2
            ) AS s
            WHERE d.collection = $1 AND d.key = $2
            RETURNING d.key, d.data, d.updated_at
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(field)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Connectivity check.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        QueryTimer::new("ping", NO_COLLECTION)
            .finish(sqlx::query("SELECT 1").execute(&self.pool).await)
            .map(|_| ())
    }
}
