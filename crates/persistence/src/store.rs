//! PostgreSQL implementation of the document store.
//!
//! Documents live in a single JSONB table. A trigger publishes the changed
//! collection on the `document_changes` channel; subscriptions hold a
//! `PgListener` and re-read the collection when their name comes by.

use std::time::Duration;

use domain::store::{
    Document, DocumentStore, Precondition, SnapshotCallback, StoreError, SubscriptionGate,
    SubscriptionHandle,
};
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::metrics::record_pool_metrics;
use crate::repositories::DocumentRepository;

/// Notification channel fed by the documents trigger.
pub const CHANGE_CHANNEL: &str = "document_changes";

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// [`DocumentStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    repo: DocumentRepository,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: DocumentRepository::new(pool),
        }
    }

    async fn snapshot(repo: &DocumentRepository, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = repo.list(collection).await.map_err(unavailable)?;
        Ok(rows.into_iter().map(Document::from).collect())
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = self.repo.find(collection, key).await.map_err(unavailable)?;
        Ok(row.map(Document::from))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Self::snapshot(&self.repo, collection).await
    }

    async fn write_document(
        &self,
        collection: &str,
        key: &str,
        data: Value,
        precondition: Precondition,
    ) -> Result<Document, StoreError> {
        let written = match precondition {
            Precondition::None => Some(
                self.repo
                    .upsert(collection, key, &data)
                    .await
                    .map_err(unavailable)?,
            ),
            Precondition::Absent => self
                .repo
                .insert_if_absent(collection, key, &data)
                .await
                .map_err(unavailable)?,
            Precondition::UpdatedAt(expected) => self
                .repo
                .replace_if_unmodified(collection, key, &data, expected)
                .await
                .map_err(unavailable)?,
        };

        match written {
            Some(row) => {
                debug!(collection, key, "Document written");
                Ok(row.into())
            }
            None => Err(StoreError::PreconditionFailed),
        }
    }

    async fn touch_document(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = self
            .repo
            .touch(collection, key, field)
            .await
            .map_err(unavailable)?;
        Ok(row.map(Document::from))
    }

    async fn subscribe_to_collection(
        &self,
        collection: &str,
        callback: SnapshotCallback,
    ) -> Result<SubscriptionHandle, StoreError> {
        // Listen before the first read so no change slips in between.
        let mut listener = PgListener::connect_with(self.repo.pool())
            .await
            .map_err(unavailable)?;
        listener.listen(CHANGE_CHANNEL).await.map_err(unavailable)?;

        let initial = Self::snapshot(&self.repo, collection).await?;
        let repo = self.repo.clone();
        let collection = collection.to_string();
        let gate = SubscriptionGate::new();
        let task_gate = gate.clone();

        let task = tokio::spawn(async move {
            if !task_gate.deliver(&callback, initial) {
                return;
            }
            loop {
                match listener.recv().await {
                    Ok(notification) if notification.payload() != collection => continue,
                    Ok(_) => {}
                    Err(e) => {
                        // The listener reconnects on the next recv; notifications
                        // sent meanwhile are lost, so refresh anyway.
                        warn!(error = %e, collection = %collection, "Change listener failed, reconnecting");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }

                match Self::snapshot(&repo, &collection).await {
                    Ok(docs) => {
                        if !task_gate.deliver(&callback, docs) {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, collection = %collection, "Failed to refresh subscription"),
                }
            }
        });

        Ok(SubscriptionHandle::new(gate, task))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        record_pool_metrics(self.repo.pool());
        self.repo.ping().await.map_err(unavailable)
    }
}
