//! In-memory document store.
//!
//! Backs local development and every test that needs a [`DocumentStore`].
//! Change notifications fan out over a broadcast channel per collection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::{
    Document, DocumentStore, Precondition, SnapshotCallback, StoreError, SubscriptionGate,
    SubscriptionHandle,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

type Collection = BTreeMap<String, Document>;

#[derive(Default)]
struct Inner {
    collections: RwLock<HashMap<String, Collection>>,
    channels: RwLock<HashMap<String, broadcast::Sender<()>>>,
}

/// Thread-safe in-memory [`DocumentStore`]. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document directly, bypassing preconditions. Used for seeding.
    pub fn seed(&self, collection: &str, key: &str, data: Value) -> Document {
        let doc = self.put(collection, key, data);
        self.notify(collection);
        doc
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.inner
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    fn sender(&self, collection: &str) -> broadcast::Sender<()> {
        if let Some(tx) = self
            .inner
            .channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
        {
            return tx.clone();
        }

        let mut channels = self.inner.channels.write().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .clone()
    }

    fn notify(&self, collection: &str) {
        // No receivers is not an error: nobody is watching yet.
        let _ = self.sender(collection).send(());
    }

    /// Next server timestamp for a key: microsecond precision, strictly
    /// increasing per document so preconditions stay unambiguous.
    fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        match previous {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        }
    }

    fn put(&self, collection: &str, key: &str, data: Value) -> Document {
        let mut collections = self
            .inner
            .collections
            .write()
            .unwrap_or_else(|e| e.into_inner());
        let docs = collections.entry(collection.to_string()).or_default();
        let updated_at = Self::next_timestamp(docs.get(key).map(|d| d.updated_at));
        let doc = Document {
            key: key.to_string(),
            data,
            updated_at,
        };
        docs.insert(key.to_string(), doc.clone());
        doc
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .inner
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .and_then(|c| c.get(key).cloned()))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.snapshot(collection))
    }

    async fn write_document(
        &self,
        collection: &str,
        key: &str,
        data: Value,
        precondition: Precondition,
    ) -> Result<Document, StoreError> {
        let doc = {
            let mut collections = self
                .inner
                .collections
                .write()
                .unwrap_or_else(|e| e.into_inner());
            let docs = collections.entry(collection.to_string()).or_default();
            let current = docs.get(key);
            if !precondition.is_satisfied_by(current) {
                return Err(StoreError::PreconditionFailed);
            }
            let updated_at = Self::next_timestamp(current.map(|d| d.updated_at));
            let doc = Document {
                key: key.to_string(),
                data,
                updated_at,
            };
            docs.insert(key.to_string(), doc.clone());
            doc
        };

        debug!(collection, key, "Document written");
        self.notify(collection);
        Ok(doc)
    }

    async fn touch_document(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>, StoreError> {
        let doc = {
            let mut collections = self
                .inner
                .collections
                .write()
                .unwrap_or_else(|e| e.into_inner());
            let Some(existing) = collections.get_mut(collection).and_then(|c| c.get_mut(key))
            else {
                return Ok(None);
            };
            let updated_at = Self::next_timestamp(Some(existing.updated_at));
            match existing.data.as_object_mut() {
                Some(fields) => {
                    fields.insert(
                        field.to_string(),
                        Value::String(updated_at.to_rfc3339()),
                    );
                }
                None => {
                    return Err(StoreError::Serialization(format!(
                        "document {collection}/{key} is not an object"
                    )))
                }
            }
            existing.updated_at = updated_at;
            existing.clone()
        };

        self.notify(collection);
        Ok(Some(doc))
    }

    async fn subscribe_to_collection(
        &self,
        collection: &str,
        callback: SnapshotCallback,
    ) -> Result<SubscriptionHandle, StoreError> {
        // Subscribe before the first read so no change slips in between.
        let mut rx = self.sender(collection).subscribe();
        let store = self.clone();
        let collection = collection.to_string();
        let gate = SubscriptionGate::new();
        let task_gate = gate.clone();

        let task = tokio::spawn(async move {
            if !task_gate.deliver(&callback, store.snapshot(&collection)) {
                return;
            }
            loop {
                match rx.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if !task_gate.deliver(&callback, store.snapshot(&collection)) {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(SubscriptionHandle::new(gate, task))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
