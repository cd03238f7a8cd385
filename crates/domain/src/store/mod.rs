//! Document store abstraction.
//!
//! All persistence goes through [`DocumentStore`], a small interface over a
//! document database: keyed reads, whole-collection reads, overwriting writes
//! and live collection subscriptions. The API crate injects a concrete store
//! (PostgreSQL in production, [`memory::MemoryStore`] in tests and local runs).

pub mod memory;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;

pub use memory::MemoryStore;

/// Collection holding one document per invitation code.
pub const INVITATION_CODES: &str = "invitation_codes";

/// Collection holding one document per (code, guest) response.
pub const RESPONSES: &str = "responses";

/// A stored document with its server-assigned modification time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub key: String,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

/// Condition a write must satisfy before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precondition {
    /// Unconditional overwrite (last write wins).
    #[default]
    None,
    /// The document must not exist yet.
    Absent,
    /// The document must exist with exactly this modification time.
    UpdatedAt(DateTime<Utc>),
}

impl Precondition {
    /// Checks the precondition against the current document, if any.
    pub fn is_satisfied_by(&self, current: Option<&Document>) -> bool {
        match (self, current) {
            (Precondition::None, _) => true,
            (Precondition::Absent, None) => true,
            (Precondition::Absent, Some(_)) => false,
            (Precondition::UpdatedAt(_), None) => false,
            (Precondition::UpdatedAt(expected), Some(doc)) => doc.updated_at == *expected,
        }
    }
}

/// Errors surfaced by document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write precondition failed")]
    PreconditionFailed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Callback invoked with the full collection snapshot after every change.
pub type SnapshotCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// Shared switch between a subscription task and its handle.
///
/// Delivery happens while holding the lock, so once [`SubscriptionHandle::unsubscribe`]
/// returns no callback is running and none will start.
#[derive(Clone)]
pub struct SubscriptionGate {
    active: Arc<Mutex<bool>>,
}

impl SubscriptionGate {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(true)),
        }
    }

    /// Invokes the callback if the subscription is still live.
    ///
    /// Returns false once the subscription has been torn down.
    pub fn deliver(&self, callback: &SnapshotCallback, snapshot: Vec<Document>) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !*active {
            return false;
        }
        callback(snapshot);
        true
    }

    fn close(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        *active = false;
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a live collection subscription. Dropping it unsubscribes.
pub struct SubscriptionHandle {
    gate: SubscriptionGate,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn new(gate: SubscriptionGate, task: JoinHandle<()>) -> Self {
        Self {
            gate,
            task: Some(task),
        }
    }

    /// Stops the subscription.
    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    fn shutdown(&mut self) {
        self.gate.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Interface to the external document database.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Keyed read. Returns `None` when the document does not exist.
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Reads every document of a collection, ordered by key.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Overwrites (never merges) a document and stamps it with the server time.
    async fn write_document(
        &self,
        collection: &str,
        key: &str,
        data: Value,
        precondition: Precondition,
    ) -> Result<Document, StoreError>;

    /// Sets one top-level field of an existing document to the server time.
    ///
    /// Returns `None` when the document does not exist.
    async fn touch_document(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Subscribes to a collection.
    ///
    /// The callback receives the current snapshot right away and a fresh
    /// snapshot after every change, until the returned handle is dropped.
    async fn subscribe_to_collection(
        &self,
        collection: &str,
        callback: SnapshotCallback,
    ) -> Result<SubscriptionHandle, StoreError>;

    /// Connectivity check used by health probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
