//! Live view models over the document store.
//!
//! The registry is read once per view; responses are followed through a
//! collection subscription and every snapshot rebuilds the rows.

use std::sync::Arc;

use serde::Serialize;

use crate::models::guest::{build_guest_rows, GuestRow};
use crate::models::invitation::{InvitationCode, InvitationRegistry};
use crate::models::response::ResponseRecord;
use crate::models::stats::DashboardStats;
use crate::store::{
    Document, DocumentStore, StoreError, SubscriptionHandle, INVITATION_CODES, RESPONSES,
};

/// Everything the admin dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub rows: Vec<GuestRow>,
    pub stats: DashboardStats,
}

impl DashboardSnapshot {
    pub fn build(registry: &InvitationRegistry, responses: &[ResponseRecord]) -> Self {
        let rows = build_guest_rows(registry, responses);
        let stats = DashboardStats::compute(registry, &rows);
        Self { rows, stats }
    }
}

pub type DashboardCallback = Arc<dyn Fn(DashboardSnapshot) + Send + Sync>;
pub type GuestRowsCallback = Arc<dyn Fn(Vec<GuestRow>) + Send + Sync>;

/// Reads the invitation registry, skipping malformed codes.
pub async fn load_registry(store: &dyn DocumentStore) -> Result<InvitationRegistry, StoreError> {
    let docs = store.list_documents(INVITATION_CODES).await?;
    Ok(InvitationRegistry::from_documents(&docs))
}

pub async fn load_responses(store: &dyn DocumentStore) -> Result<Vec<ResponseRecord>, StoreError> {
    let docs = store.list_documents(RESPONSES).await?;
    Ok(ResponseRecord::from_documents(&docs))
}

/// One-shot dashboard read.
pub async fn load_dashboard(store: &dyn DocumentStore) -> Result<DashboardSnapshot, StoreError> {
    let registry = load_registry(store).await?;
    let responses = load_responses(store).await?;
    Ok(DashboardSnapshot::build(&registry, &responses))
}

/// Rows of a single invitation, for the RSVP form.
pub fn invitation_rows(invitation: &InvitationCode, responses: &[ResponseRecord]) -> Vec<GuestRow> {
    let registry = InvitationRegistry::new(vec![invitation.clone()]);
    build_guest_rows(&registry, responses)
}

/// Follows the responses collection and feeds rebuilt dashboard snapshots to `callback`.
pub async fn watch_dashboard(
    store: &dyn DocumentStore,
    registry: InvitationRegistry,
    callback: DashboardCallback,
) -> Result<SubscriptionHandle, StoreError> {
    store
        .subscribe_to_collection(
            RESPONSES,
            Arc::new(move |docs: Vec<Document>| {
                let responses = ResponseRecord::from_documents(&docs);
                callback(DashboardSnapshot::build(&registry, &responses));
            }),
        )
        .await
}

/// Follows the responses of one invitation's guests.
pub async fn watch_invitation(
    store: &dyn DocumentStore,
    invitation: InvitationCode,
    callback: GuestRowsCallback,
) -> Result<SubscriptionHandle, StoreError> {
    store
        .subscribe_to_collection(
            RESPONSES,
            Arc::new(move |docs: Vec<Document>| {
                let responses: Vec<ResponseRecord> = ResponseRecord::from_documents(&docs)
                    .into_iter()
                    .filter(|r| r.code == invitation.code)
                    .collect();
                callback(invitation_rows(&invitation, &responses));
            }),
        )
        .await
}
