//! Server-sent event streams over store subscriptions.
//!
//! Each stream owns its subscription handle, so a client disconnect drops
//! the stream and unsubscribes. Only the latest snapshot is kept; a slow
//! client skips intermediate ones.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::models::GuestRow;
use domain::services::{
    load_registry, watch_dashboard, watch_invitation, DashboardSnapshot,
};
use domain::store::SubscriptionHandle;
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::invitations::{gate, InvitationGuest};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_live_stream;

pub const DASHBOARD_EVENT: &str = "dashboard";
pub const GUESTS_EVENT: &str = "guests";

/// Keeps a subscription alive for as long as its stream exists.
struct LiveStream {
    _subscription: SubscriptionHandle,
}

impl LiveStream {
    fn new(subscription: SubscriptionHandle) -> Self {
        record_live_stream(true);
        Self {
            _subscription: subscription,
        }
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        record_live_stream(false);
        debug!("Live stream closed");
    }
}

/// Turns the latest-value channel into a named SSE stream.
fn snapshot_stream<T>(
    event_name: &'static str,
    rx: watch::Receiver<Option<T>>,
    subscription: SubscriptionHandle,
) -> impl Stream<Item = Result<Event, Infallible>>
where
    T: Serialize + Send + Sync + 'static,
{
    let live = LiveStream::new(subscription);
    stream::unfold((rx, live), move |(mut rx, live)| async move {
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            let event = rx
                .borrow_and_update()
                .as_ref()
                .map(|value| Event::default().event(event_name).json_data(value));
            match event {
                Some(Ok(event)) => return Some((Ok(event), (rx, live))),
                Some(Err(e)) => warn!(error = %e, "Failed to encode live snapshot"),
                None => {}
            }
        }
    })
}

/// GET /api/v1/invitations/:code/guests/events
pub async fn invitation_events(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let access = gate(&state, &code).await?;

    let (tx, rx) = watch::channel::<Option<Vec<InvitationGuest>>>(None);
    let subscription = watch_invitation(
        state.store.as_ref(),
        access.invitation(),
        Arc::new(move |rows: Vec<GuestRow>| {
            tx.send_replace(Some(rows.into_iter().map(InvitationGuest::from).collect()));
        }),
    )
    .await?;

    Ok(Sse::new(snapshot_stream(GUESTS_EVENT, rx, subscription)).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/admin/events
pub async fn dashboard_events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let registry = load_registry(state.store.as_ref()).await?;

    let (tx, rx) = watch::channel::<Option<DashboardSnapshot>>(None);
    let subscription = watch_dashboard(
        state.store.as_ref(),
        registry,
        Arc::new(move |snapshot: DashboardSnapshot| {
            tx.send_replace(Some(snapshot));
        }),
    )
    .await?;

    Ok(Sse::new(snapshot_stream(DASHBOARD_EVENT, rx, subscription)).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::store::{Document, DocumentStore, MemoryStore, Precondition, RESPONSES};
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_stream_follows_collection_changes() {
        let store = MemoryStore::new();
        let (tx, rx) = watch::channel::<Option<usize>>(None);
        let subscription = store
            .subscribe_to_collection(
                RESPONSES,
                Arc::new(move |docs: Vec<Document>| {
                    tx.send_replace(Some(docs.len()));
                }),
            )
            .await
            .unwrap();

        let mut events = Box::pin(snapshot_stream("count", rx, subscription));
        assert!(events.next().await.is_some());

        store
            .write_document(RESPONSES, "ABC123:Alice", json!({}), Precondition::None)
            .await
            .unwrap();
        assert!(events.next().await.is_some());
    }
}
