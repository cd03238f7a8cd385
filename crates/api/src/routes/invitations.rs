//! Invitation gate and member list routes.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{Attendance, GuestRow, GuestStatus};
use domain::services::{live::invitation_rows, load_responses, open_invitation, GateError, InvitationAccess};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_gate_failure;

#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub code: String,
}

/// A member as shown on the RSVP form. Email addresses stay on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationGuest {
    pub name: String,
    pub status: GuestStatus,
    pub attendance: Attendance,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<GuestRow> for InvitationGuest {
    fn from(row: GuestRow) -> Self {
        Self {
            name: row.name,
            status: row.status,
            attendance: row.attendance,
            comment: row.comment,
            song: row.song,
            modified_at: row.modified_at,
        }
    }
}

/// Runs the gate for a guest-facing route.
pub(crate) async fn gate(state: &AppState, raw_code: &str) -> Result<InvitationAccess, ApiError> {
    open_invitation(state.store.as_ref(), &state.code_lists, raw_code)
        .await
        .map_err(|e| {
            if matches!(e, GateError::InvalidCode) {
                record_gate_failure();
            }
            ApiError::from(e)
        })
}

/// POST /api/v1/invitations/access
pub async fn open(
    State(state): State<AppState>,
    Json(request): Json<AccessRequest>,
) -> Result<Json<InvitationAccess>, ApiError> {
    let access = gate(&state, &request.code).await?;
    Ok(Json(access))
}

/// GET /api/v1/invitations/:code/guests
pub async fn list_guests(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<InvitationGuest>>, ApiError> {
    let access = gate(&state, &code).await?;
    let responses: Vec<_> = load_responses(state.store.as_ref())
        .await?
        .into_iter()
        .filter(|r| r.code == access.code)
        .collect();

    let guests = invitation_rows(&access.invitation(), &responses)
        .into_iter()
        .map(InvitationGuest::from)
        .collect();
    Ok(Json(guests))
}
