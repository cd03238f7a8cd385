//! Admin dashboard API routes.
//!
//! All routes here sit behind [`crate::middleware::require_admin`].

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use domain::models::{
    export_filename, generate_invitation_code, listing, render_guest_csv, CreateInvitationRequest,
    DashboardStats, GuestFilter, GuestRow, InvitationCode, SortDirection, SortKey, SortState,
    StatusFilter,
};
use domain::services::load_dashboard;
use domain::store::{Precondition, StoreError, INVITATION_CODES};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_invitation_created;

/// Attempts at drawing an unused code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Filter and sort parameters shared by the listing and the export.
#[derive(Debug, Default, Deserialize)]
pub struct GuestListQuery {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

impl GuestListQuery {
    fn filter(&self) -> Result<GuestFilter, ApiError> {
        let status: StatusFilter = self.status.parse().map_err(ApiError::Validation)?;
        Ok(GuestFilter {
            status,
            code: self.code.clone(),
            name: self.name.clone(),
        })
    }

    fn sort(&self) -> SortState {
        let default = SortState::default();
        SortState {
            key: self.sort.unwrap_or(default.key),
            direction: self.direction.unwrap_or(default.direction),
        }
    }

    fn select(&self, rows: &[GuestRow]) -> Result<Vec<GuestRow>, ApiError> {
        Ok(listing::apply(rows, &self.filter()?, self.sort()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GuestListResponse {
    pub total: usize,
    pub shown: usize,
    pub sort: SortState,
    pub rows: Vec<GuestRow>,
}

/// GET /api/v1/admin/guests
pub async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<GuestListQuery>,
) -> Result<Json<GuestListResponse>, ApiError> {
    let snapshot = load_dashboard(state.store.as_ref()).await?;
    let rows = query.select(&snapshot.rows)?;

    Ok(Json(GuestListResponse {
        total: snapshot.rows.len(),
        shown: rows.len(),
        sort: query.sort(),
        rows,
    }))
}

/// GET /api/v1/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let snapshot = load_dashboard(state.store.as_ref()).await?;
    Ok(Json(snapshot.stats))
}

/// GET /api/v1/admin/export
///
/// CSV of the rows as currently filtered and sorted.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<GuestListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = load_dashboard(state.store.as_ref()).await?;
    let rows = query.select(&snapshot.rows)?;
    let filename = export_filename(Utc::now().date_naive());

    info!(rows = rows.len(), "Admin exported guest list");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        render_guest_csv(&rows),
    ))
}

/// POST /api/v1/admin/invitations
///
/// Provisions a new code. Never overwrites an existing one.
pub async fn create_invitation(
    State(state): State<AppState>,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationCode>), ApiError> {
    request.validate()?;

    for _ in 0..MAX_CODE_ATTEMPTS {
        let invitation = request.clone().into_invitation(generate_invitation_code());
        let written = state
            .store
            .write_document(
                INVITATION_CODES,
                &invitation.code,
                invitation.to_document_data(),
                Precondition::Absent,
            )
            .await;

        match written {
            Ok(_) => {
                info!(
                    code = %invitation.code,
                    members = invitation.members.len(),
                    "Invitation code created"
                );
                record_invitation_created();
                return Ok((StatusCode::CREATED, Json(invitation)));
            }
            Err(StoreError::PreconditionFailed) => {
                warn!(code = %invitation.code, "Generated code already taken, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(attempts = MAX_CODE_ATTEMPTS, "No unused invitation code found");
    Err(ApiError::Conflict(
        "Could not allocate an unused invitation code".to_string(),
    ))
}
