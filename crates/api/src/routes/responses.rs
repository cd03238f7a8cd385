//! RSVP submission route.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::ResponseRecord;
use domain::services::{submit_response, RsvpSubmission};

use super::invitations::gate;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_rsvp_submission;

/// POST /api/v1/invitations/:code/responses
///
/// Saves one guest's answer. Resubmitting overwrites the previous answer.
pub async fn submit(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(submission): Json<RsvpSubmission>,
) -> Result<Json<ResponseRecord>, ApiError> {
    let access = gate(&state, &code).await?;
    let record = submit_response(state.store.as_ref(), &access, submission).await?;
    record_rsvp_submission(record.status);
    Ok(Json(record))
}
