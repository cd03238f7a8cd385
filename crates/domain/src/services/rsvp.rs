//! RSVP submission.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use super::gate::InvitationAccess;
use crate::models::invitation::LAST_USED_FIELD;
use crate::models::response::{response_key, Attendance, ResponseData, ResponseRecord, RsvpStatus};
use crate::store::{DocumentStore, Precondition, StoreError, INVITATION_CODES, RESPONSES};

#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("Guest is not listed on this invitation")]
    UnknownGuest,

    #[error("Responses are not open for this invitation")]
    RsvpClosed,

    #[error("Please select at least one event you will attend")]
    MissingAttendance,

    #[error("{0}")]
    Validation(String),

    #[error("This response was changed since you loaded it")]
    Conflict,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RsvpError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PreconditionFailed => RsvpError::Conflict,
            other => RsvpError::Store(other),
        }
    }
}

/// Form values for one guest's response.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RsvpSubmission {
    #[validate(length(min = 1, max = 80, message = "Guest name is required"))]
    pub guest_name: String,

    pub status: RsvpStatus,

    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub email: Option<String>,

    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    #[serde(default)]
    pub comment: String,

    #[validate(length(max = 200, message = "Song request must be at most 200 characters"))]
    #[serde(default)]
    pub song: Option<String>,

    #[serde(default)]
    pub attendance: Attendance,

    /// Modification time the client last saw. When set, the write only
    /// succeeds if the stored response still carries this timestamp.
    #[serde(default)]
    pub expected_modified_at: Option<DateTime<Utc>>,
}

impl RsvpSubmission {
    /// Declined and vin-d'honneur-only answers carry no sub-event choices.
    fn normalized_attendance(&self, vin_honneur_only: bool) -> Attendance {
        if self.status == RsvpStatus::Declined || vin_honneur_only {
            Attendance::default()
        } else {
            self.attendance
        }
    }

    fn into_data(self, code: &str, vin_honneur_only: bool) -> ResponseData {
        let attendance = self.normalized_attendance(vin_honneur_only);
        ResponseData {
            code: code.to_string(),
            guest_name: self.guest_name,
            status: self.status,
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            comment: self.comment.trim().to_string(),
            song: self
                .song
                .filter(|_| !vin_honneur_only)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            attendance,
        }
    }
}

/// Checks a submission before anything is written.
pub fn validate_submission(
    access: &InvitationAccess,
    submission: &RsvpSubmission,
) -> Result<(), RsvpError> {
    if !access.has_member(&submission.guest_name) {
        return Err(RsvpError::UnknownGuest);
    }
    if !access.rsvp_enabled {
        return Err(RsvpError::RsvpClosed);
    }
    submission
        .validate()
        .map_err(|e| RsvpError::Validation(first_validation_message(&e)))?;
    if submission.status == RsvpStatus::Accepted
        && !access.vin_honneur_only
        && !submission.attendance.any()
    {
        return Err(RsvpError::MissingAttendance);
    }
    Ok(())
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid submission".to_string())
}

/// Validates and stores a guest's response, overwriting any previous one.
///
/// Without `expected_modified_at` the last write wins. Touching the
/// invitation's last-used time is best effort.
pub async fn submit_response(
    store: &dyn DocumentStore,
    access: &InvitationAccess,
    submission: RsvpSubmission,
) -> Result<ResponseRecord, RsvpError> {
    validate_submission(access, &submission)?;

    let precondition = submission
        .expected_modified_at
        .map(Precondition::UpdatedAt)
        .unwrap_or_default();
    let data = submission.into_data(&access.code, access.vin_honneur_only);
    let key = response_key(&access.code, &data.guest_name);

    let value = data.to_value().map_err(StoreError::from)?;
    let doc = store
        .write_document(RESPONSES, &key, value, precondition)
        .await?;

    if let Err(e) = store
        .touch_document(INVITATION_CODES, &access.code, LAST_USED_FIELD)
        .await
    {
        warn!(code = %access.code, error = %e, "Failed to update invitation last-used time");
    }

    info!(
        code = %access.code,
        status = ?data.status,
        "RSVP response recorded"
    );

    Ok(ResponseRecord {
        code: data.code,
        guest_name: data.guest_name,
        status: data.status,
        email: data.email,
        comment: data.comment,
        song: data.song,
        attendance: data.attendance,
        modified_at: doc.updated_at,
    })
}
