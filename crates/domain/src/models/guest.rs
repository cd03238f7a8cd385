//! Per-guest view model joining the invitation registry with responses.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::invitation::InvitationRegistry;
use super::response::{Attendance, GuestStatus, ResponseRecord};

/// One guest of one invitation code, with their resolved response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GuestRow {
    pub name: String,
    pub code: String,
    pub status: GuestStatus,
    pub attendance: Attendance,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl GuestRow {
    /// Row for a guest who has not answered yet.
    pub fn pending(code: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            status: GuestStatus::Pending,
            attendance: Attendance::default(),
            comment: String::new(),
            email: None,
            song: None,
            modified_at: None,
        }
    }

    fn answered(code: &str, name: &str, response: &ResponseRecord) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            status: response.status.into(),
            attendance: response.attendance,
            comment: response.comment.clone(),
            email: response.email.clone(),
            song: response.song.clone(),
            modified_at: Some(response.modified_at),
        }
    }
}

/// Builds one row per (code, member), in registry order then member order.
///
/// Responses are matched on the exact (code, name) pair; guests without one
/// are pending.
pub fn build_guest_rows(registry: &InvitationRegistry, responses: &[ResponseRecord]) -> Vec<GuestRow> {
    let by_guest: HashMap<(&str, &str), &ResponseRecord> = responses
        .iter()
        .map(|r| ((r.code.as_str(), r.guest_name.as_str()), r))
        .collect();

    registry
        .codes()
        .iter()
        .flat_map(|invitation| {
            let by_guest = &by_guest;
            invitation.members.iter().map(move |name| {
                match by_guest.get(&(invitation.code.as_str(), name.as_str())) {
                    Some(response) => GuestRow::answered(&invitation.code, name, response),
                    None => GuestRow::pending(&invitation.code, name),
                }
            })
        })
        .collect()
}
