//! Invitation-code gate.
//!
//! Every page that needs an invitation (confirmation, lodging, gallery)
//! goes through [`open_invitation`]. Codes are normalized the same way in
//! every flow, see [`shared::codes::normalize_code`].

use serde::Serialize;
use shared::codes::{is_canonical_code, normalize_code, parse_code_list};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::invitation::InvitationCode;
use crate::store::{DocumentStore, StoreError, INVITATION_CODES};

/// Message shown for both malformed and unknown codes.
pub const INVALID_CODE_MESSAGE: &str = "Invalid invitation code";

#[derive(Debug, Error)]
pub enum GateError {
    /// Wrong format or unknown code. Deliberately indistinguishable.
    #[error("Invalid invitation code")]
    InvalidCode,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configured code lists that enable optional features per invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLists {
    pub rsvp: Vec<String>,
    pub lodging: Vec<String>,
    pub vin_honneur: Vec<String>,
}

impl CodeLists {
    /// Parses the comma-separated lists from configuration.
    pub fn parse(rsvp: &str, lodging: &str, vin_honneur: &str) -> Self {
        Self {
            rsvp: parse_code_list(rsvp),
            lodging: parse_code_list(lodging),
            vin_honneur: parse_code_list(vin_honneur),
        }
    }

    pub fn rsvp_enabled(&self, code: &str) -> bool {
        self.rsvp.iter().any(|c| c == code)
    }

    pub fn lodging_available(&self, code: &str) -> bool {
        self.lodging.iter().any(|c| c == code)
    }

    pub fn vin_honneur_only(&self, code: &str) -> bool {
        self.vin_honneur.iter().any(|c| c == code)
    }
}

/// What a guest may see and do once their code is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationAccess {
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub members: Vec<String>,
    pub rsvp_enabled: bool,
    pub vin_honneur_only: bool,
    pub lodging_available: bool,
}

impl InvitationAccess {
    pub fn new(invitation: InvitationCode, lists: &CodeLists) -> Self {
        Self {
            rsvp_enabled: lists.rsvp_enabled(&invitation.code),
            vin_honneur_only: lists.vin_honneur_only(&invitation.code),
            lodging_available: lists.lodging_available(&invitation.code),
            code: invitation.code,
            description: invitation.description,
            message: invitation.message,
            members: invitation.members,
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// The invitation record behind this access, for live member lists.
    pub fn invitation(&self) -> InvitationCode {
        InvitationCode {
            code: self.code.clone(),
            members: self.members.clone(),
            description: self.description.clone(),
            message: self.message.clone(),
            last_used_at: None,
        }
    }
}

/// Looks up a user-entered code. A single keyed read, no retry.
pub async fn open_invitation(
    store: &dyn DocumentStore,
    lists: &CodeLists,
    raw_code: &str,
) -> Result<InvitationAccess, GateError> {
    let code = normalize_code(raw_code);
    if !is_canonical_code(&code) {
        debug!("Rejected malformed invitation code");
        return Err(GateError::InvalidCode);
    }

    let Some(doc) = store.get_document(INVITATION_CODES, &code).await? else {
        debug!(code = %code, "Unknown invitation code");
        return Err(GateError::InvalidCode);
    };

    match InvitationCode::from_document(&doc) {
        Some(invitation) => Ok(InvitationAccess::new(invitation, lists)),
        None => {
            warn!(code = %code, "Invitation record exists but is malformed");
            Err(GateError::InvalidCode)
        }
    }
}
