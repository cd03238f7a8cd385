//! Invitation code domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::codes::{is_canonical_code, CODE_LENGTH};
use tracing::warn;
use validator::Validate;

use crate::store::Document;

/// Document field holding the last time a guest of this code submitted a response.
pub const LAST_USED_FIELD: &str = "last_used_at";

/// A provisioned invitation code and the guests it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationCode {
    pub code: String,
    pub members: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl InvitationCode {
    /// Coerces a raw store document into an invitation code.
    ///
    /// Returns `None` for malformed records: a key that is not a canonical
    /// code, or a guest list that is missing or not an array of strings.
    /// Legacy field names (`membres`, `date_utilisation`) are accepted.
    pub fn from_document(doc: &Document) -> Option<Self> {
        if !is_canonical_code(&doc.key) {
            warn!(code = %doc.key, "Skipping invitation with non-canonical code");
            return None;
        }

        let fields = doc.data.as_object()?;
        let members = fields.get("members").or_else(|| fields.get("membres"));
        let members: Vec<String> = match members.and_then(Value::as_array) {
            Some(list) => {
                let names: Option<Vec<String>> = list
                    .iter()
                    .map(|v| v.as_str().map(|s| s.to_string()))
                    .collect();
                match names {
                    Some(names) => names,
                    None => {
                        warn!(code = %doc.key, "Skipping invitation with non-string guest names");
                        return None;
                    }
                }
            }
            None => {
                warn!(code = %doc.key, "Skipping invitation without a guest list");
                return None;
            }
        };

        let description = fields
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| doc.key.clone());

        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        let last_used_at = fields
            .get(LAST_USED_FIELD)
            .or_else(|| fields.get("date_utilisation"))
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(Self {
            code: doc.key.clone(),
            members,
            description,
            message,
            last_used_at,
        })
    }

    /// Serializes the stored fields of this code (the key is the code itself).
    pub fn to_document_data(&self) -> Value {
        let mut data = json!({
            "members": self.members,
            "description": self.description,
        });
        if let Some(message) = &self.message {
            data["message"] = json!(message);
        }
        if let Some(last_used_at) = self.last_used_at {
            data[LAST_USED_FIELD] = json!(last_used_at.to_rfc3339());
        }
        data
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// The set of valid invitation codes, ordered by code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvitationRegistry {
    codes: Vec<InvitationCode>,
}

impl InvitationRegistry {
    pub fn new(mut codes: Vec<InvitationCode>) -> Self {
        codes.sort_by(|a, b| a.code.cmp(&b.code));
        codes.dedup_by(|a, b| a.code == b.code);
        Self { codes }
    }

    /// Builds a registry from a collection snapshot, silently excluding malformed records.
    pub fn from_documents(docs: &[Document]) -> Self {
        Self::new(docs.iter().filter_map(InvitationCode::from_document).collect())
    }

    pub fn codes(&self) -> &[InvitationCode] {
        &self.codes
    }

    pub fn get(&self, code: &str) -> Option<&InvitationCode> {
        self.codes
            .binary_search_by(|c| c.code.as_str().cmp(code))
            .ok()
            .map(|idx| &self.codes[idx])
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Total number of guests across every code.
    pub fn guest_count(&self) -> usize {
        self.codes.iter().map(|c| c.members.len()).sum()
    }
}

/// Request to provision a new invitation code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvitationRequest {
    /// Guest names covered by this code.
    #[validate(custom(function = "shared::validation::validate_guest_names"))]
    pub members: Vec<String>,

    /// Human-readable label shown on the dashboard.
    #[validate(length(max = 120, message = "description must be at most 120 characters"))]
    pub description: Option<String>,

    /// Greeting shown on the confirmation page.
    #[validate(length(max = 2000, message = "message must be at most 2000 characters"))]
    pub message: Option<String>,
}

impl CreateInvitationRequest {
    /// Builds the invitation for a freshly generated code.
    pub fn into_invitation(self, code: String) -> InvitationCode {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| code.clone());
        InvitationCode {
            members: self.members.iter().map(|m| m.trim().to_string()).collect(),
            description,
            message: self.message,
            last_used_at: None,
            code,
        }
    }
}

/// Generate a random invitation code in canonical form.
pub fn generate_invitation_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789"; // Avoiding confusing chars: 0, O, I, 1

    (0..CODE_LENGTH)
        .map(|_| chars[rng.gen_range(0..chars.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: &str, data: Value) -> Document {
        Document {
            key: key.to_string(),
            data,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_document_valid() {
        let code = InvitationCode::from_document(&doc(
            "ABC123",
            json!({"members": ["Alice", "Bob"], "description": "Famille Martin"}),
        ))
        .unwrap();

        assert_eq!(code.code, "ABC123");
        assert_eq!(code.members, vec!["Alice", "Bob"]);
        assert_eq!(code.description, "Famille Martin");
        assert!(code.last_used_at.is_none());
    }

    #[test]
    fn test_from_document_legacy_fields() {
        let code = InvitationCode::from_document(&doc(
            "ABC123",
            json!({"membres": ["Alice"], "date_utilisation": "2027-01-02T10:00:00Z"}),
        ))
        .unwrap();

        assert_eq!(code.members, vec!["Alice"]);
        assert_eq!(code.description, "ABC123");
        assert!(code.last_used_at.is_some());
    }

    #[test]
    fn test_from_document_missing_members() {
        assert!(InvitationCode::from_document(&doc("ABC123", json!({"description": "x"}))).is_none());
    }

    #[test]
    fn test_from_document_members_not_array() {
        assert!(InvitationCode::from_document(&doc("ABC123", json!({"members": "Alice"}))).is_none());
    }

    #[test]
    fn test_from_document_non_string_member() {
        assert!(
            InvitationCode::from_document(&doc("ABC123", json!({"members": ["Alice", 3]}))).is_none()
        );
    }

    #[test]
    fn test_from_document_non_canonical_key() {
        assert!(InvitationCode::from_document(&doc("abc", json!({"members": []}))).is_none());
        assert!(InvitationCode::from_document(&doc("FAM-DUPONT", json!({"members": []}))).is_none());
    }

    #[test]
    fn test_document_data_round_trip() {
        let original = InvitationCode {
            code: "XYZ789".to_string(),
            members: vec!["Chloé".to_string()],
            description: "Amis".to_string(),
            message: Some("Bienvenue".to_string()),
            last_used_at: None,
        };
        let parsed =
            InvitationCode::from_document(&doc("XYZ789", original.to_document_data())).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_registry_excludes_malformed_and_sorts() {
        let registry = InvitationRegistry::from_documents(&[
            doc("ZZZ999", json!({"members": ["Zoé"]})),
            doc("BROKEN", json!({"nothing": true})),
            doc("AAA111", json!({"members": ["Alice", "Bob"]})),
        ]);

        let codes: Vec<&str> = registry.codes().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["AAA111", "ZZZ999"]);
        assert_eq!(registry.guest_count(), 3);
        assert!(registry.get("AAA111").is_some());
        assert!(registry.get("BROKEN").is_none());
    }

    #[test]
    fn test_has_member_exact_match() {
        let code = InvitationCode::from_document(&doc("ABC123", json!({"members": ["Alice"]})))
            .unwrap();
        assert!(code.has_member("Alice"));
        assert!(!code.has_member("alice"));
    }

    #[test]
    fn test_generate_invitation_code_format() {
        let code = generate_invitation_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(is_canonical_code(&code));
        for c in code.chars() {
            assert!(c != 'O' && c != 'I' && c != '0' && c != '1');
        }
    }

    #[test]
    fn test_create_invitation_request_validation() {
        let valid = CreateInvitationRequest {
            members: vec!["Alice".to_string(), "Bob".to_string()],
            description: Some("Famille".to_string()),
            message: None,
        };
        assert!(valid.validate().is_ok());

        let duplicate = CreateInvitationRequest {
            members: vec!["Alice".to_string(), "Alice".to_string()],
            description: None,
            message: None,
        };
        assert!(duplicate.validate().is_err());

        let long_description = CreateInvitationRequest {
            members: vec!["Alice".to_string()],
            description: Some("x".repeat(121)),
            message: None,
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_into_invitation_defaults_description() {
        let request = CreateInvitationRequest {
            members: vec![" Alice ".to_string()],
            description: Some("   ".to_string()),
            message: None,
        };
        let invitation = request.into_invitation("ABC123".to_string());
        assert_eq!(invitation.description, "ABC123");
        assert_eq!(invitation.members, vec!["Alice"]);
    }
}
