//! RSVP response domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::store::Document;

/// Answer a guest can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Accepted,
    Declined,
}

/// Resolved status of a guest; `Pending` means no response was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    Accepted,
    Declined,
    Pending,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Accepted => "accepted",
            GuestStatus::Declined => "declined",
            GuestStatus::Pending => "pending",
        }
    }

    /// Dashboard sort order: accepted, then pending, then declined.
    pub fn sort_rank(&self) -> u8 {
        match self {
            GuestStatus::Accepted => 0,
            GuestStatus::Pending => 1,
            GuestStatus::Declined => 2,
        }
    }
}

impl std::fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" => Ok(GuestStatus::Accepted),
            "declined" => Ok(GuestStatus::Declined),
            "pending" => Ok(GuestStatus::Pending),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

impl From<RsvpStatus> for GuestStatus {
    fn from(status: RsvpStatus) -> Self {
        match status {
            RsvpStatus::Accepted => GuestStatus::Accepted,
            RsvpStatus::Declined => GuestStatus::Declined,
        }
    }
}

/// The wedding weekend's sub-events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubEvent {
    FridayEvening,
    SaturdayLunch,
    SaturdayWedding,
    SundayBrunch,
}

impl SubEvent {
    pub const ALL: [SubEvent; 4] = [
        SubEvent::FridayEvening,
        SubEvent::SaturdayLunch,
        SubEvent::SaturdayWedding,
        SubEvent::SundayBrunch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SubEvent::FridayEvening => "Friday evening",
            SubEvent::SaturdayLunch => "Saturday lunch",
            SubEvent::SaturdayWedding => "Saturday wedding",
            SubEvent::SundayBrunch => "Sunday brunch",
        }
    }
}

/// Per-sub-event attendance flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Attendance {
    pub friday_evening: bool,
    pub saturday_lunch: bool,
    pub saturday_wedding: bool,
    pub sunday_brunch: bool,
}

impl Attendance {
    pub fn attends(&self, event: SubEvent) -> bool {
        match event {
            SubEvent::FridayEvening => self.friday_evening,
            SubEvent::SaturdayLunch => self.saturday_lunch,
            SubEvent::SaturdayWedding => self.saturday_wedding,
            SubEvent::SundayBrunch => self.sunday_brunch,
        }
    }

    /// True if at least one sub-event is selected.
    pub fn any(&self) -> bool {
        SubEvent::ALL.iter().any(|e| self.attends(*e))
    }
}

/// Document key for a guest's response: responses are keyed per (code, guest).
pub fn response_key(code: &str, guest_name: &str) -> String {
    format!("{code}:{guest_name}")
}

/// Stored fields of a response document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseData {
    pub code: String,
    pub guest_name: String,
    pub status: RsvpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    #[serde(default)]
    pub attendance: Attendance,
}

/// A guest's submitted response, with the store-assigned modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseRecord {
    pub code: String,
    pub guest_name: String,
    pub status: RsvpStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub attendance: Attendance,
    pub modified_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Coerces a raw store document into a response, or `None` if it cannot be parsed.
    pub fn from_document(doc: &Document) -> Option<Self> {
        match serde_json::from_value::<ResponseData>(doc.data.clone()) {
            Ok(data) if doc.key != response_key(&data.code, &data.guest_name) => {
                warn!(
                    key = %doc.key,
                    code = %data.code,
                    guest = %data.guest_name,
                    "Skipping response whose key does not match its guest"
                );
                None
            }
            Ok(data) => Some(Self {
                code: data.code,
                guest_name: data.guest_name,
                status: data.status,
                email: data.email.filter(|e| !e.trim().is_empty()),
                comment: data.comment,
                song: data.song.filter(|s| !s.trim().is_empty()),
                attendance: data.attendance,
                modified_at: doc.updated_at,
            }),
            Err(e) => {
                warn!(key = %doc.key, error = %e, "Skipping malformed response record");
                None
            }
        }
    }

    /// Parses every well-formed response of a snapshot.
    pub fn from_documents(docs: &[Document]) -> Vec<Self> {
        docs.iter().filter_map(Self::from_document).collect()
    }

    pub fn key(&self) -> String {
        response_key(&self.code, &self.guest_name)
    }
}

impl ResponseData {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
