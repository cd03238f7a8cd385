//! Lodging suggestions per invitation group.

use serde::{Deserialize, Serialize};
use shared::codes::normalize_code;

/// A place to stay near the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Accommodation {
    pub id: String,
    /// Kind of place, e.g. "Gîte" or "Hôtel".
    pub kind: String,
    pub name: String,
    pub address: String,
    /// Travel time or distance to the venue, free text.
    pub distance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Invitation codes that share a tailored selection of accommodations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LodgingGroup {
    pub name: String,
    pub codes: Vec<String>,
    pub accommodation_ids: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LodgingGroup {
    fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| normalize_code(c) == code)
    }
}

/// What the lodging page shows for one code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodgingSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub message: String,
    pub accommodations: Vec<Accommodation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LodgingCatalog {
    #[serde(default)]
    pub default_message: String,
    #[serde(default)]
    pub accommodations: Vec<Accommodation>,
    #[serde(default)]
    pub groups: Vec<LodgingGroup>,
}

impl LodgingCatalog {
    /// The first group listing `code` wins; codes in no group get the full catalogue.
    pub fn suggest(&self, code: &str) -> LodgingSuggestion {
        let code = normalize_code(code);
        match self.groups.iter().find(|g| g.contains(&code)) {
            Some(group) => LodgingSuggestion {
                group: Some(group.name.clone()),
                message: group
                    .message
                    .clone()
                    .unwrap_or_else(|| self.default_message.clone()),
                accommodations: group
                    .accommodation_ids
                    .iter()
                    .filter_map(|id| self.accommodations.iter().find(|a| &a.id == id))
                    .cloned()
                    .collect(),
            },
            None => LodgingSuggestion {
                group: None,
                message: self.default_message.clone(),
                accommodations: self.accommodations.clone(),
            },
        }
    }
}
