//! Photo albums shown to invited guests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Album {
    pub id: String,
    pub title: String,
    /// Path or URL of the cover picture.
    pub cover: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Album {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }
}
