//! crates/soul_whispers_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Field names serialize in camelCase because the same shape is requested from the
//! generation service and written to the per-client records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short meditative note accompanying a reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub title: String,
    pub description: String,
    pub scripture: String,
}

/// A related theme the user can follow to generate a new reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub theme: String,
    pub reference: String,
}

/// One generated bundle: story, prayer, focus points, cross-references and an
/// optional illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub title: String,
    pub story: String,
    pub prayer: String,
    pub focus_points: Vec<FocusPoint>,
    pub cross_references: Vec<CrossReference>,
    pub references: Vec<String>,
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Reflection {
    /// Returns this reflection with the resolved illustration attached.
    pub fn with_image(mut self, image_url: String) -> Self {
        self.image_url = Some(image_url);
        self
    }

    /// The text handed to the speech service: story, blank line, prayer.
    pub fn narration_text(&self) -> String {
        format!("{}\n\n{}", self.story, self.prayer)
    }
}

/// A favorited reflection. `timestamp` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEntry {
    #[serde(flatten)]
    pub reflection: Reflection,
    pub id: String,
    pub timestamp: i64,
}

impl SavedEntry {
    pub fn new(reflection: Reflection, saved_at: DateTime<Utc>) -> Self {
        Self {
            reflection,
            id: Uuid::new_v4().to_string(),
            timestamp: saved_at.timestamp_millis(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Local sign-in token. Nothing is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// What the user has picked on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub category_id: String,
    pub sub_topic: Option<String>,
    pub language_code: String,
    pub voice_id: String,
}

/// Indices into `catalog::FONT_SIZES` and `catalog::LINE_SPACINGS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayPrefs {
    pub font_size_index: usize,
    pub line_spacing_index: usize,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            font_size_index: 1,
            line_spacing_index: 2,
        }
    }
}
