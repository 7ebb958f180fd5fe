//! crates/soul_whispers_core/src/share.rs
//!
//! Builds the share message and clipboard text for a reflection.

use serde::Serialize;

use crate::domain::Reflection;

const EXCERPT_CHARS: usize = 100;

/// Texts offered by the share actions for one reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareContent {
    /// Message body for the WhatsApp share link.
    pub message: String,
    /// Full text placed on the clipboard by "copy".
    pub clipboard: String,
}

impl ShareContent {
    pub fn for_reflection(reflection: &Reflection, page_url: &str) -> Self {
        let excerpt: String = reflection.story.chars().take(EXCERPT_CHARS).collect();
        Self {
            message: format!(
                "*Soul Whispers: {}*\n\n{}...\n\nRead the full prayer here: {}",
                reflection.title, excerpt, page_url
            ),
            clipboard: format!(
                "{}\n\n{}\n\n{}",
                reflection.title, reflection.story, reflection.prayer
            ),
        }
    }
}
