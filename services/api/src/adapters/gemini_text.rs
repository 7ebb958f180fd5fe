//! services/api/src/adapters/gemini_text.rs
//!
//! This module contains the adapter that asks Gemini for a structured reflection.
//! It implements the `ReflectionService` port from the `core` crate.

use async_trait::async_trait;
use serde_json::json;
use soul_whispers_core::domain::Reflection;
use soul_whispers_core::ports::{
    GenerationError, GenerationResult, ReflectionRequest, ReflectionService,
};
use tracing::{info, warn};

use super::gemini::{self, GeminiClient, GenerateRequest, GenerationConfig};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ReflectionService` port using Gemini JSON mode.
#[derive(Clone)]
pub struct GeminiReflectionAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiReflectionAdapter {
    /// Creates a new `GeminiReflectionAdapter`.
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

/// The guide prompt for one category, focus and language.
pub fn build_prompt(request: &ReflectionRequest) -> String {
    let language = request.language();
    format!(
        r#"Act as a world-class spiritual guide, theologian, and compassionate storyteller.
You are generating an entry for a vast digital sanctuary.
General Category: "{category}"
Specific Focus: "{focus}"
Target Language: {language}

The entire response MUST be in {language}, except for the "imagePrompt" field which MUST be in English.

Structure the JSON output with these components:

1. Title: A majestic and comforting title.

2. Story: A "Cinematic Story" (4-5 detailed paragraphs). Describe a relatable scenario. Focus on sensory details, emotional struggle, and the pivotal moment of faith.

3. Prayer: A "Foundation Prayer" (20-30 lines).
   - CRITICAL: You MUST quote 3-4 specific Bible scriptures directly within the prayer text naturally.

4. FocusPoints: An array of 3 specific "Meditative Points" (title, description, scripture).

5. CrossReferences: An array of 3 "Deep Connections" (theme, reference).

6. References: A list of the 3-4 primary Bible verses used.

7. imagePrompt: A detailed English description for an AI image generator (E.g. "An oil painting of a peaceful garden with soft light filtering through trees, ethereal atmosphere, spiritual peace").

Tone: Biblical, tender, empathetic, and authoritative. Ensure the tone is respectful and spiritually uplifting."#,
        category = request.category(),
        focus = request.sub_topic(),
        language = language,
    )
}

/// Every field of a reflection is required except the image URL, which is filled in later.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "story": { "type": "STRING" },
            "prayer": { "type": "STRING" },
            "imagePrompt": { "type": "STRING" },
            "focusPoints": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "scripture": { "type": "STRING" }
                    },
                    "required": ["title", "description", "scripture"]
                }
            },
            "crossReferences": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "theme": { "type": "STRING" },
                        "reference": { "type": "STRING" }
                    },
                    "required": ["theme", "reference"]
                }
            },
            "references": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": [
            "title", "story", "prayer", "references",
            "focusPoints", "crossReferences", "imagePrompt"
        ]
    })
}

/// Parses the model's JSON answer into a `Reflection`.
pub fn parse_reflection(text: &str) -> GenerationResult<Reflection> {
    serde_json::from_str(gemini::strip_code_fences(text))
        .map_err(|e| GenerationError::Malformed(e.to_string()))
}

//=========================================================================================
// `ReflectionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReflectionService for GeminiReflectionAdapter {
    async fn request_reflection(&self, request: &ReflectionRequest) -> GenerationResult<Reflection> {
        let body = GenerateRequest::text(build_prompt(request)).with_config(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(response_schema()),
            ..Default::default()
        });

        let response = self.client.generate(&self.model, &body).await?;
        let text = gemini::extract_text(&response)?;
        let reflection = parse_reflection(&text).inspect_err(|e| {
            warn!("Reflection payload did not match the expected shape: {}", e);
        })?;

        info!(title = %reflection.title, "Reflection generated");
        Ok(reflection)
    }
}
