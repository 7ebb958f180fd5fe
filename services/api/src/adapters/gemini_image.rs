//! services/api/src/adapters/gemini_image.rs
//!
//! Illustration adapter. Implements the `ImageService` port from the `core` crate.

use async_trait::async_trait;
use soul_whispers_core::ports::{GenerationResult, ImageService};
use tracing::debug;

use super::gemini::{self, GeminiClient, GenerateRequest, GenerationConfig, ImageConfig};

const ASPECT_RATIO: &str = "16:9";

/// An adapter that implements the `ImageService` port using a Gemini image model.
#[derive(Clone)]
pub struct GeminiImageAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiImageAdapter {
    /// Creates a new `GeminiImageAdapter`.
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

/// Wraps the reflection's image prompt in the house art direction.
pub fn styled_prompt(prompt: &str) -> String {
    format!(
        "Digital art masterpiece: {}. Cinematic lighting, soft ethereal glow, spiritual and peaceful, highly detailed, 4k.",
        prompt
    )
}

#[async_trait]
impl ImageService for GeminiImageAdapter {
    async fn request_image(&self, prompt: &str) -> GenerationResult<String> {
        let body = GenerateRequest::text(styled_prompt(prompt)).with_config(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: ASPECT_RATIO.to_string(),
            }),
            ..Default::default()
        });
        let response = self.client.generate(&self.model, &body).await?;
        let uri = gemini::extract_image(&response)?;
        debug!(bytes = uri.len(), "Illustration generated");
        Ok(uri)
    }
}
