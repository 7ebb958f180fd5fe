//! services/api/src/adapters/gemini_tts.rs
//!
//! This module contains the adapter for Gemini's text-to-speech model.
//! It implements the `NarrationService` port from the `core` crate.

use async_trait::async_trait;
use soul_whispers_core::ports::{GenerationError, GenerationResult, NarrationService};
use tracing::{debug, info};

use super::gemini::{self, GeminiClient, GenerateRequest, GenerationConfig, SpeechConfig};

const TONE_PREFIX: &str = "Read the following with deep compassion and a soothing tone: ";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `NarrationService` port using a Gemini TTS model.
#[derive(Clone)]
pub struct GeminiTtsAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiTtsAdapter {
    /// Creates a new `GeminiTtsAdapter`.
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

pub fn speech_request(text: &str, voice_id: &str) -> GenerateRequest {
    GenerateRequest::text(format!("{}{}", TONE_PREFIX, text)).with_config(GenerationConfig {
        response_modalities: Some(vec!["AUDIO".to_string()]),
        speech_config: Some(SpeechConfig::prebuilt(voice_id)),
        ..Default::default()
    })
}

//=========================================================================================
// `NarrationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NarrationService for GeminiTtsAdapter {
    /// Returns the base64 PCM16 payload exactly as the service sent it.
    async fn request_narration(&self, text: &str, voice_id: &str) -> GenerationResult<String> {
        if text.trim().is_empty() {
            return Err(GenerationError::InvalidInput("narration text must not be empty".to_string()));
        }
        debug!(voice_id, chars = text.chars().count(), "Requesting narration");
        let response = self
            .client
            .generate(&self.model, &speech_request(text, voice_id))
            .await?;
        let audio = gemini::extract_audio(&response)?;
        info!(voice_id, payload_len = audio.len(), "Narration generated");
        Ok(audio)
    }
}
