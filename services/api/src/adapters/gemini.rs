//! services/api/src/adapters/gemini.rs
//!
//! The shared REST client for the Gemini `generateContent` endpoint, plus the wire types
//! and the pure functions that pull text, images and audio out of a response.
//!
//! The three generation adapters build on this module; none of them talk HTTP directly.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use soul_whispers_core::ports::{GenerationError, GenerationResult};
use tracing::{debug, warn};

const DEFAULT_IMAGE_MIME: &str = "image/png";

//=========================================================================================
// The Client
//=========================================================================================

/// A thin `generateContent` client shared by every Gemini adapter.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Posts one request to `model` and decodes the response body.
    ///
    /// Non-2xx statuses become `GenerationError::Service`; failures to reach the service
    /// or to read its body become `GenerationError::Transport`.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> GenerationResult<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(model, "Calling generateContent");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = service_message(&body);
            warn!(model, status = status.as_u16(), %message, "Generation service returned an error");
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

/// Pulls `error.message` out of an error body, or falls back to the raw body.
fn service_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    /// A request with a single text part.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt.into() }],
            }],
            generation_config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

impl SpeechConfig {
    pub fn prebuilt(voice_name: impl Into<String>) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.into(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Whether the service withheld its output on safety grounds.
    pub fn was_filtered(&self) -> bool {
        let candidate_blocked = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            == Some("SAFETY");
        let prompt_blocked = self
            .prompt_feedback
            .as_ref()
            .is_some_and(|f| f.block_reason.is_some());
        candidate_blocked || prompt_blocked
    }
}

//=========================================================================================
// Extraction
//=========================================================================================

/// Concatenated text of the first candidate; an empty answer is `Filtered` or `Silent`.
pub fn extract_text(response: &GenerateResponse) -> GenerationResult<String> {
    let text: String = response
        .parts()
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if !text.trim().is_empty() {
        return Ok(text);
    }
    if response.was_filtered() {
        Err(GenerationError::Filtered)
    } else {
        Err(GenerationError::Silent)
    }
}

/// The first inline image of the first candidate as a `data:` URI.
pub fn extract_image(response: &GenerateResponse) -> GenerationResult<String> {
    response
        .parts()
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty())
        .map(|d| {
            let mime = d
                .mime_type
                .as_deref()
                .filter(|m| m.starts_with("image/"))
                .unwrap_or(DEFAULT_IMAGE_MIME);
            format!("data:{};base64,{}", mime, d.data)
        })
        .ok_or(GenerationError::NoImage)
}

/// The base64 audio payload of the first part of the first candidate.
pub fn extract_audio(response: &GenerateResponse) -> GenerationResult<String> {
    response
        .parts()
        .first()
        .and_then(|p| p.inline_data.as_ref())
        .map(|d| d.data.clone())
        .filter(|data| !data.is_empty())
        .ok_or(GenerationError::NoAudio)
}

/// Unwraps a payload the model wrapped in a markdown code fence.
pub fn strip_code_fences(text: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").ok());
    fence
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |m| m.as_str())
}
