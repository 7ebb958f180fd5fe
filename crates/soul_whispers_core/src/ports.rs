//! crates/soul_whispers_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generation service and of the record storage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Reflection;
use crate::pcm::SampleBuffer;

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// Errors raised by the storage ports.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Errors raised by the generation service ports.
///
/// The `Display` text of each variant is what the user reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),
    #[error("The request was filtered for safety. Please try a different scenario.")]
    Filtered,
    #[error("The sanctuary is silent. Please try your request again.")]
    Silent,
    #[error("The response could not be understood: {0}")]
    Malformed(String),
    #[error("No image generated")]
    NoImage,
    #[error("Audio generation failed")]
    NoAudio,
    #[error("The generation service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("The generation service could not be reached: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Whether the failure is attributable to the request or the returned content
    /// rather than to reaching the service.
    pub fn is_content_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Filtered | Self::Silent | Self::Malformed(_)
        )
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;

//=========================================================================================
// Request Types
//=========================================================================================

/// The display labels a reflection is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionRequest {
    category: String,
    sub_topic: String,
    language: String,
}

impl ReflectionRequest {
    pub fn new(
        category: impl Into<String>,
        sub_topic: impl Into<String>,
        language: impl Into<String>,
    ) -> GenerationResult<Self> {
        let category = non_empty("category", category.into())?;
        let sub_topic = non_empty("sub-topic", sub_topic.into())?;
        let language = non_empty("language", language.into())?;
        Ok(Self {
            category,
            sub_topic,
            language,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sub_topic(&self) -> &str {
        &self.sub_topic
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

fn non_empty(field: &str, value: String) -> GenerationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ReflectionService: Send + Sync {
    /// Generates the structured story/prayer bundle for the given labels.
    async fn request_reflection(&self, request: &ReflectionRequest) -> GenerationResult<Reflection>;
}

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Generates an illustration and returns it as a `data:` URI.
    async fn request_image(&self, prompt: &str) -> GenerationResult<String>;
}

#[async_trait]
pub trait NarrationService: Send + Sync {
    /// Synthesizes speech and returns base64-encoded 16-bit PCM, mono, 24 kHz.
    async fn request_narration(&self, text: &str, voice_id: &str) -> GenerationResult<String>;
}

/// Per-client keyed records, the server-side stand-in for browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, client_id: Uuid, key: &str) -> PortResult<Option<String>>;

    async fn put(&self, client_id: Uuid, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, client_id: Uuid, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Playback Seams
//=========================================================================================

/// Identifies one started playback source so late end-notifications can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceId(pub u64);

/// The single audio output. At most one source is active; the controller always stops
/// the previous source before starting another.
pub trait AudioSink: Send {
    fn start(&mut self, source: SourceId, buffer: Arc<SampleBuffer>, offset: Duration, gain: f32);

    fn stop(&mut self, source: SourceId);

    /// Applies to the active source without interrupting it.
    fn set_gain(&mut self, gain: f32);
}

/// Monotonic time source used for elapsed-playback bookkeeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Fixed-interval progress ticks. `schedule` replaces any previous schedule and
/// `cancel` must be safe to call when nothing is scheduled.
pub trait TickScheduler: Send {
    fn schedule(&mut self, every: Duration);

    fn cancel(&mut self);
}

/// `Clock` backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
