//! services/api/src/web/test_support.rs
//!
//! Canned generation services and an `AppState` built around them.

use crate::config::Config;
use crate::web::state::AppState;
use async_trait::async_trait;
use soul_whispers_core::{
    ports::{
        GenerationResult, ImageService, KeyValueStore, NarrationService, ReflectionRequest,
        ReflectionService,
    },
    FocusPoint, MemoryKeyValueStore, Reflection,
};
use std::sync::Arc;

pub struct CannedReflection(pub GenerationResult<Reflection>);

#[async_trait]
impl ReflectionService for CannedReflection {
    async fn request_reflection(&self, _request: &ReflectionRequest) -> GenerationResult<Reflection> {
        self.0.clone()
    }
}

pub struct CannedImage(pub GenerationResult<String>);

#[async_trait]
impl ImageService for CannedImage {
    async fn request_image(&self, _prompt: &str) -> GenerationResult<String> {
        self.0.clone()
    }
}

pub struct CannedNarration(pub GenerationResult<String>);

#[async_trait]
impl NarrationService for CannedNarration {
    async fn request_narration(&self, _text: &str, _voice_id: &str) -> GenerationResult<String> {
        self.0.clone()
    }
}

pub fn reflection(title: &str) -> Reflection {
    Reflection {
        title: title.to_string(),
        story: format!("Story of {title}"),
        prayer: format!("Prayer of {title}"),
        focus_points: vec![FocusPoint {
            title: "Rest".to_string(),
            description: "Breathe.".to_string(),
            scripture: "Psalm 23".to_string(),
        }],
        cross_references: Vec::new(),
        references: vec!["John 14:27".to_string()],
        image_prompt: "A quiet garden at dawn".to_string(),
        image_url: None,
    }
}

pub fn config() -> Config {
    Config::from_lookup(|name| (name == "GEMINI_API_KEY").then(|| "test-key".to_string()))
        .expect("test configuration")
}

/// An `AppState` over an in-memory store and the given canned services.
pub fn app_state(
    reflections: GenerationResult<Reflection>,
    image: GenerationResult<String>,
    narration: GenerationResult<String>,
) -> Arc<AppState> {
    app_state_with_store(Arc::new(MemoryKeyValueStore::new()), reflections, image, narration)
}

pub fn app_state_with_store(
    store: Arc<dyn KeyValueStore>,
    reflections: GenerationResult<Reflection>,
    image: GenerationResult<String>,
    narration: GenerationResult<String>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(config()),
        store,
        reflections: Arc::new(CannedReflection(reflections)),
        images: Arc::new(CannedImage(image)),
        narration: Arc::new(CannedNarration(narration)),
    })
}
