pub mod gemini;
pub mod gemini_image;
pub mod gemini_text;
pub mod gemini_tts;
pub mod kv_store;
pub mod wav;

pub use gemini::GeminiClient;
pub use gemini_image::GeminiImageAdapter;
pub use gemini_text::GeminiReflectionAdapter;
pub use gemini_tts::GeminiTtsAdapter;
pub use kv_store::PgKeyValueStore;
