//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Records fall back to process memory when unset.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub cors_origin: String,
    /// Link placed in shared messages.
    pub public_url: String,
    pub progress_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or_default = |name: &str, default: &str| {
            var(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        // --- Server and Database Settings ---
        let bind_address_str = or_default("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generation Service ---
        let gemini_api_key = var("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let gemini_base_url = or_default(
            "GEMINI_BASE_URL",
            "https://generativelanguage.googleapis.com/v1beta",
        )
        .trim_end_matches('/')
        .to_string();
        let text_model = or_default("TEXT_MODEL", "gemini-3-flash-preview");
        let image_model = or_default("IMAGE_MODEL", "gemini-2.5-flash-image");
        let tts_model = or_default("TTS_MODEL", "gemini-2.5-flash-preview-tts");

        // --- Web Settings ---
        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:3000");
        let public_url = or_default("PUBLIC_URL", "http://localhost:3000");

        let interval_str = or_default("PROGRESS_INTERVAL_MS", "100");
        let progress_interval = interval_str
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PROGRESS_INTERVAL_MS".to_string(),
                    format!("'{}' is not a positive number of milliseconds", interval_str),
                )
            })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            gemini_base_url,
            text_model,
            image_model,
            tts_model,
            cors_origin,
            public_url,
            progress_interval,
        })
    }
}
