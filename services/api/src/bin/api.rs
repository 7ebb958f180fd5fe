//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        GeminiClient, GeminiImageAdapter, GeminiReflectionAdapter, GeminiTtsAdapter,
        PgKeyValueStore,
    },
    config::Config,
    error::ApiError,
    web::{
        catalog_handler, create_narration_handler, create_reflection_handler, ensure_client,
        list_favorites_handler, rest::ApiDoc, state::AppState, ws_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use soul_whispers_core::{ports::KeyValueStore, MemoryKeyValueStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Record Store ---
    let store: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = PgKeyValueStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; saved favorites will not survive a restart");
            Arc::new(MemoryKeyValueStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let gemini = GeminiClient::new(config.gemini_base_url.clone(), config.gemini_api_key.clone());
    let reflections = Arc::new(GeminiReflectionAdapter::new(
        gemini.clone(),
        config.text_model.clone(),
    ));
    let images = Arc::new(GeminiImageAdapter::new(
        gemini.clone(),
        config.image_model.clone(),
    ));
    let narration = Arc::new(GeminiTtsAdapter::new(gemini, config.tts_model.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        reflections,
        images,
        narration,
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/reflections", post(create_reflection_handler))
        .route("/narrations", post(create_narration_handler))
        .route("/favorites", get(list_favorites_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn(ensure_client))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
