//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::adapters::wav;
use crate::web::{middleware::ClientId, state::AppState};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use soul_whispers_core::{
    app::compose_request,
    catalog::{self, CatalogSnapshot},
    domain::{Reflection, SavedEntry},
    pcm,
    ports::GenerationError,
    store,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog_handler,
        create_reflection_handler,
        create_narration_handler,
        list_favorites_handler,
    ),
    components(
        schemas(ReflectionBody, NarrationBody, ErrorResponse)
    ),
    tags(
        (name = "Soul Whispers API", description = "Guided reflections, narration and saved favorites.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for generating a reflection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReflectionBody {
    /// A catalog category id, e.g. `marriage`.
    pub category_id: String,
    /// A sub-topic label; the category label is used when absent.
    pub sub_topic: Option<String>,
    /// A catalog language code, e.g. `es`. Unknown codes fall back to English.
    pub language_code: String,
}

/// The payload for synthesizing narration.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NarrationBody {
    pub text: String,
    /// A catalog voice id, e.g. `Kore`.
    pub voice: String,
}

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

fn reject(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Content problems are the caller's to fix; service problems are upstream's.
fn generation_failure(e: GenerationError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if e.is_content_failure() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    };
    reject(status, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List categories, languages, voices and display scales.
#[utoipa::path(
    get,
    path = "/catalog",
    responses(
        (status = 200, description = "The selection catalog")
    )
)]
pub async fn catalog_handler() -> Json<CatalogSnapshot> {
    Json(catalog::snapshot())
}

/// Generate a reflection and, best effort, its illustration.
#[utoipa::path(
    post,
    path = "/reflections",
    request_body = ReflectionBody,
    responses(
        (status = 200, description = "The generated reflection"),
        (status = 422, description = "Invalid input, or the response was filtered, empty or malformed", body = ErrorResponse),
        (status = 502, description = "The generation service failed or could not be reached", body = ErrorResponse)
    )
)]
pub async fn create_reflection_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<ReflectionBody>,
) -> ApiResult<Json<Reflection>> {
    let request = compose_request(&body.category_id, body.sub_topic, &body.language_code)
        .map_err(generation_failure)?;

    let reflection = app_state
        .reflections
        .request_reflection(&request)
        .await
        .map_err(|e| {
            warn!(category = request.category(), "Reflection request failed: {}", e);
            generation_failure(e)
        })?;

    let reflection = match app_state.images.request_image(&reflection.image_prompt).await {
        Ok(url) => reflection.with_image(url),
        Err(e) => {
            warn!("Image generation failed; returning reflection without one: {}", e);
            reflection
        }
    };
    info!(title = %reflection.title, "Reflection served");
    Ok(Json(reflection))
}

/// Synthesize narration as a WAV file (16-bit PCM, mono, 24 kHz).
#[utoipa::path(
    post,
    path = "/narrations",
    request_body = NarrationBody,
    responses(
        (status = 200, description = "The narration audio", body = Vec<u8>, content_type = "audio/wav"),
        (status = 422, description = "Unknown voice, empty text or unusable audio", body = ErrorResponse),
        (status = 502, description = "The generation service failed or could not be reached", body = ErrorResponse)
    )
)]
pub async fn create_narration_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<NarrationBody>,
) -> ApiResult<Response> {
    if catalog::voice(&body.voice).is_none() {
        return Err(generation_failure(GenerationError::InvalidInput(format!(
            "unknown voice '{}'",
            body.voice
        ))));
    }

    let payload = app_state
        .narration
        .request_narration(&body.text, &body.voice)
        .await
        .map_err(generation_failure)?;

    let buffer = pcm::decode_narration(&payload)
        .map_err(|e| generation_failure(GenerationError::Malformed(e.to_string())))?;

    let bytes = wav::encode_wav(&buffer).map_err(|e| {
        error!("Failed to encode narration as WAV: {}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode audio")
    })?;

    Ok(([(header::CONTENT_TYPE, wav::WAV_CONTENT_TYPE)], bytes).into_response())
}

/// List the calling client's saved reflections, most recent first.
#[utoipa::path(
    get,
    path = "/favorites",
    responses(
        (status = 200, description = "Saved entries for this browser")
    )
)]
pub async fn list_favorites_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ClientId(client_id)): Extension<ClientId>,
) -> Json<Vec<SavedEntry>> {
    let local = store::load_local_state(app_state.store.as_ref(), client_id).await;
    Json(local.favorites.entries().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{app_state, reflection};

    const IMAGE: &str = "data:image/png;base64,AAAA";
    /// Two silent samples.
    const PCM: &str = "AAAAAA==";

    fn reflection_body() -> ReflectionBody {
        ReflectionBody {
            category_id: "marriage".to_string(),
            sub_topic: None,
            language_code: "es".to_string(),
        }
    }

    fn narration_body(voice: &str) -> NarrationBody {
        NarrationBody {
            text: "Story\n\nPrayer".to_string(),
            voice: voice.to_string(),
        }
    }

    fn status_of<T>(result: ApiResult<T>) -> StatusCode {
        match result {
            Ok(_) => StatusCode::OK,
            Err((status, _)) => status,
        }
    }

    #[tokio::test]
    async fn reflection_carries_its_illustration() {
        let state = app_state(Ok(reflection("Hope")), Ok(IMAGE.to_string()), Ok(PCM.to_string()));
        let Json(served) = create_reflection_handler(State(state), Json(reflection_body()))
            .await
            .unwrap();
        assert_eq!(served.title, "Hope");
        assert_eq!(served.image_url.as_deref(), Some(IMAGE));
    }

    #[tokio::test]
    async fn image_failure_still_serves_the_reflection() {
        let state = app_state(
            Ok(reflection("Hope")),
            Err(GenerationError::NoImage),
            Ok(PCM.to_string()),
        );
        let Json(served) = create_reflection_handler(State(state), Json(reflection_body()))
            .await
            .unwrap();
        assert_eq!(served.title, "Hope");
        assert!(served.image_url.is_none());
    }

    #[tokio::test]
    async fn content_failures_are_unprocessable_and_service_failures_are_bad_gateway() {
        let cases = [
            (GenerationError::Filtered, StatusCode::UNPROCESSABLE_ENTITY),
            (GenerationError::Silent, StatusCode::UNPROCESSABLE_ENTITY),
            (
                GenerationError::Malformed("missing prayer".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                GenerationError::Service {
                    status: 503,
                    message: "overloaded".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                GenerationError::Transport("connection reset".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (failure, expected) in cases {
            let state = app_state(Err(failure.clone()), Ok(IMAGE.to_string()), Ok(PCM.to_string()));
            let result = create_reflection_handler(State(state), Json(reflection_body())).await;
            assert_eq!(status_of(result), expected, "for {failure:?}");
        }
    }

    #[tokio::test]
    async fn filtered_reflection_explains_itself() {
        let state = app_state(
            Err(GenerationError::Filtered),
            Ok(IMAGE.to_string()),
            Ok(PCM.to_string()),
        );
        let Err((_, Json(body))) =
            create_reflection_handler(State(state), Json(reflection_body())).await
        else {
            panic!("expected a rejection");
        };
        assert_eq!(body.message, GenerationError::Filtered.to_string());
    }

    #[tokio::test]
    async fn blank_sub_topic_is_rejected_before_generation() {
        let state = app_state(Ok(reflection("Hope")), Ok(IMAGE.to_string()), Ok(PCM.to_string()));
        let body = ReflectionBody {
            sub_topic: Some("   ".to_string()),
            ..reflection_body()
        };
        let result = create_reflection_handler(State(state), Json(body)).await;
        assert_eq!(status_of(result), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn narration_is_served_as_wav() {
        let state = app_state(Ok(reflection("Hope")), Ok(IMAGE.to_string()), Ok(PCM.to_string()));
        let response = create_narration_handler(State(state), Json(narration_body("Kore")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            wav::WAV_CONTENT_TYPE
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[tokio::test]
    async fn narration_failures_map_to_status_codes() {
        let unknown_voice = app_state(Ok(reflection("Hope")), Ok(IMAGE.to_string()), Ok(PCM.to_string()));
        let result = create_narration_handler(State(unknown_voice), Json(narration_body("Nobody"))).await;
        assert_eq!(status_of(result), StatusCode::UNPROCESSABLE_ENTITY);

        let odd_bytes = app_state(Ok(reflection("Hope")), Ok(IMAGE.to_string()), Ok("AAAA".to_string()));
        let result = create_narration_handler(State(odd_bytes), Json(narration_body("Kore"))).await;
        assert_eq!(status_of(result), StatusCode::UNPROCESSABLE_ENTITY);

        let unreachable = app_state(
            Ok(reflection("Hope")),
            Ok(IMAGE.to_string()),
            Err(GenerationError::Transport("timed out".to_string())),
        );
        let result = create_narration_handler(State(unreachable), Json(narration_body("Kore"))).await;
        assert_eq!(status_of(result), StatusCode::BAD_GATEWAY);
    }
}
