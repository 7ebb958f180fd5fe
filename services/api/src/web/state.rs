//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-connection session wiring.

use crate::config::Config;
use crate::web::session::{SessionRuntime, TokioTicker, WsAudioSink};
use soul_whispers_core::ports::{
    ImageService, KeyValueStore, NarrationService, ReflectionService, SystemClock,
};
use soul_whispers_core::{store, AppModel, PlaybackController};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub reflections: Arc<dyn ReflectionService>,
    pub images: Arc<dyn ImageService>,
    pub narration: Arc<dyn NarrationService>,
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection.
///
/// The model is only ever touched by the connection task; spawned work reports back
/// through the runtime's event channel.
pub struct SessionState {
    pub client_id: Uuid,
    pub model: AppModel,
    pub runtime: SessionRuntime,
}

impl SessionState {
    /// Restores the client's saved records and builds a fresh model around them.
    pub async fn new(app_state: Arc<AppState>, client_id: Uuid, runtime: SessionRuntime) -> Self {
        let local = store::load_local_state(app_state.store.as_ref(), client_id).await;

        let playback = PlaybackController::new(
            Box::new(WsAudioSink::new(runtime.outbound(), runtime.events())),
            Arc::new(SystemClock::new()),
            Box::new(TokioTicker::new(runtime.events())),
        )
        .with_tick_interval(app_state.config.progress_interval);

        let model = AppModel::new(local, playback, app_state.config.public_url.clone());
        Self {
            client_id,
            model,
            runtime,
        }
    }
}
