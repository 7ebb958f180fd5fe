//! services/api/src/web/session.rs
//!
//! The side of a connection that the model cannot see: the audio sink that forwards
//! playback to the browser, the progress ticker, and the dispatcher that turns model
//! commands into spawned service calls and ordered record writes.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use soul_whispers_core::pcm::SampleBuffer;
use soul_whispers_core::ports::{AudioSink, KeyValueStore, SourceId, TickScheduler};
use soul_whispers_core::{store, Command, Msg, SavedEntry, UserProfile};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::adapters::wav;
use crate::web::protocol::ServerMessage;
use crate::web::state::AppState;

/// Frames queued for the socket, written in order by the connection task.
#[derive(Debug)]
pub enum Outgoing {
    Text(ServerMessage),
    Binary(Bytes),
}

//=========================================================================================
// Audio Sink
//=========================================================================================

/// Forwards playback to the browser and reports natural ends back to the model.
///
/// A new buffer is shipped as one WAV frame the first time it is started; later starts
/// of the same buffer only send `playback_start`.
pub struct WsAudioSink {
    outbound: UnboundedSender<Outgoing>,
    events: UnboundedSender<Msg>,
    shipped: Option<Arc<SampleBuffer>>,
    end_timer: Option<CancellationToken>,
}

impl WsAudioSink {
    pub fn new(outbound: UnboundedSender<Outgoing>, events: UnboundedSender<Msg>) -> Self {
        Self {
            outbound,
            events,
            shipped: None,
            end_timer: None,
        }
    }

    fn send(&self, message: ServerMessage) {
        if self.outbound.send(Outgoing::Text(message)).is_err() {
            debug!("Socket writer gone; dropping playback message");
        }
    }

    fn ship(&mut self, buffer: &Arc<SampleBuffer>) {
        if self.shipped.as_ref().is_some_and(|b| Arc::ptr_eq(b, buffer)) {
            return;
        }
        match wav::encode_wav(buffer) {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Shipping narration buffer");
                if self.outbound.send(Outgoing::Binary(Bytes::from(bytes))).is_err() {
                    debug!("Socket writer gone; dropping narration buffer");
                }
                self.shipped = Some(buffer.clone());
            }
            Err(e) => error!("Failed to encode narration as WAV: {}", e),
        }
    }

    fn cancel_end_timer(&mut self) {
        if let Some(token) = self.end_timer.take() {
            token.cancel();
        }
    }

    /// Posts `PlaybackEnded` once the remaining audio has had time to play.
    fn arm_end_timer(&mut self, source: SourceId, remaining: Duration) {
        self.cancel_end_timer();
        let token = CancellationToken::new();
        let events = self.events.clone();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(remaining) => {
                    let _ = events.send(Msg::PlaybackEnded(source));
                }
            }
        });
        self.end_timer = Some(token);
    }
}

impl AudioSink for WsAudioSink {
    fn start(&mut self, source: SourceId, buffer: Arc<SampleBuffer>, offset: Duration, gain: f32) {
        self.ship(&buffer);
        self.send(ServerMessage::PlaybackStart {
            source,
            offset_secs: offset.as_secs_f64(),
            gain,
        });
        self.arm_end_timer(source, buffer.duration().saturating_sub(offset));
    }

    fn stop(&mut self, source: SourceId) {
        self.cancel_end_timer();
        self.send(ServerMessage::PlaybackStop { source });
    }

    fn set_gain(&mut self, gain: f32) {
        self.send(ServerMessage::PlaybackGain { gain });
    }
}

impl Drop for WsAudioSink {
    fn drop(&mut self) {
        self.cancel_end_timer();
    }
}

//=========================================================================================
// Progress Ticker
//=========================================================================================

/// A `TickScheduler` backed by a tokio interval task.
pub struct TokioTicker {
    events: UnboundedSender<Msg>,
    running: Option<CancellationToken>,
}

impl TokioTicker {
    pub fn new(events: UnboundedSender<Msg>) -> Self {
        Self {
            events,
            running: None,
        }
    }
}

impl TickScheduler for TokioTicker {
    fn schedule(&mut self, every: Duration) {
        self.cancel();
        let token = CancellationToken::new();
        let child = token.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if events.send(Msg::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.running = Some(token);
    }

    fn cancel(&mut self) {
        if let Some(token) = self.running.take() {
            token.cancel();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

//=========================================================================================
// Command Dispatch
//=========================================================================================

/// A record write queued for the persistence task.
#[derive(Debug)]
enum RecordWrite {
    Favorites(Vec<SavedEntry>),
    Profile(Option<UserProfile>),
}

/// Executes the model's commands for one connection.
pub struct SessionRuntime {
    app_state: Arc<AppState>,
    events: UnboundedSender<Msg>,
    outbound: UnboundedSender<Outgoing>,
    writes: UnboundedSender<RecordWrite>,
}

/// The receiving ends the connection task selects over.
pub struct SessionChannels {
    pub events: UnboundedReceiver<Msg>,
    pub outbound: UnboundedReceiver<Outgoing>,
    /// Finishes once the runtime is dropped and every queued write has been applied.
    pub persistence: JoinHandle<()>,
}

impl SessionRuntime {
    /// Creates the runtime and starts the client's persistence task.
    pub fn start(app_state: Arc<AppState>, client_id: Uuid) -> (Self, SessionChannels) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (writes_tx, writes_rx) = mpsc::unbounded_channel();

        let persistence = tokio::spawn(persist_records(app_state.store.clone(), client_id, writes_rx));

        let runtime = Self {
            app_state,
            events: events_tx,
            outbound: outbound_tx,
            writes: writes_tx,
        };
        let channels = SessionChannels {
            events: events_rx,
            outbound: outbound_rx,
            persistence,
        };
        (runtime, channels)
    }

    pub fn events(&self) -> UnboundedSender<Msg> {
        self.events.clone()
    }

    pub fn outbound(&self) -> UnboundedSender<Outgoing> {
        self.outbound.clone()
    }

    /// Queues a text frame behind any playback frames already queued.
    pub fn send(&self, message: ServerMessage) {
        if self.outbound.send(Outgoing::Text(message)).is_err() {
            debug!("Socket writer gone; dropping message");
        }
    }

    pub fn dispatch(&self, command: Command) {
        match command {
            Command::FetchReflection { generation, request } => {
                let service = self.app_state.reflections.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = service.request_reflection(&request).await;
                    let _ = events.send(Msg::ReflectionArrived { generation, outcome });
                });
            }
            Command::FetchImage { generation, prompt } => {
                let service = self.app_state.images.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = service.request_image(&prompt).await;
                    let _ = events.send(Msg::ImageArrived { generation, outcome });
                });
            }
            Command::FetchNarration { ticket, text, voice } => {
                let service = self.app_state.narration.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = service.request_narration(&text, &voice).await;
                    let _ = events.send(Msg::NarrationArrived { ticket, outcome });
                });
            }
            Command::SaveFavorites(entries) => self.queue_write(RecordWrite::Favorites(entries)),
            Command::SaveProfile(profile) => self.queue_write(RecordWrite::Profile(profile)),
            Command::Share(content) => self.send(ServerMessage::share(content)),
        }
    }

    fn queue_write(&self, write: RecordWrite) {
        if self.writes.send(write).is_err() {
            error!("Persistence task stopped; record change lost");
        }
    }
}

/// Applies record writes one at a time so the last change always wins.
async fn persist_records(
    store: Arc<dyn KeyValueStore>,
    client_id: Uuid,
    mut writes: UnboundedReceiver<RecordWrite>,
) {
    while let Some(write) = writes.recv().await {
        let result = match &write {
            RecordWrite::Favorites(entries) => {
                store::save_favorites(store.as_ref(), client_id, entries).await
            }
            RecordWrite::Profile(profile) => {
                store::save_profile(store.as_ref(), client_id, profile.as_ref()).await
            }
        };
        if let Err(e) = result {
            error!(%client_id, "Failed to persist {}: {}", kind(&write), e);
        }
    }
    info!(%client_id, "Persistence task finished");
}

fn kind(write: &RecordWrite) -> &'static str {
    match write {
        RecordWrite::Favorites(_) => "favorites",
        RecordWrite::Profile(_) => "profile",
    }
}
