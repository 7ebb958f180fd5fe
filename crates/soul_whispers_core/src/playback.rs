//! crates/soul_whispers_core/src/playback.rs
//!
//! The narration transport: decodes a speech payload once, then tracks play, pause,
//! seek and volume against a single `AudioSink`.
//!
//! Position is bookkept from wall-clock deltas (`Clock`) rather than from the sink,
//! and progress is only recomputed on ticks while `Playing`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::format::{format_time, remaining_label};
use crate::pcm::{self, SampleBuffer};
use crate::ports::{AudioSink, Clock, GenerationResult, SourceId, TickScheduler};

pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_VOLUME: f32 = 0.8;
pub const NARRATION_ERROR: &str = "Unable to load narration.";

/// Tags one narration request so late responses can be discarded after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NarrationTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Empty,
    Loading,
    ReadyPaused,
    Playing,
    Error,
}

/// What a play/pause press resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRequest {
    /// No buffer yet: the caller must fetch narration and hand it to `on_narration`.
    Fetch(NarrationTicket),
    Started,
    Paused,
    /// A fetch is already in flight.
    Busy,
}

/// Read-only snapshot for rendering the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub phase: PlaybackPhase,
    #[serde(serialize_with = "as_secs")]
    pub position: Duration,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
    pub volume: f32,
    pub error: Option<String>,
    pub elapsed_label: String,
    pub remaining_label: String,
    pub progress: f64,
}

fn as_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

pub struct PlaybackController {
    sink: Box<dyn AudioSink>,
    clock: Arc<dyn Clock>,
    ticker: Box<dyn TickScheduler>,
    tick_interval: Duration,

    phase: PlaybackPhase,
    buffer: Option<Arc<SampleBuffer>>,
    duration: Duration,
    resume_offset: Duration,
    started_at: Duration,
    position: Duration,
    volume: f32,
    error: Option<String>,

    active_source: Option<SourceId>,
    next_source: u64,
    next_ticket: u64,
    pending: Option<NarrationTicket>,
}

impl PlaybackController {
    pub fn new(
        sink: Box<dyn AudioSink>,
        clock: Arc<dyn Clock>,
        ticker: Box<dyn TickScheduler>,
    ) -> Self {
        Self {
            sink,
            clock,
            ticker,
            tick_interval: PROGRESS_INTERVAL,
            phase: PlaybackPhase::Empty,
            buffer: None,
            duration: Duration::ZERO,
            resume_offset: Duration::ZERO,
            started_at: Duration::ZERO,
            position: Duration::ZERO,
            volume: DEFAULT_VOLUME,
            error: None,
            active_source: None,
            next_source: 0,
            next_ticket: 0,
            pending: None,
        }
    }

    pub fn with_tick_interval(mut self, every: Duration) -> Self {
        self.tick_interval = every;
        self
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    //-------------------------------------------------------------------------------------
    // Transport operations
    //-------------------------------------------------------------------------------------

    /// The single play/pause button.
    pub fn toggle(&mut self) -> PlayRequest {
        match self.phase {
            PlaybackPhase::Playing => {
                self.pause();
                PlayRequest::Paused
            }
            PlaybackPhase::ReadyPaused => {
                self.start_source(self.resume_offset);
                PlayRequest::Started
            }
            PlaybackPhase::Loading => PlayRequest::Busy,
            PlaybackPhase::Empty | PlaybackPhase::Error => {
                self.next_ticket += 1;
                let ticket = NarrationTicket(self.next_ticket);
                self.pending = Some(ticket);
                self.error = None;
                self.phase = PlaybackPhase::Loading;
                debug!(ticket = ticket.0, "Narration requested");
                PlayRequest::Fetch(ticket)
            }
        }
    }

    /// Stores the resume offset and stops the source. No-op unless playing.
    pub fn pause(&mut self) -> bool {
        if self.phase != PlaybackPhase::Playing {
            return false;
        }
        let offset = (self.resume_offset + self.elapsed_since_start()).min(self.duration);
        self.stop_source();
        self.resume_offset = offset;
        self.position = offset;
        self.phase = PlaybackPhase::ReadyPaused;
        true
    }

    /// Completes a `Fetch`. Returns `false` when the ticket is stale and the payload
    /// was discarded.
    pub fn on_narration(&mut self, ticket: NarrationTicket, outcome: GenerationResult<String>) -> bool {
        if self.pending != Some(ticket) {
            debug!(ticket = ticket.0, "Discarding stale narration response");
            return false;
        }
        let decoded = match outcome {
            Ok(payload) => pcm::decode_narration(&payload).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match decoded {
            Ok(buffer) => self.on_buffer(ticket, buffer),
            Err(reason) => {
                warn!(ticket = ticket.0, %reason, "Narration failed");
                self.pending = None;
                self.phase = PlaybackPhase::Error;
                self.error = Some(NARRATION_ERROR.to_string());
                true
            }
        }
    }

    /// Completes a `Fetch` with an already-decoded buffer and starts from 0.
    pub fn on_buffer(&mut self, ticket: NarrationTicket, buffer: SampleBuffer) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        if buffer.frames() == 0 {
            self.phase = PlaybackPhase::Error;
            self.error = Some(NARRATION_ERROR.to_string());
            return true;
        }
        self.duration = buffer.duration();
        self.buffer = Some(Arc::new(buffer));
        info!(duration_secs = self.duration.as_secs_f64(), "Narration decoded");
        self.start_source(Duration::ZERO);
        true
    }

    /// Maps a horizontal fraction of the transport to an absolute offset.
    pub fn seek(&mut self, fraction: f64) -> bool {
        if self.buffer.is_none() || self.duration.is_zero() {
            return false;
        }
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let target = self.duration.mul_f64(fraction);
        self.resume_offset = target;
        self.position = target;
        if self.phase == PlaybackPhase::Playing {
            self.start_source(target);
        }
        true
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_gain(self.volume);
    }

    /// Discards any buffer or in-flight narration and returns to `Empty`.
    pub fn reset(&mut self) {
        self.stop_source();
        self.buffer = None;
        self.pending = None;
        self.duration = Duration::ZERO;
        self.resume_offset = Duration::ZERO;
        self.position = Duration::ZERO;
        self.error = None;
        self.phase = PlaybackPhase::Empty;
    }

    /// Recomputes the reported position. Only meaningful while playing.
    pub fn tick(&mut self) {
        if self.phase == PlaybackPhase::Playing {
            self.position = (self.resume_offset + self.elapsed_since_start()).min(self.duration);
        }
    }

    /// The sink reports that `source` played to its natural end.
    pub fn on_source_ended(&mut self, source: SourceId) -> bool {
        if self.active_source != Some(source) {
            return false;
        }
        self.active_source = None;
        self.ticker.cancel();
        self.phase = PlaybackPhase::ReadyPaused;
        self.resume_offset = Duration::ZERO;
        self.position = Duration::ZERO;
        true
    }

    pub fn status(&self) -> PlaybackStatus {
        let progress = if self.duration.is_zero() {
            0.0
        } else {
            (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        PlaybackStatus {
            phase: self.phase,
            position: self.position,
            duration: self.duration,
            volume: self.volume,
            error: self.error.clone(),
            elapsed_label: format_time(self.position),
            remaining_label: remaining_label(self.position, self.duration),
            progress,
        }
    }

    //-------------------------------------------------------------------------------------
    // Source management
    //-------------------------------------------------------------------------------------

    fn start_source(&mut self, offset: Duration) {
        let Some(buffer) = self.buffer.clone() else {
            return;
        };
        self.stop_source();
        let offset = wrap_offset(offset, self.duration);
        self.next_source += 1;
        let source = SourceId(self.next_source);
        self.sink.start(source, buffer, offset, self.volume);
        self.active_source = Some(source);
        self.started_at = self.clock.now();
        self.resume_offset = offset;
        self.position = offset;
        self.phase = PlaybackPhase::Playing;
        self.ticker.schedule(self.tick_interval);
    }

    fn stop_source(&mut self) {
        if let Some(source) = self.active_source.take() {
            self.sink.stop(source);
        }
        self.ticker.cancel();
    }

    fn elapsed_since_start(&self) -> Duration {
        self.clock.now().saturating_sub(self.started_at)
    }
}

/// Start offsets wrap around the track length.
fn wrap_offset(offset: Duration, duration: Duration) -> Duration {
    if duration.is_zero() {
        return Duration::ZERO;
    }
    if offset < duration {
        return offset;
    }
    let nanos = offset.as_nanos() % duration.as_nanos();
    Duration::from_nanos(nanos as u64)
}
