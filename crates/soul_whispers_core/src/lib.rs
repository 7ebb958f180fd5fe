pub mod app;
pub mod catalog;
pub mod domain;
pub mod format;
pub mod pcm;
pub mod playback;
pub mod ports;
pub mod share;
pub mod store;

pub use app::{AppModel, AppPhase, AppView, Command, Modal, Msg};
pub use domain::{CrossReference, DisplayPrefs, FocusPoint, Reflection, SavedEntry, Selection, UserProfile};
pub use playback::{NarrationTicket, PlayRequest, PlaybackController, PlaybackPhase, PlaybackStatus};
pub use ports::{
    AudioSink, Clock, GenerationError, GenerationResult, ImageService, KeyValueStore,
    NarrationService, PortError, PortResult, ReflectionRequest, ReflectionService, SourceId,
    SystemClock, TickScheduler,
};
pub use store::{LocalState, MemoryKeyValueStore};
