//! crates/soul_whispers_core/src/app.rs
//!
//! The application model. All UI state lives in `AppModel` and changes only through
//! `update`, which returns the side effects the runtime must perform. Results of those
//! effects come back as further messages.
//!
//! Every reflection request carries the model's generation counter; responses tagged
//! with an older generation are dropped.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{self, DEFAULT_LANGUAGE_NAME, FONT_SIZES, LINE_SPACINGS};
use crate::domain::{DisplayPrefs, Reflection, SavedEntry, Selection, UserProfile};
use crate::playback::{NarrationTicket, PlayRequest, PlaybackController, PlaybackStatus};
use crate::ports::{GenerationError, GenerationResult, ReflectionRequest, SourceId};
use crate::share::ShareContent;
use crate::store::{Favorites, LocalState, Toggled};

pub const FALLBACK_ERROR: &str = "The path to the soul is currently quiet. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppPhase {
    Idle,
    Loading,
    Result,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    Login,
    Favorites,
    Privacy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modals {
    pub login: bool,
    pub favorites: bool,
    pub privacy: bool,
}

impl Modals {
    fn set(&mut self, modal: Modal, open: bool) {
        match modal {
            Modal::Login => self.login = open,
            Modal::Favorites => self.favorites = open,
            Modal::Privacy => self.privacy = open,
        }
    }
}

#[derive(Debug)]
pub enum Msg {
    SelectCategory(String),
    SelectSubTopic(String),
    SelectLanguage(String),
    SelectVoice(String),
    SetFontSize(usize),
    SetLineSpacing(usize),
    /// Start a reflection; `topic_override` is a followed cross-reference theme.
    Generate { topic_override: Option<String> },
    ReflectionArrived { generation: u64, outcome: GenerationResult<Reflection> },
    ImageArrived { generation: u64, outcome: GenerationResult<String> },
    Reset,
    ToggleFavorite,
    RemoveFavorite(String),
    OpenFavorite(String),
    SignIn { name: String, email: String },
    SignOut,
    SetModal { modal: Modal, open: bool },
    TogglePlayback,
    NarrationArrived { ticket: NarrationTicket, outcome: GenerationResult<String> },
    Seek(f64),
    SetVolume(f32),
    PlaybackEnded(SourceId),
    Tick,
    Share,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchReflection { generation: u64, request: ReflectionRequest },
    FetchImage { generation: u64, prompt: String },
    FetchNarration { ticket: NarrationTicket, text: String, voice: String },
    SaveFavorites(Vec<SavedEntry>),
    SaveProfile(Option<UserProfile>),
    Share(ShareContent),
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayView {
    pub font_size_index: usize,
    pub font_size_label: &'static str,
    pub line_spacing_index: usize,
    pub line_spacing_label: &'static str,
}

/// Everything the page renders, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct AppView {
    pub phase: AppPhase,
    pub selection: Selection,
    pub display: DisplayView,
    pub result: Option<Reflection>,
    pub error: Option<String>,
    pub is_favorite: bool,
    pub favorites: Vec<SavedEntry>,
    pub profile: Option<UserProfile>,
    pub modals: Modals,
    pub playback: PlaybackStatus,
}

pub struct AppModel {
    phase: AppPhase,
    selection: Selection,
    display: DisplayPrefs,
    result: Option<Reflection>,
    /// Text result waiting for its illustration.
    pending: Option<Reflection>,
    error: Option<String>,
    favorites: Favorites,
    profile: Option<UserProfile>,
    modals: Modals,
    generation: u64,
    playback: PlaybackController,
    page_url: String,
}

impl AppModel {
    pub fn new(local: LocalState, playback: PlaybackController, page_url: impl Into<String>) -> Self {
        let category = catalog::default_category();
        Self {
            phase: AppPhase::Idle,
            selection: Selection {
                category_id: category.id.to_string(),
                sub_topic: category.first_sub_topic().map(|t| t.label.to_string()),
                language_code: "en".to_string(),
                voice_id: catalog::default_voice().id.to_string(),
            },
            display: DisplayPrefs::default(),
            result: None,
            pending: None,
            error: None,
            favorites: local.favorites,
            profile: local.profile,
            modals: Modals::default(),
            generation: 0,
            playback,
            page_url: page_url.into(),
        }
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::SelectCategory(id) => self.select_category(&id),
            Msg::SelectSubTopic(label) => self.select_sub_topic(label),
            Msg::SelectLanguage(code) => {
                if catalog::language(&code).is_some() {
                    self.selection.language_code = code;
                } else {
                    warn!(%code, "Ignoring unknown language");
                }
            }
            Msg::SelectVoice(id) => self.select_voice(id),
            Msg::SetFontSize(index) if index < FONT_SIZES.len() => {
                self.display.font_size_index = index;
            }
            Msg::SetLineSpacing(index) if index < LINE_SPACINGS.len() => {
                self.display.line_spacing_index = index;
            }
            Msg::SetFontSize(_) | Msg::SetLineSpacing(_) => {}
            Msg::Generate { topic_override } => return self.generate(topic_override),
            Msg::ReflectionArrived { generation, outcome } => {
                return self.reflection_arrived(generation, outcome)
            }
            Msg::ImageArrived { generation, outcome } => self.image_arrived(generation, outcome),
            Msg::Reset => {
                self.begin_new_request();
                self.phase = AppPhase::Idle;
            }
            Msg::ToggleFavorite => return self.toggle_favorite(),
            Msg::RemoveFavorite(id) => {
                if self.favorites.remove(&id) {
                    return vec![self.save_favorites()];
                }
            }
            Msg::OpenFavorite(id) => self.open_favorite(&id),
            Msg::SignIn { name, email } => return self.sign_in(name, email),
            Msg::SignOut => {
                if self.profile.take().is_some() {
                    info!("Signed out");
                    return vec![Command::SaveProfile(None)];
                }
            }
            Msg::SetModal { modal, open } => self.modals.set(modal, open),
            Msg::TogglePlayback => return self.toggle_playback(),
            Msg::NarrationArrived { ticket, outcome } => {
                self.playback.on_narration(ticket, outcome);
            }
            Msg::Seek(fraction) => {
                self.playback.seek(fraction);
            }
            Msg::SetVolume(volume) => self.playback.set_volume(volume),
            Msg::PlaybackEnded(source) => {
                self.playback.on_source_ended(source);
            }
            Msg::Tick => self.playback.tick(),
            Msg::Share => {
                if let Some(result) = self.shown() {
                    return vec![Command::Share(ShareContent::for_reflection(result, &self.page_url))];
                }
            }
        }
        Vec::new()
    }

    pub fn view(&self) -> AppView {
        let is_favorite = self
            .shown()
            .is_some_and(|r| self.favorites.contains_title(&r.title));
        AppView {
            phase: self.phase,
            selection: self.selection.clone(),
            display: DisplayView {
                font_size_index: self.display.font_size_index,
                font_size_label: FONT_SIZES[self.display.font_size_index].label,
                line_spacing_index: self.display.line_spacing_index,
                line_spacing_label: LINE_SPACINGS[self.display.line_spacing_index].label,
            },
            result: self.shown().cloned(),
            error: self.error.clone(),
            is_favorite,
            favorites: self.favorites.entries().to_vec(),
            profile: self.profile.clone(),
            modals: self.modals,
            playback: self.playback.status(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Selection
    //-------------------------------------------------------------------------------------

    fn select_category(&mut self, id: &str) {
        let Some(category) = catalog::category(id) else {
            warn!(id, "Ignoring unknown category");
            return;
        };
        self.selection.category_id = category.id.to_string();
        self.selection.sub_topic = category.first_sub_topic().map(|t| t.label.to_string());
    }

    fn select_sub_topic(&mut self, label: String) {
        let belongs = catalog::category(&self.selection.category_id)
            .is_some_and(|c| c.has_sub_topic(&label));
        if belongs {
            self.selection.sub_topic = Some(label);
        } else {
            warn!(%label, "Ignoring sub-topic outside the selected category");
        }
    }

    fn select_voice(&mut self, id: String) {
        if catalog::voice(&id).is_none() {
            warn!(%id, "Ignoring unknown voice");
            return;
        }
        if self.selection.voice_id != id {
            self.selection.voice_id = id;
            self.playback.reset();
        }
    }

    //-------------------------------------------------------------------------------------
    // Reflection flow
    //-------------------------------------------------------------------------------------

    /// Tears down playback, hides the current result and invalidates whatever is in
    /// flight.
    fn begin_new_request(&mut self) {
        self.playback.reset();
        self.generation += 1;
        self.result = None;
        self.pending = None;
        self.error = None;
    }

    /// The reflection on screen; only the `Result` phase shows one.
    fn shown(&self) -> Option<&Reflection> {
        self.result.as_ref().filter(|_| self.phase == AppPhase::Result)
    }

    fn generate(&mut self, topic_override: Option<String>) -> Vec<Command> {
        self.begin_new_request();
        let request = match self.compose_request(topic_override) {
            Ok(request) => request,
            Err(e) => {
                self.phase = AppPhase::Error;
                self.error = Some(e.to_string());
                return Vec::new();
            }
        };
        info!(
            generation = self.generation,
            category = request.category(),
            sub_topic = request.sub_topic(),
            language = request.language(),
            "Requesting reflection"
        );
        self.phase = AppPhase::Loading;
        vec![Command::FetchReflection {
            generation: self.generation,
            request,
        }]
    }

    fn compose_request(&self, topic_override: Option<String>) -> GenerationResult<ReflectionRequest> {
        compose_request(
            &self.selection.category_id,
            topic_override.or_else(|| self.selection.sub_topic.clone()),
            &self.selection.language_code,
        )
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.phase == AppPhase::Loading
    }

    fn reflection_arrived(
        &mut self,
        generation: u64,
        outcome: GenerationResult<Reflection>,
    ) -> Vec<Command> {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "Dropping stale reflection");
            return Vec::new();
        }
        match outcome {
            Ok(reflection) => {
                let prompt = reflection.image_prompt.clone();
                self.pending = Some(reflection);
                vec![Command::FetchImage { generation, prompt }]
            }
            Err(e) => {
                warn!(generation, "Reflection failed: {}", e);
                let message = e.to_string();
                self.error = Some(if message.is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                });
                self.phase = AppPhase::Error;
                Vec::new()
            }
        }
    }

    fn image_arrived(&mut self, generation: u64, outcome: GenerationResult<String>) {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "Dropping stale image");
            return;
        }
        let Some(reflection) = self.pending.take() else {
            return;
        };
        let reflection = match outcome {
            Ok(url) => reflection.with_image(url),
            Err(e) => {
                warn!(generation, "Image generation failed: {}", e);
                reflection
            }
        };
        self.result = Some(reflection);
        self.phase = AppPhase::Result;
    }

    //-------------------------------------------------------------------------------------
    // Favorites and profile
    //-------------------------------------------------------------------------------------

    fn toggle_favorite(&mut self) -> Vec<Command> {
        let Some(result) = self.shown().cloned() else {
            return Vec::new();
        };
        if self.profile.is_none() {
            self.modals.login = true;
            return Vec::new();
        }
        match self.favorites.toggle(&result, Utc::now()) {
            Toggled::Added(id) => debug!(%id, "Saved favorite"),
            Toggled::Removed(count) => debug!(count, "Removed favorite"),
        }
        vec![self.save_favorites()]
    }

    fn save_favorites(&self) -> Command {
        Command::SaveFavorites(self.favorites.entries().to_vec())
    }

    fn open_favorite(&mut self, id: &str) {
        let Some(entry) = self.favorites.get(id) else {
            return;
        };
        let reflection = entry.reflection.clone();
        self.begin_new_request();
        self.result = Some(reflection);
        self.phase = AppPhase::Result;
        self.modals.favorites = false;
    }

    fn sign_in(&mut self, name: String, email: String) -> Vec<Command> {
        let (name, email) = (name.trim().to_string(), email.trim().to_string());
        if name.is_empty() || email.is_empty() {
            warn!("Ignoring sign-in with an empty name or email");
            return Vec::new();
        }
        let profile = UserProfile { name, email };
        info!(name = %profile.name, "Signed in");
        self.profile = Some(profile.clone());
        self.modals.login = false;
        vec![Command::SaveProfile(Some(profile))]
    }

    //-------------------------------------------------------------------------------------
    // Narration
    //-------------------------------------------------------------------------------------

    fn toggle_playback(&mut self) -> Vec<Command> {
        let Some(text) = self.shown().map(Reflection::narration_text) else {
            return Vec::new();
        };
        match self.playback.toggle() {
            PlayRequest::Fetch(ticket) => vec![Command::FetchNarration {
                ticket,
                text,
                voice: self.selection.voice_id.clone(),
            }],
            PlayRequest::Started | PlayRequest::Paused | PlayRequest::Busy => Vec::new(),
        }
    }
}

/// Resolves catalog ids to the display labels sent to the generation service.
///
/// The sub-topic falls back to the category label, the language to English.
pub fn compose_request(
    category_id: &str,
    sub_topic: Option<String>,
    language_code: &str,
) -> Result<ReflectionRequest, GenerationError> {
    let category_label = catalog::category(category_id)
        .map(|c| c.label.to_string())
        .unwrap_or_else(|| category_id.to_string());
    let sub_topic = sub_topic.unwrap_or_else(|| category_label.clone());
    let language = catalog::language(language_code)
        .map(|l| l.name)
        .unwrap_or(DEFAULT_LANGUAGE_NAME);
    ReflectionRequest::new(category_label, sub_topic, language)
}
