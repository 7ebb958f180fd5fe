//! End-to-end behaviour of the application model against fake playback seams.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use soul_whispers_core::{
    app::AppPhase,
    domain::{CrossReference, FocusPoint},
    pcm::SampleBuffer,
    store::{self, Favorites},
    AppModel, AudioSink, Clock, Command, GenerationError, LocalState, MemoryKeyValueStore, Modal,
    Msg, PlaybackController, PlaybackPhase, Reflection, SavedEntry, SourceId, TickScheduler,
    UserProfile,
};
use uuid::Uuid;

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Clone, Default)]
struct Rig {
    started: Arc<Mutex<Vec<(SourceId, Duration)>>>,
    now: Arc<Mutex<Duration>>,
}

impl Rig {
    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    fn last_start(&self) -> Option<(SourceId, Duration)> {
        self.started.lock().unwrap().last().copied()
    }

    fn start_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }
}

struct RigSink(Rig);
impl AudioSink for RigSink {
    fn start(&mut self, source: SourceId, _buffer: Arc<SampleBuffer>, offset: Duration, _gain: f32) {
        self.0.started.lock().unwrap().push((source, offset));
    }
    fn stop(&mut self, _source: SourceId) {}
    fn set_gain(&mut self, _gain: f32) {}
}

struct RigClock(Rig);
impl Clock for RigClock {
    fn now(&self) -> Duration {
        *self.0.now.lock().unwrap()
    }
}

struct NoTicks;
impl TickScheduler for NoTicks {
    fn schedule(&mut self, _every: Duration) {}
    fn cancel(&mut self) {}
}

fn model_with(local: LocalState) -> (AppModel, Rig) {
    let rig = Rig::default();
    let playback = PlaybackController::new(
        Box::new(RigSink(rig.clone())),
        Arc::new(RigClock(rig.clone())),
        Box::new(NoTicks),
    );
    (AppModel::new(local, playback, "https://soul.example"), rig)
}

fn model() -> (AppModel, Rig) {
    model_with(LocalState::default())
}

fn reflection(title: &str) -> Reflection {
    Reflection {
        title: title.to_string(),
        story: format!("Story of {title}"),
        prayer: format!("Prayer of {title}"),
        focus_points: (1..=3)
            .map(|i| FocusPoint {
                title: format!("Point {i}"),
                description: "Breathe.".to_string(),
                scripture: "Psalm 23".to_string(),
            })
            .collect(),
        cross_references: (1..=3)
            .map(|i| CrossReference {
                theme: format!("Theme {i}"),
                reference: "Isaiah 40:31".to_string(),
            })
            .collect(),
        references: vec!["John 14:27".to_string()],
        image_prompt: "A quiet garden at dawn".to_string(),
        image_url: None,
    }
}

/// Base64 PCM16 silence of the given length at 24 kHz.
fn narration(secs: u32) -> String {
    STANDARD.encode(vec![0u8; (secs * 24_000 * 2) as usize])
}

/// Drives generate → text → image and returns the model in `Result`.
fn show(model: &mut AppModel, title: &str) {
    let cmds = model.update(Msg::Generate { topic_override: None });
    let generation = match &cmds[..] {
        [Command::FetchReflection { generation, .. }] => *generation,
        other => panic!("unexpected commands {other:?}"),
    };
    model.update(Msg::ReflectionArrived {
        generation,
        outcome: Ok(reflection(title)),
    });
    model.update(Msg::ImageArrived {
        generation,
        outcome: Ok("data:image/png;base64,AAAA".to_string()),
    });
    assert_eq!(model.phase(), AppPhase::Result);
}

fn sign_in(model: &mut AppModel) {
    model.update(Msg::SignIn {
        name: "Ruth".to_string(),
        email: "ruth@example.com".to_string(),
    });
}

fn start_narration(model: &mut AppModel, secs: u32) {
    let cmds = model.update(Msg::TogglePlayback);
    let ticket = match &cmds[..] {
        [Command::FetchNarration { ticket, .. }] => *ticket,
        other => panic!("unexpected commands {other:?}"),
    };
    model.update(Msg::NarrationArrived {
        ticket,
        outcome: Ok(narration(secs)),
    });
}

//=========================================================================================
// Reflection flow
//=========================================================================================

#[test]
fn successful_reflection_is_shown_verbatim() {
    let (mut model, _) = model();
    model.update(Msg::SelectCategory("marriage".to_string()));
    model.update(Msg::SelectLanguage("fr".to_string()));

    let cmds = model.update(Msg::Generate { topic_override: None });
    let [Command::FetchReflection { generation, request }] = &cmds[..] else {
        panic!("expected a reflection fetch, got {cmds:?}");
    };
    assert_eq!(request.category(), "Marriage");
    assert_eq!(request.sub_topic(), "Communication");
    assert_eq!(request.language(), "French");
    assert_eq!(model.phase(), AppPhase::Loading);

    let cmds = model.update(Msg::ReflectionArrived {
        generation: *generation,
        outcome: Ok(reflection("Still Waters")),
    });
    assert_eq!(
        cmds,
        vec![Command::FetchImage {
            generation: *generation,
            prompt: "A quiet garden at dawn".to_string()
        }]
    );
    assert_eq!(model.phase(), AppPhase::Loading);

    model.update(Msg::ImageArrived {
        generation: *generation,
        outcome: Ok("data:image/png;base64,AAAA".to_string()),
    });
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Result);
    let result = view.result.expect("result shown");
    assert_eq!(result.title, "Still Waters");
    assert_eq!(result.story, "Story of Still Waters");
    assert_eq!(result.prayer, "Prayer of Still Waters");
    assert_eq!(result.focus_points.len(), 3);
    assert_eq!(result.cross_references.len(), 3);
    assert_eq!(result.image_url.as_deref(), Some("data:image/png;base64,AAAA"));
}

#[test]
fn payload_missing_a_required_field_does_not_parse() {
    let mut value = serde_json::to_value(reflection("X")).unwrap();
    value.as_object_mut().unwrap().remove("prayer");
    assert!(serde_json::from_value::<Reflection>(value).is_err());
}

#[test]
fn text_failure_is_fatal_and_readable() {
    let (mut model, _) = model();
    let cmds = model.update(Msg::Generate { topic_override: None });
    let [Command::FetchReflection { generation, .. }] = &cmds[..] else { panic!() };

    let cmds = model.update(Msg::ReflectionArrived {
        generation: *generation,
        outcome: Err(GenerationError::Malformed("missing field `prayer`".to_string())),
    });
    assert!(cmds.is_empty());
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Error);
    assert!(view.result.is_none());
    assert!(view.error.unwrap().contains("missing field"));
}

#[test]
fn filtered_response_reads_differently_from_silence() {
    let messages: Vec<String> = [GenerationError::Filtered, GenerationError::Silent]
        .into_iter()
        .map(|err| {
            let (mut model, _) = model();
            let cmds = model.update(Msg::Generate { topic_override: None });
            let [Command::FetchReflection { generation, .. }] = &cmds[..] else { panic!() };
            model.update(Msg::ReflectionArrived {
                generation: *generation,
                outcome: Err(err),
            });
            model.view().error.unwrap()
        })
        .collect();
    assert_ne!(messages[0], messages[1]);
    assert!(messages[0].contains("filtered for safety"));
}

#[test]
fn image_failure_still_shows_reflection() {
    let (mut model, _) = model();
    let cmds = model.update(Msg::Generate { topic_override: None });
    let [Command::FetchReflection { generation, .. }] = &cmds[..] else { panic!() };
    let generation = *generation;
    model.update(Msg::ReflectionArrived {
        generation,
        outcome: Ok(reflection("Shelter")),
    });
    model.update(Msg::ImageArrived {
        generation,
        outcome: Err(GenerationError::NoImage),
    });
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Result);
    assert!(view.error.is_none());
    assert_eq!(view.result.unwrap().image_url, None);
}

#[test]
fn cross_reference_overrides_sub_topic() {
    let (mut model, _) = model();
    show(&mut model, "First");
    let cmds = model.update(Msg::Generate {
        topic_override: Some("Theme 2".to_string()),
    });
    let [Command::FetchReflection { request, .. }] = &cmds[..] else { panic!() };
    assert_eq!(request.sub_topic(), "Theme 2");
}

#[test]
fn stale_responses_are_dropped() {
    let (mut model, _) = model();
    let first = model.update(Msg::Generate { topic_override: None });
    let second = model.update(Msg::Generate { topic_override: None });
    let [Command::FetchReflection { generation: g1, .. }] = &first[..] else { panic!() };
    let [Command::FetchReflection { generation: g2, .. }] = &second[..] else { panic!() };
    assert!(g2 > g1);

    let cmds = model.update(Msg::ReflectionArrived {
        generation: *g1,
        outcome: Ok(reflection("Old")),
    });
    assert!(cmds.is_empty());
    assert_eq!(model.phase(), AppPhase::Loading);

    model.update(Msg::Reset);
    let cmds = model.update(Msg::ReflectionArrived {
        generation: *g2,
        outcome: Ok(reflection("Late")),
    });
    assert!(cmds.is_empty());
    assert_eq!(model.phase(), AppPhase::Idle);
    assert!(model.view().result.is_none());
}

//=========================================================================================
// Favorites
//=========================================================================================

fn saved(title: &str, ms: i64) -> SavedEntry {
    SavedEntry::new(reflection(title), Utc.timestamp_millis_opt(ms).unwrap())
}

#[test]
fn favorite_requires_sign_in_then_toggles() {
    let local = LocalState {
        favorites: Favorites::new(vec![saved("B", 2), saved("A", 1)]),
        profile: None,
    };
    let (mut model, _) = model_with(local);
    show(&mut model, "Grace");

    assert!(model.update(Msg::ToggleFavorite).is_empty());
    let view = model.view();
    assert!(view.modals.login);
    assert_eq!(view.favorites.len(), 2);

    sign_in(&mut model);
    assert!(!model.view().modals.login);

    let cmds = model.update(Msg::ToggleFavorite);
    let [Command::SaveFavorites(entries)] = &cmds[..] else { panic!("{cmds:?}") };
    let titles: Vec<_> = entries.iter().map(|e| e.reflection.title.as_str()).collect();
    assert_eq!(titles, ["Grace", "B", "A"]);
    assert!(model.view().is_favorite);

    let cmds = model.update(Msg::ToggleFavorite);
    let [Command::SaveFavorites(entries)] = &cmds[..] else { panic!() };
    let titles: Vec<_> = entries.iter().map(|e| e.reflection.title.as_str()).collect();
    assert_eq!(titles, ["B", "A"]);
    assert!(!model.view().is_favorite);
}

#[test]
fn sign_in_and_out_persist_profile() {
    let (mut model, _) = model();
    let cmds = model.update(Msg::SignIn {
        name: "  Ruth ".to_string(),
        email: "ruth@example.com".to_string(),
    });
    assert_eq!(
        cmds,
        vec![Command::SaveProfile(Some(UserProfile {
            name: "Ruth".to_string(),
            email: "ruth@example.com".to_string()
        }))]
    );
    assert_eq!(model.update(Msg::SignOut), vec![Command::SaveProfile(None)]);
    assert!(model.update(Msg::SignOut).is_empty());
    assert!(model
        .update(Msg::SignIn { name: " ".to_string(), email: "x@y".to_string() })
        .is_empty());
}

#[test]
fn opening_a_favorite_shows_it_and_closes_drawer() {
    let entry = saved("Kept", 5);
    let id = entry.id.clone();
    let local = LocalState {
        favorites: Favorites::new(vec![entry]),
        profile: None,
    };
    let (mut model, _) = model_with(local);
    model.update(Msg::SetModal { modal: Modal::Favorites, open: true });
    model.update(Msg::OpenFavorite(id.clone()));
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Result);
    assert_eq!(view.result.unwrap().title, "Kept");
    assert!(!view.modals.favorites);
    assert!(view.is_favorite);

    let cmds = model.update(Msg::RemoveFavorite(id));
    assert_eq!(cmds, vec![Command::SaveFavorites(vec![])]);
}

#[tokio::test]
async fn favorites_survive_a_reload() {
    let kv = MemoryKeyValueStore::new();
    let client = Uuid::new_v4();

    let (mut model, _) = model();
    sign_in(&mut model);
    let mut commands = Vec::new();
    for title in ["One", "Two"] {
        show(&mut model, title);
        commands.extend(model.update(Msg::ToggleFavorite));
    }
    for cmd in commands {
        if let Command::SaveFavorites(entries) = cmd {
            store::save_favorites(&kv, client, &entries).await.unwrap();
        }
    }
    let before = model.view().favorites;

    let reloaded = store::load_local_state(&kv, client).await;
    let (mut model, _) = model_with(reloaded);
    model.update(Msg::SetModal { modal: Modal::Favorites, open: true });
    let after = model.view().favorites;

    assert_eq!(after.len(), 2);
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.reflection.title, b.reflection.title);
        assert_eq!(a.reflection.story, b.reflection.story);
        assert_eq!(a.timestamp, b.timestamp);
    }
    assert_eq!(after[0].reflection.title, "Two");
}

//=========================================================================================
// Narration
//=========================================================================================

#[test]
fn narration_text_is_story_then_prayer_in_selected_voice() {
    let (mut model, _) = model();
    show(&mut model, "Hope");
    model.update(Msg::SelectVoice("Charon".to_string()));
    let cmds = model.update(Msg::TogglePlayback);
    let [Command::FetchNarration { text, voice, .. }] = &cmds[..] else { panic!() };
    assert_eq!(text, "Story of Hope\n\nPrayer of Hope");
    assert_eq!(voice, "Charon");
    assert_eq!(model.playback_status().phase, PlaybackPhase::Loading);
}

#[test]
fn voice_change_discards_buffer_and_refetches() {
    let (mut model, rig) = model();
    show(&mut model, "Hope");
    start_narration(&mut model, 2);
    rig.advance(Duration::from_secs(1));
    model.update(Msg::Tick);
    assert_eq!(model.playback_status().elapsed_label, "0:01");

    model.update(Msg::SelectVoice("Puck".to_string()));
    let status = model.playback_status();
    assert_eq!(status.phase, PlaybackPhase::Empty);
    assert_eq!(status.elapsed_label, "0:00");

    let cmds = model.update(Msg::TogglePlayback);
    let [Command::FetchNarration { voice, .. }] = &cmds[..] else { panic!("{cmds:?}") };
    assert_eq!(voice, "Puck");
}

#[test]
fn same_voice_keeps_buffer() {
    let (mut model, _) = model();
    show(&mut model, "Hope");
    start_narration(&mut model, 1);
    model.update(Msg::SelectVoice("Kore".to_string()));
    assert_eq!(model.playback_status().phase, PlaybackPhase::Playing);
}

#[test]
fn seeking_paused_and_playing() {
    let (mut model, rig) = model();
    show(&mut model, "Hope");
    start_narration(&mut model, 120);
    assert_eq!(model.playback_status().duration, Duration::from_secs(120));

    model.update(Msg::TogglePlayback);
    let starts = rig.start_count();
    model.update(Msg::Seek(0.5));
    let status = model.playback_status();
    assert_eq!(status.phase, PlaybackPhase::ReadyPaused);
    assert_eq!(status.position, Duration::from_secs(60));
    assert_eq!(rig.start_count(), starts);

    model.update(Msg::TogglePlayback);
    assert_eq!(rig.last_start().map(|(_, at)| at), Some(Duration::from_secs(60)));
    model.update(Msg::Seek(0.5));
    assert_eq!(rig.start_count(), starts + 2);
    assert_eq!(rig.last_start().map(|(_, at)| at), Some(Duration::from_secs(60)));
}

#[test]
fn transport_example_three_quarters() {
    let (mut model, rig) = model();
    show(&mut model, "Hope");
    start_narration(&mut model, 120);
    rig.advance(Duration::from_secs(30));
    model.update(Msg::Tick);
    assert_eq!(model.playback_status().position, Duration::from_secs(30));

    model.update(Msg::Seek(0.75));
    let status = model.playback_status();
    assert_eq!(status.position, Duration::from_secs(90));
    assert_eq!(status.remaining_label, "-0:30");
}

#[test]
fn new_reflection_discards_late_narration() {
    let (mut model, rig) = model();
    show(&mut model, "Hope");
    let cmds = model.update(Msg::TogglePlayback);
    let [Command::FetchNarration { ticket, .. }] = &cmds[..] else { panic!() };
    let ticket = *ticket;

    model.update(Msg::Generate { topic_override: None });
    model.update(Msg::NarrationArrived {
        ticket,
        outcome: Ok(narration(1)),
    });
    assert_eq!(model.playback_status().phase, PlaybackPhase::Empty);
    assert_eq!(rig.start_count(), 0);
}

#[test]
fn narration_failure_is_local_to_the_player() {
    let (mut model, _) = model();
    show(&mut model, "Hope");
    let cmds = model.update(Msg::TogglePlayback);
    let [Command::FetchNarration { ticket, .. }] = &cmds[..] else { panic!() };
    model.update(Msg::NarrationArrived {
        ticket: *ticket,
        outcome: Err(GenerationError::NoAudio),
    });
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Result);
    assert_eq!(view.playback.phase, PlaybackPhase::Error);
    assert_eq!(view.playback.error.as_deref(), Some("Unable to load narration."));
}

#[test]
fn share_uses_current_result() {
    let (mut model, _) = model();
    assert!(model.update(Msg::Share).is_empty());
    show(&mut model, "Hope");
    let cmds = model.update(Msg::Share);
    let [Command::Share(content)] = &cmds[..] else { panic!() };
    assert!(content.message.ends_with("https://soul.example"));
    assert!(content.clipboard.starts_with("Hope\n\n"));
}

#[test]
fn loading_hides_the_previous_reflection_and_its_actions() {
    let (mut model, rig) = model();
    sign_in(&mut model);
    show(&mut model, "Old");

    let cmds = model.update(Msg::Generate {
        topic_override: Some("Theme 1".to_string()),
    });
    let [Command::FetchReflection { generation, .. }] = &cmds[..] else { panic!() };
    let generation = *generation;
    let view = model.view();
    assert_eq!(view.phase, AppPhase::Loading);
    assert!(view.result.is_none());
    assert!(!view.is_favorite);

    assert!(model.update(Msg::TogglePlayback).is_empty());
    assert!(model.update(Msg::ToggleFavorite).is_empty());
    assert!(model.update(Msg::Share).is_empty());
    assert!(model.view().favorites.is_empty());

    model.update(Msg::ReflectionArrived {
        generation,
        outcome: Ok(reflection("New")),
    });
    model.update(Msg::ImageArrived {
        generation,
        outcome: Ok("data:image/png;base64,AAAA".to_string()),
    });
    let view = model.view();
    assert_eq!(view.result.map(|r| r.title).as_deref(), Some("New"));
    assert_eq!(view.playback.phase, PlaybackPhase::Empty);
    assert_eq!(rig.start_count(), 0);
}

#[test]
fn failed_request_shows_only_the_error() {
    let (mut model, _) = model();
    show(&mut model, "Old");
    let cmds = model.update(Msg::Generate { topic_override: None });
    let [Command::FetchReflection { generation, .. }] = &cmds[..] else { panic!() };
    model.update(Msg::ReflectionArrived {
        generation: *generation,
        outcome: Err(GenerationError::Silent),
    });

    let view = model.view();
    assert_eq!(view.phase, AppPhase::Error);
    assert!(view.result.is_none());
    assert!(view.error.is_some());
    assert!(model.update(Msg::TogglePlayback).is_empty());
}
