//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server.

use serde::{Deserialize, Serialize};
use soul_whispers_core::{
    share::ShareContent, AppView, Modal, Msg, PlaybackStatus, SourceId,
};

const WHATSAPP_SHARE_URL: &str = "https://wa.me/";

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SelectCategory { category_id: String },
    SelectSubTopic { sub_topic: String },
    SelectLanguage { language_code: String },
    SelectVoice { voice_id: String },
    SetFontSize { index: usize },
    SetLineSpacing { index: usize },
    /// Starts a reflection; `topic_override` follows a cross-reference theme.
    Generate {
        #[serde(default)]
        topic_override: Option<String>,
    },
    /// "New search": back to the selection screen.
    Reset,
    ToggleFavorite,
    RemoveFavorite { id: String },
    OpenFavorite { id: String },
    SignIn { name: String, email: String },
    SignOut,
    SetModal { modal: Modal, open: bool },
    TogglePlayback,
    /// Jump to a fraction of the narration, 0.0 to 1.0.
    Seek { fraction: f64 },
    SetVolume { volume: f32 },
    Share,
}

impl From<ClientMessage> for Msg {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::SelectCategory { category_id } => Msg::SelectCategory(category_id),
            ClientMessage::SelectSubTopic { sub_topic } => Msg::SelectSubTopic(sub_topic),
            ClientMessage::SelectLanguage { language_code } => Msg::SelectLanguage(language_code),
            ClientMessage::SelectVoice { voice_id } => Msg::SelectVoice(voice_id),
            ClientMessage::SetFontSize { index } => Msg::SetFontSize(index),
            ClientMessage::SetLineSpacing { index } => Msg::SetLineSpacing(index),
            ClientMessage::Generate { topic_override } => Msg::Generate { topic_override },
            ClientMessage::Reset => Msg::Reset,
            ClientMessage::ToggleFavorite => Msg::ToggleFavorite,
            ClientMessage::RemoveFavorite { id } => Msg::RemoveFavorite(id),
            ClientMessage::OpenFavorite { id } => Msg::OpenFavorite(id),
            ClientMessage::SignIn { name, email } => Msg::SignIn { name, email },
            ClientMessage::SignOut => Msg::SignOut,
            ClientMessage::SetModal { modal, open } => Msg::SetModal { modal, open },
            ClientMessage::TogglePlayback => Msg::TogglePlayback,
            ClientMessage::Seek { fraction } => Msg::Seek(fraction),
            ClientMessage::SetVolume { volume } => Msg::SetVolume(volume),
            ClientMessage::Share => Msg::Share,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: Narration audio is sent as binary WAV frames, not as part of this enum. Each
// frame replaces the client's current buffer; `playback_start` always refers to the
// most recent one.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full page state, sent after every change.
    State { view: Box<AppView> },

    /// Transport position only, sent on each progress tick.
    Progress { playback: PlaybackStatus },

    /// Start the current buffer at `offset_secs` with the given gain.
    PlaybackStart {
        source: SourceId,
        offset_secs: f64,
        gain: f32,
    },

    /// Stop the named source; a stop for an already-replaced source is harmless.
    PlaybackStop { source: SourceId },

    /// Change the gain of the active source without restarting it.
    PlaybackGain { gain: f32 },

    /// Texts for the share actions.
    Share {
        message: String,
        clipboard: String,
        whatsapp_url: String,
    },

    /// Reports a protocol error; the session stays open.
    Error { message: String },
}

impl ServerMessage {
    pub fn share(content: ShareContent) -> Self {
        let whatsapp_url = reqwest::Url::parse_with_params(
            WHATSAPP_SHARE_URL,
            &[("text", content.message.as_str())],
        )
        .map(|url| url.to_string())
        .unwrap_or_else(|_| WHATSAPP_SHARE_URL.to_string());
        ServerMessage::Share {
            message: content.message,
            clipboard: content.clipboard,
            whatsapp_url,
        }
    }
}
