//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! One task owns the session's model and feeds it client frames and the results of
//! spawned work, then writes whatever the model and its sink queued for the browser.

use crate::web::{
    middleware::ClientId,
    protocol::{ClientMessage, ServerMessage},
    session::{Outgoing, SessionRuntime},
    state::{AppState, SessionState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use soul_whispers_core::Msg;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(ClientId(client_id)): Extension<ClientId>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, client_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, client_id: Uuid) {
    info!(%client_id, "New WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (runtime, mut channels) = SessionRuntime::start(app_state.clone(), client_id);
    let mut session = SessionState::new(app_state, client_id, runtime).await;
    publish(&session, false);

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_text_message(text.as_str(), &mut session),
                Some(Ok(Message::Close(_))) => {
                    info!(%client_id, "Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%client_id, "WebSocket receive failed: {}", e);
                    break;
                }
                None => {
                    info!(%client_id, "Client disconnected.");
                    break;
                }
            },
            Some(msg) = channels.events.recv() => apply(&mut session, msg),
            Some(frame) = channels.outbound.recv() => {
                if let Err(e) = write_frame(&mut sender, frame).await {
                    warn!(%client_id, "WebSocket send failed: {}", e);
                    break;
                }
            }
        }
    }

    // Dropping the session cancels its playback timers and closes the write queue; the
    // connection is not finished until the queued writes have landed.
    drop(session);
    if let Err(e) = channels.persistence.await {
        error!(%client_id, "Persistence task failed: {}", e);
    }
    info!(%client_id, "WebSocket connection closed.");
}

/// Decodes one client frame and feeds it to the model.
fn handle_text_message(text: &str, session: &mut SessionState) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => {
            debug!(client_id = %session.client_id, ?message, "Client message");
            apply(session, message.into());
        }
        Err(e) => {
            warn!(client_id = %session.client_id, "Failed to deserialize client message: {}", e);
            session.runtime.send(ServerMessage::Error {
                message: format!("Unrecognized message: {}", e),
            });
        }
    }
}

/// Runs one update cycle: mutate, execute commands, publish.
fn apply(session: &mut SessionState, msg: Msg) {
    let is_tick = matches!(msg, Msg::Tick);
    let commands = session.model.update(msg);
    for command in commands {
        session.runtime.dispatch(command);
    }
    publish(session, is_tick);
}

/// Ticks only move the transport, so they send the playback status instead of the page.
fn publish(session: &SessionState, progress_only: bool) {
    let message = if progress_only {
        ServerMessage::Progress {
            playback: session.model.playback_status(),
        }
    } else {
        ServerMessage::State {
            view: Box::new(session.model.view()),
        }
    };
    session.runtime.send(message);
}

async fn write_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: Outgoing,
) -> Result<(), axum::Error> {
    let message = match frame {
        Outgoing::Binary(bytes) => Message::Binary(bytes),
        Outgoing::Text(message) => match serde_json::to_string(&message) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                return Ok(());
            }
        },
    };
    sender.send(message).await
}
