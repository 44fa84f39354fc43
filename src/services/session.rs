//! Session lifecycle — open/discard and watcher management.
//!
//! DESIGN
//! ======
//! A session is opened per websocket connection and seeded with the
//! assistant welcome entry. Watchers are per-client frame channels used
//! for server-originated pushes. When the last watcher detaches, the
//! session is discarded — the transcript is in-memory only and nothing
//! outlives the connection.

use tracing::info;
use uuid::Uuid;

use crate::frame::Frame;
use crate::state::{AppState, Author, ChatEntry, SessionState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(Uuid),
}

impl crate::frame::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_SESSION_NOT_FOUND",
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Open a fresh session seeded with the welcome entry. Returns the session
/// ID and the seeded entry.
pub async fn open_session(state: &AppState) -> (Uuid, ChatEntry) {
    let session_id = Uuid::new_v4();
    let mut session = SessionState::new();
    let welcome = session.append(
        Author::Assistant,
        super::conversation::WELCOME_MESSAGE.to_string(),
        false,
    );

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id, session);
    info!(%session_id, "session opened");
    (session_id, welcome)
}

/// Register a watcher channel for pushed frames.
///
/// # Errors
///
/// Returns `NotFound` if the session has already been discarded.
pub async fn attach_watcher(
    state: &AppState,
    session_id: Uuid,
    client_id: Uuid,
    tx: tokio::sync::mpsc::Sender<Frame>,
) -> Result<(), SessionError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or(SessionError::NotFound(session_id))?;
    session.watchers.insert(client_id, tx);
    Ok(())
}

/// Remove a watcher. Discards the session when the last watcher leaves;
/// a responder still in flight for a discarded session is a no-op.
pub async fn detach_watcher(state: &AppState, session_id: Uuid, client_id: Uuid) {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return;
    };
    session.watchers.remove(&client_id);

    if session.watchers.is_empty() {
        sessions.remove(&session_id);
        info!(%session_id, "session discarded");
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Push a frame to all watchers of a session.
pub async fn broadcast(state: &AppState, session_id: Uuid, frame: &Frame) {
    let sessions = state.sessions.read().await;
    let Some(session) = sessions.get(&session_id) else {
        return;
    };
    for tx in session.watchers.values() {
        // Best-effort: if a watcher's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
