//! Conversation controller — query submission and the deferred responder.
//!
//! DESIGN
//! ======
//! The controller is a two-state machine per session: Idle and Pending.
//! `submit_query` appends the user entry and flips `pending` under a single
//! write lock, so the one-in-flight invariant holds under concurrent
//! gateway traffic. The responder task sleeps for the configured delay,
//! appends the canned assistant entry, clears `pending`, and pushes a
//! `chat:response` frame followed by exactly one `chat:notice` frame to
//! session watchers.
//!
//! There is no failure path: an accepted submission always produces its
//! assistant entry, and the responder cannot be canceled or superseded.
//! Submissions while Pending are rejected without touching the store.

use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::{Data, FRAME_MESSAGE, Frame};
use crate::state::{AppState, Author, ChatEntry};

use super::session;
use super::session::SessionError;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Simulated analysis latency between a query and its response.
pub const RESPONSE_DELAY: Duration = Duration::from_millis(2000);

/// Assistant entry seeded into every new session.
pub(crate) const WELCOME_MESSAGE: &str = "Welcome to your AI Business Intelligence assistant! \
     I can help you analyze your data and provide insights. What would you like to explore today?";

/// One-shot notice pushed after each completed response cycle.
const NOTICE_MESSAGE: &str = "Analysis complete! Check out your insights below.";

/// Canned acknowledgement referencing the submitted query. The response
/// never branches on query content.
fn response_text(query: &str) -> String {
    format!(
        "Based on your query \"{query}\", I've analyzed your data and generated comprehensive \
         insights below. The visualizations show key trends and patterns in your business metrics."
    )
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("a response is already pending")]
    ResponsePending,
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
}

impl crate::frame::ErrorCode for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "E_EMPTY_QUERY",
            Self::ResponsePending => "E_RESPONSE_PENDING",
            Self::SessionNotFound(_) => "E_SESSION_NOT_FOUND",
        }
    }

    fn retryable(&self) -> bool {
        // Resubmitting succeeds once the in-flight response lands.
        matches!(self, Self::ResponsePending)
    }
}

/// Read model handed to the presentation surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Transcript {
    pub entries: Vec<ChatEntry>,
    pub pending: bool,
}

// =============================================================================
// SUBMIT
// =============================================================================

/// Submit a query: append the user entry, enter Pending, and schedule the
/// deferred responder. Rejections leave the store and flag untouched.
///
/// # Errors
///
/// `EmptyQuery` for whitespace-only text, `ResponsePending` while a
/// response is in flight, `SessionNotFound` for a discarded session.
pub async fn submit_query(
    state: &AppState,
    session_id: Uuid,
    text: &str,
) -> Result<ChatEntry, SubmitError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::EmptyQuery);
    }

    // Guard check, flag flip, and append happen under one write lock so a
    // concurrent submit cannot slip in between.
    let user_entry = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(SubmitError::SessionNotFound(session_id))?;
        if session.pending {
            return Err(SubmitError::ResponsePending);
        }
        session.pending = true;
        session.last_query = Some(trimmed.to_string());
        session.append(Author::User, trimmed.to_string(), false)
    };

    info!(%session_id, entry_id = user_entry.id, query_len = trimmed.len(), "chat: query accepted");
    spawn_responder(state.clone(), session_id);
    Ok(user_entry)
}

// =============================================================================
// DEFERRED RESPONDER
// =============================================================================

/// Schedule the single-shot responder for an accepted submission.
fn spawn_responder(state: AppState, session_id: Uuid) {
    tokio::spawn(async move {
        tokio::time::sleep(state.response_delay).await;
        complete_response(&state, session_id).await;
    });
}

/// Append the assistant entry, return to Idle, and push response + notice
/// frames. Runs exactly once per accepted submission.
async fn complete_response(state: &AppState, session_id: Uuid) {
    let assistant = {
        let mut sessions = state.sessions.write().await;
        let Some(session) = sessions.get_mut(&session_id) else {
            debug!(%session_id, "chat: session discarded before response");
            return;
        };
        let query = session.last_query.clone().unwrap_or_default();
        let entry = session.append(Author::Assistant, response_text(&query), true);
        session.pending = false;
        entry
    };

    info!(%session_id, entry_id = assistant.id, "chat: response ready");

    let mut data = Data::new();
    data.insert("entry".into(), serde_json::to_value(&assistant).unwrap_or_default());
    data.insert("pending".into(), serde_json::Value::Bool(false));
    let response = Frame::request("chat:response", data).with_session_id(session_id);
    session::broadcast(state, session_id, &response).await;

    let notice = Frame::request("chat:notice", Data::new())
        .with_session_id(session_id)
        .with_data(FRAME_MESSAGE, NOTICE_MESSAGE);
    session::broadcast(state, session_id, &notice).await;
}

// =============================================================================
// READ MODEL
// =============================================================================

/// Snapshot the ordered transcript and the pending flag.
///
/// # Errors
///
/// Returns `NotFound` if the session has been discarded.
pub async fn transcript(state: &AppState, session_id: Uuid) -> Result<Transcript, SessionError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or(SessionError::NotFound(session_id))?;
    Ok(Transcript { entries: session.entries.clone(), pending: session.pending })
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
