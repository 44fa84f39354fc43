//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds a map of live conversation sessions and the configured response
//! delay. Each session owns an append-only transcript, a pending flag, and
//! the watcher channels that receive server-originated frames.
//!
//! Transcript entries are immutable once appended: the store only ever
//! grows, and nothing hands out `&mut ChatEntry`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::frame::Frame;

// =============================================================================
// CHAT ENTRY
// =============================================================================

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// One immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Monotonic per-session identifier; sorts in creation order.
    pub id: u64,
    pub author: Author,
    pub content: String,
    /// Display-formatted wall clock (HH:MM), captured at creation.
    pub created_at: String,
    /// True only on assistant entries paired with the analysis payload.
    pub has_analysis: bool,
}

/// Display-formatted wall clock for entry timestamps.
fn wall_clock_hhmm() -> String {
    let format = time::macros::format_description!("[hour]:[minute]");
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "00:00".into())
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Per-session live state. Kept in memory for the life of the session and
/// discarded when the last watcher detaches — there is no persistence.
pub struct SessionState {
    /// Ordered, append-only transcript.
    pub entries: Vec<ChatEntry>,
    /// True while a deferred assistant response is in flight.
    pub pending: bool,
    /// Text of the most recently accepted query.
    pub last_query: Option<String>,
    /// Next entry id to assign.
    pub next_entry_id: u64,
    /// Connected watchers: client_id -> sender for pushed frames.
    pub watchers: HashMap<Uuid, mpsc::Sender<Frame>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pending: false,
            last_query: None,
            next_entry_id: 1,
            watchers: HashMap::new(),
        }
    }

    /// Append a new entry and return a copy of it.
    pub fn append(&mut self, author: Author, content: String, has_analysis: bool) -> ChatEntry {
        let entry = ChatEntry {
            id: self.next_entry_id,
            author,
            content,
            created_at: wall_clock_hhmm(),
            has_analysis,
        };
        self.next_entry_id += 1;
        self.entries.push(entry.clone());
        entry
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
    /// Simulated analysis latency for the deferred responder.
    pub response_delay: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(response_delay: Duration) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), response_delay }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Create a test `AppState` with the production response delay.
    /// Tests run under paused Tokio time, so the real duration is irrelevant.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(crate::services::conversation::RESPONSE_DELAY)
    }

    /// Seed a bare session (no welcome entry) and return its ID.
    pub async fn seed_session(state: &AppState) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id, SessionState::new());
        session_id
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
