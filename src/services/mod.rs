//! Domain services used by the websocket gateway and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the conversation state machine and session lifecycle
//! so route handlers can stay focused on protocol translation.

pub mod conversation;
pub mod session;
