//! WebSocket handler — the conversation gateway.
//!
//! DESIGN
//! ======
//! On upgrade, the gateway opens a fresh session (seeding the welcome
//! entry), attaches a watcher channel, and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Pushed frames from the deferred responder → forward to the client
//!
//! Handler functions are pure business logic — they validate, call into
//! services, and return an `Outcome`. The dispatch layer owns replies.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → open session → send `session:connected`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Responder pushes `chat:response` + `chat:notice` when a cycle ends
//! 4. Close → detach watcher → session discarded

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// build the reply — handlers never send frames directly.
enum Outcome {
    /// Send done+data to the sender.
    Reply(Data),
    /// Send empty done to the sender.
    Done,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for frames pushed by the deferred responder.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(64);

    let (session_id, welcome) = services::session::open_session(&state).await;
    if services::session::attach_watcher(&state, session_id, client_id, client_tx)
        .await
        .is_err()
    {
        return;
    }

    let connected = Frame::request("session:connected", Data::new())
        .with_session_id(session_id)
        .with_data("client_id", client_id.to_string())
        .with_data(
            "welcome",
            serde_json::to_value(&welcome).unwrap_or_default(),
        );
    if send_frame(&mut socket, &connected).await.is_err() {
        services::session::detach_watcher(&state, session_id, client_id).await;
        return;
    }

    info!(%client_id, %session_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, session_id, client_id, text.as_str()).await {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    services::session::detach_watcher(&state, session_id, client_id).await;
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Separated from the socket loop so tests can exercise dispatch
/// without a live connection.
async fn process_inbound_text(
    state: &AppState,
    session_id: Uuid,
    client_id: Uuid,
    text: &str,
) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new())
                .with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    info!(%client_id, id = %req.id, syscall = %req.syscall, status = ?req.status, "ws: recv frame");

    let result = match req.prefix() {
        "chat" => handle_chat(state, session_id, &req).await,
        "insights" => handle_insights(&req),
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn handle_chat(state: &AppState, session_id: Uuid, req: &Frame) -> Result<Outcome, Frame> {
    let op = req.syscall.split_once(':').map_or("", |(_, op)| op);

    match op {
        "submit" => {
            let query = req
                .data
                .get("query")
                .and_then(|v| v.as_str())
                .unwrap_or("");

            match services::conversation::submit_query(state, session_id, query).await {
                Ok(entry) => {
                    let mut data = Data::new();
                    data.insert("entry".into(), serde_json::to_value(&entry).unwrap_or_default());
                    data.insert("pending".into(), serde_json::json!(true));
                    Ok(Outcome::Reply(data))
                }
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "transcript" => match services::conversation::transcript(state, session_id).await {
            Ok(snapshot) => {
                let mut data = Data::new();
                data.insert(
                    "entries".into(),
                    serde_json::to_value(&snapshot.entries).unwrap_or_default(),
                );
                data.insert("pending".into(), serde_json::json!(snapshot.pending));
                Ok(Outcome::Reply(data))
            }
            Err(e) => Err(req.error_from(&e)),
        },
        _ => Err(req.error(format!("unknown chat op: {op}"))),
    }
}

// =============================================================================
// INSIGHTS HANDLER
// =============================================================================

fn handle_insights(req: &Frame) -> Result<Outcome, Frame> {
    let op = req.syscall.split_once(':').map_or("", |(_, op)| op);

    match op {
        "dataset" => {
            let mut data = Data::new();
            data.insert(
                "payload".into(),
                serde_json::to_value(crate::insights::analysis_payload()).unwrap_or_default(),
            );
            Ok(Outcome::Reply(data))
        }
        _ => Err(req.error(format!("unknown insights op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == crate::frame::Status::Error {
        let code = frame
            .data
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let message = frame
            .data
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
