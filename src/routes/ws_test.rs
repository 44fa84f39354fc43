use super::*;
use crate::frame::Status;
use crate::state::test_helpers;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

// =========================================================================
// dispatch helpers
// =========================================================================

async fn seeded_session(state: &AppState) -> Uuid {
    let (session_id, _) = services::session::open_session(state).await;
    session_id
}

async fn dispatch(state: &AppState, session_id: Uuid, req: &Frame) -> Vec<Frame> {
    let text = serde_json::to_string(req).unwrap();
    process_inbound_text(state, session_id, Uuid::new_v4(), &text).await
}

// =========================================================================
// chat:submit
// =========================================================================

#[tokio::test(start_paused = true)]
async fn submit_replies_done_with_user_entry() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let req = Frame::request("chat:submit", Data::new())
        .with_session_id(session_id)
        .with_data("query", "What are the top performing products?");
    let frames = dispatch(&state, session_id, &req).await;

    assert_eq!(frames.len(), 1);
    let reply = &frames[0];
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.parent_id, Some(req.id));
    assert_eq!(reply.data.get("pending"), Some(&serde_json::json!(true)));
    let entry = reply.data.get("entry").expect("entry payload");
    assert_eq!(entry["author"], "user");
    assert_eq!(entry["content"], "What are the top performing products?");
}

#[tokio::test]
async fn submit_with_empty_query_is_an_error_frame() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let req = Frame::request("chat:submit", Data::new())
        .with_session_id(session_id)
        .with_data("query", "   ");
    let frames = dispatch(&state, session_id, &req).await;

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].status, Status::Error);
    assert_eq!(frames[0].data.get("code").and_then(|v| v.as_str()), Some("E_EMPTY_QUERY"));

    // Store untouched: only the welcome entry.
    let snapshot = services::conversation::transcript(&state, session_id).await.unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert!(!snapshot.pending);
}

#[tokio::test(start_paused = true)]
async fn submit_while_pending_is_an_error_frame() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let first = Frame::request("chat:submit", Data::new()).with_data("query", "A");
    assert_eq!(dispatch(&state, session_id, &first).await[0].status, Status::Done);

    let second = Frame::request("chat:submit", Data::new()).with_data("query", "B");
    let frames = dispatch(&state, session_id, &second).await;
    assert_eq!(frames[0].status, Status::Error);
    assert_eq!(
        frames[0].data.get("code").and_then(|v| v.as_str()),
        Some("E_RESPONSE_PENDING")
    );
    assert_eq!(
        frames[0]
            .data
            .get("retryable")
            .and_then(serde_json::Value::as_bool),
        Some(true)
    );
}

// =========================================================================
// chat:transcript
// =========================================================================

#[tokio::test(start_paused = true)]
async fn transcript_reflects_a_completed_cycle() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let submit = Frame::request("chat:submit", Data::new()).with_data("query", "Compare revenue by region");
    dispatch(&state, session_id, &submit).await;
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let req = Frame::request("chat:transcript", Data::new());
    let frames = dispatch(&state, session_id, &req).await;

    let reply = &frames[0];
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.data.get("pending"), Some(&serde_json::json!(false)));
    let entries = reply.data.get("entries").and_then(|v| v.as_array()).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["author"], "assistant"); // welcome
    assert_eq!(entries[1]["author"], "user");
    assert_eq!(entries[2]["has_analysis"], serde_json::json!(true));
}

// =========================================================================
// insights:dataset
// =========================================================================

#[tokio::test]
async fn insights_dataset_replies_with_the_fixture() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let req = Frame::request("insights:dataset", Data::new());
    let frames = dispatch(&state, session_id, &req).await;

    let payload = frames[0].data.get("payload").expect("payload");
    assert_eq!(payload["sales"].as_array().unwrap().len(), 6);
    assert_eq!(payload["metrics"][2]["trend"], "down");
}

// =========================================================================
// malformed input
// =========================================================================

#[tokio::test]
async fn unknown_prefix_is_an_error_frame() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let req = Frame::request("board:join", Data::new());
    let frames = dispatch(&state, session_id, &req).await;
    assert_eq!(frames[0].status, Status::Error);
    assert_eq!(
        frames[0].data.get("message").and_then(|v| v.as_str()),
        Some("unknown prefix: board")
    );
}

#[tokio::test]
async fn unknown_chat_op_is_an_error_frame() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let req = Frame::request("chat:retract", Data::new());
    let frames = dispatch(&state, session_id, &req).await;
    assert_eq!(frames[0].status, Status::Error);
    assert_eq!(
        frames[0].data.get("message").and_then(|v| v.as_str()),
        Some("unknown chat op: retract")
    );
}

#[tokio::test]
async fn invalid_json_yields_gateway_error() {
    let state = test_helpers::test_app_state();
    let session_id = seeded_session(&state).await;

    let frames = process_inbound_text(&state, session_id, Uuid::new_v4(), "not json").await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].syscall, "gateway:error");
}

// =========================================================================
// end-to-end over a live socket
// =========================================================================

type ClientSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn recv_frame(socket: &mut ClientSocket) -> Frame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("frame json");
        }
    }
}

#[tokio::test]
async fn full_cycle_over_a_live_socket() {
    // Short real delay: this test runs against a live listener, so paused
    // time is not an option.
    let state = AppState::new(Duration::from_millis(100));
    let app = crate::routes::app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/ws"))
        .await
        .expect("connect");

    // 1. session:connected always arrives first, carrying the welcome entry.
    let connected = recv_frame(&mut socket).await;
    assert_eq!(connected.syscall, "session:connected");
    let session_id = connected.session_id.expect("session_id");
    let welcome = connected.data.get("welcome").expect("welcome entry");
    assert_eq!(welcome["author"], "assistant");

    // 2. Submit a query and read the done reply.
    let req = Frame::request("chat:submit", Data::new())
        .with_session_id(session_id)
        .with_data("query", "Show me last quarter's sales performance");
    socket
        .send(WsMessage::Text(serde_json::to_string(&req).unwrap().into()))
        .await
        .unwrap();

    let reply = recv_frame(&mut socket).await;
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.parent_id, Some(req.id));

    // 3. The deferred responder pushes the response, then the notice.
    let response = recv_frame(&mut socket).await;
    assert_eq!(response.syscall, "chat:response");
    let entry = response.data.get("entry").expect("entry");
    assert_eq!(entry["has_analysis"], serde_json::json!(true));
    assert!(
        entry["content"]
            .as_str()
            .unwrap()
            .contains("Show me last quarter's sales performance")
    );

    let notice = recv_frame(&mut socket).await;
    assert_eq!(notice.syscall, "chat:notice");
    assert_eq!(
        notice.data.get("message").and_then(|v| v.as_str()),
        Some("Analysis complete! Check out your insights below.")
    );
}
