//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat gateway is websocket-first: the conversation protocol runs
//! entirely over `/api/ws` frames. The REST routes are read-only
//! conveniences for the presentation surface (fixture payload, suggested
//! queries, health).

pub mod insights;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/insights", get(insights::analysis_dataset))
        .route("/api/suggestions", get(insights::suggested_queries))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
