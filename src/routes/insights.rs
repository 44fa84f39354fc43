//! REST read endpoints for the presentation surface.

use axum::Json;

use crate::insights;
use crate::insights::AnalysisPayload;

/// `GET /api/insights` — the fixed analysis payload.
pub async fn analysis_dataset() -> Json<AnalysisPayload> {
    Json(insights::analysis_payload())
}

/// `GET /api/suggestions` — the canned query strings offered by the input
/// surface.
pub async fn suggested_queries() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "queries": insights::SUGGESTED_QUERIES }))
}

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
