//! Consistency check results endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct ChecksResponse {
    /// Pass/fail per check from the most recent run. Empty until the
    /// scheduler has run once.
    pub checks: HashMap<String, bool>,
    pub all_passed: bool,
}

/// GET /checks — returns the latest consistency check results.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<ChecksResponse> {
    let checks = state.monitor.last_results();
    let all_passed = checks.values().all(|&passed| passed);
    Json(ChecksResponse { checks, all_passed })
}
