//! Dead-letter queue inspection endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct DeadLetterResponse {
    pub event_id: String,
    pub event_type: String,
    pub error: String,
    pub attempt_count: u32,
    pub failed_at: DateTime<Utc>,
}

/// GET /dead-letters — lists parked events awaiting inspection or redrive.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeadLetterResponse>>, ApiError> {
    let entries = state.dead_letters.entries().await?;

    let response = entries
        .into_iter()
        .map(|entry| DeadLetterResponse {
            event_id: entry.event.id.to_string(),
            event_type: entry.event.event_type,
            error: entry.error,
            attempt_count: entry.attempt_count,
            failed_at: entry.failed_at,
        })
        .collect();

    Ok(Json(response))
}
