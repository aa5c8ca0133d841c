//! HTTP handlers for the event outbox

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::events::OutboxEntry;
use crate::AppState;

#[derive(Serialize)]
pub struct ProcessResult {
    pub delivered: u64,
}

/// Events the transport has not picked up yet
pub async fn list_pending_events(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<OutboxEntry>>> {
    Ok(Json(state.events.pending().await?))
}

/// Re-deliver pending events to the broadcast channel
pub async fn process_pending_events(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ProcessResult>> {
    let delivered = state.events.process_pending().await?;
    Ok(Json(ProcessResult { delivered }))
}
