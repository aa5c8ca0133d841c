//! HTTP handlers for table sessions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{OrderSession, SessionWithActivity};
use crate::services::session::{OpenSessionInput, SessionService};
use crate::AppState;

/// Body for a session status change
#[derive(Debug, serde::Deserialize)]
pub struct UpdateSessionStatusInput {
    pub status: String,
}

/// Body for a tag change
#[derive(Debug, serde::Deserialize)]
pub struct UpdateTagInput {
    pub tag: Option<String>,
}

/// List every session, newest first
pub async fn list_sessions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<OrderSession>>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.list().await?))
}

/// Open sessions with pending-ticket counts and running totals
pub async fn list_active_sessions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<SessionWithActivity>>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.list_active_with_activity().await?))
}

/// Get a session by id
pub async fn get_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<OrderSession>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.get(session_id).await?))
}

/// The open session at a table, if any
pub async fn get_session_by_table(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(table_identifier): Path<String>,
) -> AppResult<Json<OrderSession>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.find_by_table(&table_identifier).await?))
}

/// Open a table
pub async fn open_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<OpenSessionInput>,
) -> AppResult<(StatusCode, Json<OrderSession>)> {
    let service = SessionService::new(state.db, state.events);
    let session = service.open(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Change a session's status (closing clears the tag)
pub async fn update_session_status(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<UpdateSessionStatusInput>,
) -> AppResult<Json<OrderSession>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.update_status(session_id, &input.status).await?))
}

/// Replace an open session's seating tag
pub async fn update_session_tag(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<UpdateTagInput>,
) -> AppResult<Json<OrderSession>> {
    let service = SessionService::new(state.db, state.events);
    Ok(Json(service.update_tag(session_id, input.tag).await?))
}

/// Delete a session and its tickets
pub async fn delete_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = SessionService::new(state.db, state.events);
    service.delete(session_id).await?;
    Ok(Json(()))
}
