//! HTTP handlers for cash drawer sessions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CashSession, CashSessionSummary};
use crate::services::cash::{CashSessionService, CloseCashSessionInput, OpenCashSessionInput};
use crate::AppState;

/// All drawer sessions, newest first
pub async fn list_cash_sessions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<CashSession>>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.list().await?))
}

/// Get a drawer session by id
pub async fn get_cash_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.get(session_id).await?))
}

/// The single open drawer session, when one exists. The register is
/// global, not per-user.
pub async fn get_open_cash_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Option<CashSession>>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.find_open().await?))
}

/// Open drawer sessions keyed by a user
pub async fn get_open_cash_sessions_by_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<CashSession>>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.find_open_by_user(user_id).await?))
}

/// Pre-close reconciliation figures for the drawer UI
pub async fn get_cash_session_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<CashSessionSummary>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.summary(session_id).await?))
}

/// Open the drawer. Answers 409 while any session is already open.
pub async fn open_cash_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OpenCashSessionInput>,
) -> AppResult<(StatusCode, Json<CashSession>)> {
    let service = CashSessionService::new(state.db, state.events);
    let session = service.open(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Close the drawer with the counted balance
pub async fn close_cash_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<CloseCashSessionInput>,
) -> AppResult<Json<CashSession>> {
    let service = CashSessionService::new(state.db, state.events);
    Ok(Json(service.close(session_id, input).await?))
}
