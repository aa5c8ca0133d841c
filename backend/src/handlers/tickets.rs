//! HTTP handlers for order tickets

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Ticket;
use crate::services::ticket::{
    CreateTicketInput, TicketService, TicketWithContext, TicketWithDetails,
};
use crate::AppState;

/// Body for a ticket status change
#[derive(Debug, serde::Deserialize)]
pub struct UpdateTicketStatusInput {
    pub status: String,
}

/// List every ticket, newest first
pub async fn list_tickets(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<TicketWithContext>>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(service.list().await?))
}

/// Get a ticket by id
pub async fn get_ticket(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketWithContext>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(service.get(ticket_id).await?))
}

/// Get a ticket expanded with its lines and total
pub async fn get_ticket_with_details(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketWithDetails>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(service.get_with_details(ticket_id).await?))
}

/// All tickets of a session, with details
pub async fn list_tickets_by_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Vec<TicketWithDetails>>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(service.list_by_session(session_id).await?))
}

/// Raise a new pending ticket; the waiter defaults to the caller
pub async fn create_ticket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTicketInput>,
) -> AppResult<(StatusCode, Json<Ticket>)> {
    let service = TicketService::new(state.db, state.events);
    let ticket = service.create(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Approve or reject a pending ticket. Approval validates and deducts stock
/// atomically; a shortage answers 400 with the offending ingredient.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<UpdateTicketStatusInput>,
) -> AppResult<Json<Ticket>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(service.update_status(ticket_id, &input.status).await?))
}

/// Delete a ticket. Deducted stock is not restored.
pub async fn delete_ticket(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = TicketService::new(state.db, state.events);
    service.delete(ticket_id).await?;
    Ok(Json(()))
}
