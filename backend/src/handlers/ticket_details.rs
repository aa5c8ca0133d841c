//! HTTP handlers for ticket lines

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::TicketDetail;
use crate::services::ticket::{AddDetailInput, TicketService};
use crate::AppState;

/// Body for a quantity edit
#[derive(Debug, serde::Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: Decimal,
}

/// Add a product line to a ticket, snapshotting the current sale price
pub async fn add_ticket_detail(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<AddDetailInput>,
) -> AppResult<(StatusCode, Json<TicketDetail>)> {
    let service = TicketService::new(state.db, state.events);
    let detail = service.add_detail(input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Edit a line's quantity (stock is not re-validated on edit)
pub async fn update_ticket_detail_quantity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(detail_id): Path<Uuid>,
    Json(input): Json<UpdateQuantityInput>,
) -> AppResult<Json<TicketDetail>> {
    let service = TicketService::new(state.db, state.events);
    Ok(Json(
        service
            .update_detail_quantity(detail_id, input.quantity)
            .await?,
    ))
}

/// Remove a line from a ticket
pub async fn remove_ticket_detail(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(detail_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = TicketService::new(state.db, state.events);
    service.remove_detail(detail_id).await?;
    Ok(Json(()))
}
