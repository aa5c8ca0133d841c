//! HTTP handlers for invoices and the sales report

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::Invoice;
use crate::services::invoice::{GenerateInvoiceInput, InvoiceService, InvoiceWithContext};
use crate::AppState;

/// Query parameters for the sales report
#[derive(Debug, serde::Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

/// List every invoice with cashier and table context
pub async fn list_invoices(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<InvoiceWithContext>>> {
    let service = InvoiceService::new(state.db, state.events);
    Ok(Json(service.list().await?))
}

/// Get an invoice by id
pub async fn get_invoice(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceWithContext>> {
    let service = InvoiceService::new(state.db, state.events);
    Ok(Json(service.get(invoice_id).await?))
}

/// The invoice settling a given session, if one exists
pub async fn get_invoice_by_session(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<InvoiceWithContext>> {
    let service = InvoiceService::new(state.db, state.events);
    Ok(Json(service.find_by_session(session_id).await?))
}

/// Generate the invoice for a session and close it, atomically. Retrying
/// with the same session returns the same invoice.
pub async fn generate_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<GenerateInvoiceInput>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let service = InvoiceService::new(state.db, state.events);
    let invoice = service.generate(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Delete an invoice
pub async fn delete_invoice(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = InvoiceService::new(state.db, state.events);
    service.delete(invoice_id).await?;
    Ok(Json(()))
}

/// Daily takings per payment method, as JSON or CSV
pub async fn sales_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let start = query.start_date.ok_or_else(|| AppError::Validation {
        field: "start_date".to_string(),
        message: "start_date is required".to_string(),
    })?;
    let end = query.end_date.ok_or_else(|| AppError::Validation {
        field: "end_date".to_string(),
        message: "end_date is required".to_string(),
    })?;

    let service = InvoiceService::new(state.db, state.events);
    let rows = service.sales_report(start, end).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = InvoiceService::export_to_csv(&rows)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sales_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(rows).into_response())
    }
}
