//! Ticket lifecycle: pending → approved/rejected
//!
//! Approval is the only transition with side effects: it validates and
//! deducts stock for every line of the ticket inside one transaction, so a
//! shortage on any line leaves both the ticket and the ledger untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PosEvent, Ticket, TicketDetail, TicketStatus};
use crate::services::events::EventPublisher;
use crate::services::stock::StockService;

#[derive(Clone)]
pub struct TicketService {
    db: PgPool,
    events: EventPublisher,
}

/// Input for creating a ticket. The waiter defaults to the caller.
#[derive(Debug, serde::Deserialize)]
pub struct CreateTicketInput {
    pub session_id: Uuid,
    pub waiter_id: Option<Uuid>,
}

/// Input for adding a product line to a ticket
#[derive(Debug, serde::Deserialize)]
pub struct AddDetailInput {
    pub ticket_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
}

/// A ticket with reporting context for list views
#[derive(Debug, serde::Serialize)]
pub struct TicketWithContext {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub waiter_name: Option<String>,
    pub table_identifier: Option<String>,
}

/// A ticket line with its product name
#[derive(Debug, serde::Serialize)]
pub struct DetailWithProduct {
    #[serde(flatten)]
    pub detail: TicketDetail,
    pub product_name: Option<String>,
}

/// A ticket expanded with its lines
#[derive(Debug, serde::Serialize)]
pub struct TicketWithDetails {
    #[serde(flatten)]
    pub ticket: TicketWithContext,
    pub details: Vec<DetailWithProduct>,
    pub total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    session_id: Uuid,
    waiter_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    waiter_name: Option<String>,
    table_identifier: Option<String>,
}

impl TicketRow {
    fn into_ticket(self) -> AppResult<TicketWithContext> {
        let status = TicketStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("invalid ticket status '{}'", self.status)))?;
        Ok(TicketWithContext {
            ticket: Ticket {
                id: self.id,
                session_id: self.session_id,
                waiter_id: self.waiter_id,
                status,
                created_at: self.created_at,
            },
            waiter_name: self.waiter_name,
            table_identifier: self.table_identifier,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: Uuid,
    ticket_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
    unit_price_at_sale: Decimal,
    product_name: Option<String>,
}

impl From<DetailRow> for DetailWithProduct {
    fn from(r: DetailRow) -> Self {
        DetailWithProduct {
            detail: TicketDetail {
                id: r.id,
                ticket_id: r.ticket_id,
                product_id: r.product_id,
                quantity: r.quantity,
                unit_price_at_sale: r.unit_price_at_sale,
            },
            product_name: r.product_name,
        }
    }
}

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.session_id, t.waiter_id, t.status, t.created_at,
           u.username as waiter_name, os.table_identifier
    FROM tickets t
    LEFT JOIN users u ON u.id = t.waiter_id
    LEFT JOIN order_sessions os ON os.id = t.session_id
"#;

impl TicketService {
    pub fn new(db: PgPool, events: EventPublisher) -> Self {
        Self { db, events }
    }

    /// Create a pending ticket on an open session
    pub async fn create(&self, waiter_id: Uuid, input: CreateTicketInput) -> AppResult<Ticket> {
        let session_status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM order_sessions WHERE id = $1",
        )
        .bind(input.session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order session".to_string()))?;

        if session_status != "open" {
            return Err(AppError::InvalidStateTransition(
                "Cannot add a ticket to a closed session".to_string(),
            ));
        }

        let waiter = input.waiter_id.unwrap_or(waiter_id);
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO tickets (session_id, waiter_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, created_at
            "#,
        )
        .bind(input.session_id)
        .bind(waiter)
        .fetch_one(&self.db)
        .await?;

        let ticket = Ticket {
            id: row.0,
            session_id: input.session_id,
            waiter_id: waiter,
            status: TicketStatus::Pending,
            created_at: row.1,
        };

        self.events
            .publish(PosEvent::TicketChanged {
                session_id: ticket.session_id,
                action: "created".to_string(),
                status: Some(TicketStatus::Pending),
            })
            .await;

        Ok(ticket)
    }

    pub async fn list(&self) -> AppResult<Vec<TicketWithContext>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "{} ORDER BY t.created_at DESC",
            TICKET_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_ticket()).collect()
    }

    pub async fn get(&self, ticket_id: Uuid) -> AppResult<TicketWithContext> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("{} WHERE t.id = $1", TICKET_SELECT))
            .bind(ticket_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;

        row.into_ticket()
    }

    pub async fn get_with_details(&self, ticket_id: Uuid) -> AppResult<TicketWithDetails> {
        let ticket = self.get(ticket_id).await?;
        let details = self.details(ticket_id).await?;
        let total = details.iter().map(|d| d.detail.subtotal()).sum();

        Ok(TicketWithDetails {
            ticket,
            details,
            total,
        })
    }

    pub async fn list_by_session(&self, session_id: Uuid) -> AppResult<Vec<TicketWithDetails>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "{} WHERE t.session_id = $1 ORDER BY t.created_at DESC",
            TICKET_SELECT
        ))
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            let ticket = row.into_ticket()?;
            let details = self.details(ticket.ticket.id).await?;
            let total = details.iter().map(|d| d.detail.subtotal()).sum();
            tickets.push(TicketWithDetails {
                ticket,
                details,
                total,
            });
        }

        Ok(tickets)
    }

    /// Apply a status transition requested over the API
    pub async fn update_status(&self, ticket_id: Uuid, status: &str) -> AppResult<Ticket> {
        match TicketStatus::from_str(status) {
            Some(TicketStatus::Approved) => self.approve(ticket_id).await,
            Some(TicketStatus::Rejected) => self.reject(ticket_id).await,
            Some(TicketStatus::Pending) => Err(AppError::ValidationError(
                "Tickets cannot transition back to pending".to_string(),
            )),
            None => Err(AppError::Validation {
                field: "status".to_string(),
                message: format!("Unknown ticket status '{}'", status),
            }),
        }
    }

    /// Approve a pending ticket: validate and deduct stock for every line,
    /// then persist the status, all in one transaction.
    pub async fn approve(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        let current = self.get(ticket_id).await?.ticket;
        if !current.status.can_transition_to(TicketStatus::Approved) {
            return Err(AppError::InvalidStateTransition(format!(
                "Ticket is already {}",
                current.status.as_str()
            )));
        }

        let details = self.details(ticket_id).await?;
        let items: Vec<(Uuid, Decimal)> = details
            .iter()
            .map(|d| (d.detail.product_id, d.detail.quantity))
            .collect();

        let stock = StockService::new(self.db.clone());
        let mut tx = self.db.begin().await?;

        // Both the validation pass and the deduction happen under the row
        // locks taken here; a shortage rolls everything back.
        stock.deduct_for_sale(&mut tx, &items).await?;

        sqlx::query("UPDATE tickets SET status = 'approved' WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.events
            .publish(PosEvent::TicketChanged {
                session_id: current.session_id,
                action: "status".to_string(),
                status: Some(TicketStatus::Approved),
            })
            .await;

        Ok(Ticket {
            status: TicketStatus::Approved,
            ..current
        })
    }

    /// Reject a pending ticket. No inventory effect.
    pub async fn reject(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        let current = self.get(ticket_id).await?.ticket;
        if !current.status.can_transition_to(TicketStatus::Rejected) {
            return Err(AppError::InvalidStateTransition(format!(
                "Ticket is already {}",
                current.status.as_str()
            )));
        }

        sqlx::query("UPDATE tickets SET status = 'rejected' WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.db)
            .await?;

        self.events
            .publish(PosEvent::TicketChanged {
                session_id: current.session_id,
                action: "status".to_string(),
                status: Some(TicketStatus::Rejected),
            })
            .await;

        Ok(Ticket {
            status: TicketStatus::Rejected,
            ..current
        })
    }

    /// Delete a ticket from any state. Deleting an approved ticket does not
    /// restore its deducted stock; cancellations after approval are handled
    /// by a manual inventory adjustment.
    pub async fn delete(&self, ticket_id: Uuid) -> AppResult<()> {
        let current = self.get(ticket_id).await?.ticket;

        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.db)
            .await?;

        self.events
            .publish(PosEvent::TicketChanged {
                session_id: current.session_id,
                action: "deleted".to_string(),
                status: None,
            })
            .await;

        Ok(())
    }

    /// Add a product line, snapshotting the sale price at this moment so
    /// later product price changes cannot move the ticket's total.
    pub async fn add_detail(&self, input: AddDetailInput) -> AppResult<TicketDetail> {
        shared::validate_quantity(input.quantity)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        self.get(input.ticket_id).await?;

        let sale_price = sqlx::query_scalar::<_, Decimal>(
            "SELECT sale_price FROM products WHERE id = $1 AND active",
        )
        .bind(input.product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO ticket_details (ticket_id, product_id, quantity, unit_price_at_sale)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.ticket_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(sale_price)
        .fetch_one(&self.db)
        .await?;

        Ok(TicketDetail {
            id,
            ticket_id: input.ticket_id,
            product_id: input.product_id,
            quantity: input.quantity,
            unit_price_at_sale: sale_price,
        })
    }

    /// Edit a line's quantity. Stock is not re-validated or re-deducted on
    /// edit, even after approval; that gap is a recorded policy, not an
    /// oversight.
    pub async fn update_detail_quantity(
        &self,
        detail_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<TicketDetail> {
        shared::validate_quantity(quantity)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let row = sqlx::query_as::<_, DetailRow>(
            r#"
            UPDATE ticket_details td SET quantity = $1
            FROM products p
            WHERE td.id = $2 AND p.id = td.product_id
            RETURNING td.id, td.ticket_id, td.product_id, td.quantity,
                      td.unit_price_at_sale, p.name as product_name
            "#,
        )
        .bind(quantity)
        .bind(detail_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket detail".to_string()))?;

        Ok(DetailWithProduct::from(row).detail)
    }

    pub async fn remove_detail(&self, detail_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM ticket_details WHERE id = $1")
            .bind(detail_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Ticket detail".to_string()));
        }

        Ok(())
    }

    /// Sum of quantity × snapshotted unit price over the ticket's lines
    pub async fn ticket_total(&self, ticket_id: Uuid) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(quantity * unit_price_at_sale) FROM ticket_details WHERE ticket_id = $1",
        )
        .bind(ticket_id)
        .fetch_one(&self.db)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    async fn details(&self, ticket_id: Uuid) -> AppResult<Vec<DetailWithProduct>> {
        let rows = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT td.id, td.ticket_id, td.product_id, td.quantity, td.unit_price_at_sale,
                   p.name as product_name
            FROM ticket_details td
            LEFT JOIN products p ON p.id = td.product_id
            WHERE td.ticket_id = $1
            ORDER BY td.id
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
