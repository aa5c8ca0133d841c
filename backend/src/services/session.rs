//! Table session lifecycle
//!
//! A table identifier holds at most one open session at a time (enforced by
//! a partial unique index, not just an application check); closing always
//! clears the seating tag. Reopening a table simply creates a fresh open
//! session for the same identifier.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{OrderSession, PosEvent, SessionStatus, SessionWithActivity};
use crate::services::events::EventPublisher;

#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
    events: EventPublisher,
}

/// Input for opening a table
#[derive(Debug, serde::Deserialize)]
pub struct OpenSessionInput {
    pub table_identifier: String,
    pub tag: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    table_identifier: String,
    tag: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> AppResult<OrderSession> {
        let status = SessionStatus::from_str(&self.status).ok_or_else(|| {
            AppError::Internal(format!("invalid session status '{}'", self.status))
        })?;
        Ok(OrderSession {
            id: self.id,
            table_identifier: self.table_identifier,
            tag: self.tag,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    table_identifier: String,
    tag: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    pending_tickets: i64,
    total_amount: Decimal,
}

impl SessionService {
    pub fn new(db: PgPool, events: EventPublisher) -> Self {
        Self { db, events }
    }

    /// Open a table. Conflicts when the identifier already has an open
    /// session; a previously closed identifier opens fresh with the new tag.
    pub async fn open(&self, input: OpenSessionInput) -> AppResult<OrderSession> {
        shared::validate_table_identifier(&input.table_identifier)
            .map_err(|e| AppError::Validation {
                field: "table_identifier".to_string(),
                message: e.to_string(),
            })?;

        let result = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO order_sessions (table_identifier, tag, status)
            VALUES ($1, $2, 'open')
            RETURNING id, table_identifier, tag, status, created_at
            "#,
        )
        .bind(input.table_identifier.trim())
        .bind(&input.tag)
        .fetch_one(&self.db)
        .await;

        let session = match result {
            Ok(row) => row.into_session()?,
            Err(e) if is_unique_violation(&e, "order_sessions_one_open_per_table") => {
                return Err(AppError::Conflict {
                    resource: "order_session".to_string(),
                    message: format!(
                        "Table '{}' already has an open session",
                        input.table_identifier.trim()
                    ),
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.events
            .publish(PosEvent::OrderSessionChanged {
                action: "opened".to_string(),
                session_id: Some(session.id),
                status: Some(SessionStatus::Open),
            })
            .await;

        Ok(session)
    }

    /// Close a session. The tag is cleared in the same statement; a closed
    /// table never keeps its seating tag.
    pub async fn close(&self, session_id: Uuid) -> AppResult<OrderSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE order_sessions
            SET status = 'closed', tag = NULL
            WHERE id = $1
            RETURNING id, table_identifier, tag, status, created_at
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order session".to_string()))?;

        let session = row.into_session()?;

        self.events
            .publish(PosEvent::OrderSessionChanged {
                action: "status".to_string(),
                session_id: Some(session.id),
                status: Some(SessionStatus::Closed),
            })
            .await;

        Ok(session)
    }

    /// Apply a status change requested over the API. Only closing is a
    /// status edit; reopening a table means opening a new session.
    pub async fn update_status(&self, session_id: Uuid, status: &str) -> AppResult<OrderSession> {
        match SessionStatus::from_str(status) {
            Some(SessionStatus::Closed) => self.close(session_id).await,
            Some(SessionStatus::Open) => Err(AppError::ValidationError(
                "Sessions cannot be reopened; open a new session for the table".to_string(),
            )),
            None => Err(AppError::Validation {
                field: "status".to_string(),
                message: format!("Unknown session status '{}'", status),
            }),
        }
    }

    /// Replace the seating tag of an open session
    pub async fn update_tag(&self, session_id: Uuid, tag: Option<String>) -> AppResult<OrderSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE order_sessions
            SET tag = $1
            WHERE id = $2 AND status = 'open'
            RETURNING id, table_identifier, tag, status, created_at
            "#,
        )
        .bind(&tag)
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_session(),
            None => {
                if self.exists(session_id).await? {
                    Err(AppError::InvalidStateTransition(
                        "Cannot tag a closed session".to_string(),
                    ))
                } else {
                    Err(AppError::NotFound("Order session".to_string()))
                }
            }
        }
    }

    pub async fn list(&self) -> AppResult<Vec<OrderSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, table_identifier, tag, status, created_at
            FROM order_sessions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_session()).collect()
    }

    /// Every open session with its pending-ticket count and the running
    /// total across all its tickets (pending and approved combined), for
    /// the floor view badges.
    pub async fn list_active_with_activity(&self) -> AppResult<Vec<SessionWithActivity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT os.id, os.table_identifier, os.tag, os.status, os.created_at,
                   COUNT(DISTINCT t.id) FILTER (WHERE t.status = 'pending') AS pending_tickets,
                   COALESCE(SUM(td.quantity * td.unit_price_at_sale)
                            FILTER (WHERE t.status IN ('pending', 'approved')), 0) AS total_amount
            FROM order_sessions os
            LEFT JOIN tickets t ON t.session_id = os.id
            LEFT JOIN ticket_details td ON td.ticket_id = t.id
            WHERE os.status = 'open'
            GROUP BY os.id, os.table_identifier, os.tag, os.status, os.created_at
            ORDER BY os.table_identifier
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                let session = SessionRow {
                    id: r.id,
                    table_identifier: r.table_identifier,
                    tag: r.tag,
                    status: r.status,
                    created_at: r.created_at,
                }
                .into_session()?;
                Ok(SessionWithActivity {
                    session,
                    pending_tickets: r.pending_tickets,
                    total_amount: r.total_amount,
                })
            })
            .collect()
    }

    pub async fn get(&self, session_id: Uuid) -> AppResult<OrderSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, table_identifier, tag, status, created_at
            FROM order_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order session".to_string()))?;

        row.into_session()
    }

    /// The open session currently seated at a table, if any
    pub async fn find_by_table(&self, table_identifier: &str) -> AppResult<OrderSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, table_identifier, tag, status, created_at
            FROM order_sessions
            WHERE table_identifier = $1 AND status = 'open'
            "#,
        )
        .bind(table_identifier)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Open session for table".to_string()))?;

        row.into_session()
    }

    /// Delete a session and its tickets. Refused while an invoice points at
    /// the session, since settlement records must keep their back reference.
    pub async fn delete(&self, session_id: Uuid) -> AppResult<()> {
        let invoiced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE session_id = $1)",
        )
        .bind(session_id)
        .fetch_one(&self.db)
        .await?;

        if invoiced {
            return Err(AppError::Conflict {
                resource: "order_session".to_string(),
                message: "Session has an invoice and cannot be deleted".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM order_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Order session".to_string()));
        }

        self.events
            .publish(PosEvent::OrderSessionChanged {
                action: "deleted".to_string(),
                session_id: Some(session_id),
                status: None,
            })
            .await;

        Ok(())
    }

    async fn exists(&self, session_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM order_sessions WHERE id = $1)",
        )
        .bind(session_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }
}
