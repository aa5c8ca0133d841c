//! Cash drawer sessions
//!
//! One register for the whole floor: at most one cash session is open at a
//! time, enforced by a partial unique index rather than an in-memory
//! "current session" singleton. Closing computes the expected drawer
//! contents from the cash-method invoices linked to the session.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{CashSession, CashSessionStatus, CashSessionSummary, PosEvent};
use crate::services::events::EventPublisher;

#[derive(Clone)]
pub struct CashSessionService {
    db: PgPool,
    events: EventPublisher,
}

/// Input for opening the drawer. The user defaults to the caller.
#[derive(Debug, serde::Deserialize)]
pub struct OpenCashSessionInput {
    pub user_id: Option<Uuid>,
    pub opening_balance: Option<Decimal>,
}

/// Input for closing the drawer. `total_expected` overrides the computed
/// figure when the caller has already reconciled.
#[derive(Debug, serde::Deserialize)]
pub struct CloseCashSessionInput {
    pub closing_balance: Option<Decimal>,
    pub total_expected: Option<Decimal>,
}

#[derive(Debug, sqlx::FromRow)]
struct CashSessionRow {
    id: Uuid,
    user_id: Uuid,
    opening_balance: Decimal,
    closing_balance: Option<Decimal>,
    total_expected: Option<Decimal>,
    status: String,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl CashSessionRow {
    fn into_session(self) -> AppResult<CashSession> {
        let status = CashSessionStatus::from_str(&self.status).ok_or_else(|| {
            AppError::Internal(format!("invalid cash session status '{}'", self.status))
        })?;
        Ok(CashSession {
            id: self.id,
            user_id: self.user_id,
            opening_balance: self.opening_balance,
            closing_balance: self.closing_balance,
            total_expected: self.total_expected,
            status,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
        })
    }
}

const CASH_SELECT: &str = r#"
    SELECT id, user_id, opening_balance, closing_balance, total_expected,
           status, opened_at, closed_at
    FROM cash_sessions
"#;

impl CashSessionService {
    pub fn new(db: PgPool, events: EventPublisher) -> Self {
        Self { db, events }
    }

    /// Open the drawer. Conflicts when any cash session is already open;
    /// the partial unique index catches the race two concurrent opens lose.
    pub async fn open(&self, caller_id: Uuid, input: OpenCashSessionInput) -> AppResult<CashSession> {
        let opening_balance = input.opening_balance.ok_or_else(|| AppError::Validation {
            field: "opening_balance".to_string(),
            message: "opening_balance is required".to_string(),
        })?;
        shared::validate_balance(opening_balance).map_err(|e| AppError::Validation {
            field: "opening_balance".to_string(),
            message: e.to_string(),
        })?;

        let user_id = input.user_id.unwrap_or(caller_id);

        if self.find_open().await?.is_some() {
            return Err(AppError::Conflict {
                resource: "cash_session".to_string(),
                message: "A cash session is already open".to_string(),
            });
        }

        let result = sqlx::query_as::<_, CashSessionRow>(
            r#"
            INSERT INTO cash_sessions (user_id, opening_balance, status)
            VALUES ($1, $2, 'open')
            RETURNING id, user_id, opening_balance, closing_balance, total_expected,
                      status, opened_at, closed_at
            "#,
        )
        .bind(user_id)
        .bind(opening_balance)
        .fetch_one(&self.db)
        .await;

        let session = match result {
            Ok(row) => row.into_session()?,
            Err(e) if is_unique_violation(&e, "cash_sessions_single_open") => {
                return Err(AppError::Conflict {
                    resource: "cash_session".to_string(),
                    message: "A cash session is already open".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.events
            .publish(PosEvent::CashSessionChanged {
                action: "opened".to_string(),
                session_id: session.id,
            })
            .await;

        Ok(session)
    }

    /// Close the drawer, fixing the counted balance and the expected total.
    pub async fn close(
        &self,
        session_id: Uuid,
        input: CloseCashSessionInput,
    ) -> AppResult<CashSession> {
        let closing_balance = input.closing_balance.ok_or_else(|| AppError::Validation {
            field: "closing_balance".to_string(),
            message: "closing_balance is required".to_string(),
        })?;
        shared::validate_balance(closing_balance).map_err(|e| AppError::Validation {
            field: "closing_balance".to_string(),
            message: e.to_string(),
        })?;

        let session = self.get(session_id).await?;
        if session.status == CashSessionStatus::Closed {
            return Err(AppError::InvalidStateTransition(
                "Cash session is already closed".to_string(),
            ));
        }

        let total_expected = match input.total_expected {
            Some(expected) => expected,
            None => session.opening_balance + self.cash_sales(session_id).await?,
        };

        let row = sqlx::query_as::<_, CashSessionRow>(
            r#"
            UPDATE cash_sessions
            SET status = 'closed',
                closing_balance = $1,
                total_expected = $2,
                closed_at = NOW()
            WHERE id = $3
            RETURNING id, user_id, opening_balance, closing_balance, total_expected,
                      status, opened_at, closed_at
            "#,
        )
        .bind(closing_balance)
        .bind(total_expected)
        .bind(session_id)
        .fetch_one(&self.db)
        .await?;

        let session = row.into_session()?;

        self.events
            .publish(PosEvent::CashSessionChanged {
                action: "closed".to_string(),
                session_id: session.id,
            })
            .await;

        Ok(session)
    }

    /// Pre-close reconciliation figures for the drawer UI
    pub async fn summary(&self, session_id: Uuid) -> AppResult<CashSessionSummary> {
        let session = self.get(session_id).await?;
        let cash_sales = self.cash_sales(session_id).await?;

        Ok(CashSessionSummary {
            opening_balance: session.opening_balance,
            cash_sales,
            total_expected: session.opening_balance + cash_sales,
        })
    }

    pub async fn list(&self) -> AppResult<Vec<CashSession>> {
        let rows = sqlx::query_as::<_, CashSessionRow>(&format!(
            "{} ORDER BY opened_at DESC",
            CASH_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_session()).collect()
    }

    pub async fn get(&self, session_id: Uuid) -> AppResult<CashSession> {
        let row = sqlx::query_as::<_, CashSessionRow>(&format!("{} WHERE id = $1", CASH_SELECT))
            .bind(session_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Cash session".to_string()))?;

        row.into_session()
    }

    /// The single open drawer session, if any
    pub async fn find_open(&self) -> AppResult<Option<CashSession>> {
        let row = sqlx::query_as::<_, CashSessionRow>(&format!(
            "{} WHERE status = 'open' ORDER BY opened_at DESC",
            CASH_SELECT
        ))
        .fetch_optional(&self.db)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    pub async fn find_open_by_user(&self, user_id: Uuid) -> AppResult<Vec<CashSession>> {
        let rows = sqlx::query_as::<_, CashSessionRow>(&format!(
            "{} WHERE user_id = $1 AND status = 'open' ORDER BY opened_at DESC",
            CASH_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_session()).collect()
    }

    /// Sum of cash-method invoice totals linked to this drawer session
    async fn cash_sales(&self, session_id: Uuid) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT SUM(total_amount)
            FROM invoices
            WHERE cash_session_id = $1 AND payment_method = 'cash'
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.db)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }
}
