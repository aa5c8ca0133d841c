//! Invoice generation and settlement
//!
//! Generating an invoice closes its table session in the same transaction.
//! Idempotency rides on the unique constraint over `invoices.session_id`:
//! a duplicate call finds the existing row and returns it instead of
//! inserting a second one.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Invoice, PaymentMethod, PosEvent, SalesReportRow, SessionStatus};
use crate::services::events::EventPublisher;

#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    events: EventPublisher,
}

/// Input for generating an invoice. The caller supplies the total (summed
/// from the session's ticket lines); the engine does not recompute it.
#[derive(Debug, serde::Deserialize)]
pub struct GenerateInvoiceInput {
    pub session_id: Option<Uuid>,
    pub total_amount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub cashier_id: Option<Uuid>,
    pub cash_session_id: Option<Uuid>,
}

/// An invoice with reporting context for list views
#[derive(Debug, Serialize)]
pub struct InvoiceWithContext {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub cashier_name: Option<String>,
    pub table_identifier: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    session_id: Uuid,
    cashier_id: Uuid,
    total_amount: Decimal,
    payment_method: String,
    cash_session_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    cashier_name: Option<String>,
    table_identifier: Option<String>,
}

impl InvoiceRow {
    fn into_invoice(self) -> AppResult<InvoiceWithContext> {
        let payment_method = PaymentMethod::from_str(&self.payment_method).ok_or_else(|| {
            AppError::Internal(format!("invalid payment method '{}'", self.payment_method))
        })?;
        Ok(InvoiceWithContext {
            invoice: Invoice {
                id: self.id,
                session_id: self.session_id,
                cashier_id: self.cashier_id,
                total_amount: self.total_amount,
                payment_method,
                cash_session_id: self.cash_session_id,
                created_at: self.created_at,
            },
            cashier_name: self.cashier_name,
            table_identifier: self.table_identifier,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    date: NaiveDate,
    invoice_count: i64,
    total_sales: Decimal,
    payment_method: String,
}

const INVOICE_SELECT: &str = r#"
    SELECT i.id, i.session_id, i.cashier_id, i.total_amount, i.payment_method,
           i.cash_session_id, i.created_at,
           u.username as cashier_name, os.table_identifier
    FROM invoices i
    LEFT JOIN users u ON u.id = i.cashier_id
    LEFT JOIN order_sessions os ON os.id = i.session_id
"#;

impl InvoiceService {
    pub fn new(db: PgPool, events: EventPublisher) -> Self {
        Self { db, events }
    }

    /// Create the invoice for a session and close the session, atomically.
    ///
    /// Retrying with the same session id returns the invoice created by the
    /// first call; the session stays closed either way.
    pub async fn generate(&self, cashier_id: Uuid, input: GenerateInvoiceInput) -> AppResult<Invoice> {
        let session_id = input.session_id.ok_or_else(|| AppError::Validation {
            field: "session_id".to_string(),
            message: "session_id is required".to_string(),
        })?;
        let total_amount = input.total_amount.ok_or_else(|| AppError::Validation {
            field: "total_amount".to_string(),
            message: "total_amount is required".to_string(),
        })?;
        shared::validate_amount(total_amount).map_err(|e| AppError::Validation {
            field: "total_amount".to_string(),
            message: e.to_string(),
        })?;

        let cashier = input.cashier_id.unwrap_or(cashier_id);
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO invoices (session_id, cashier_id, total_amount, payment_method, cash_session_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id) DO NOTHING
            RETURNING id, created_at
            "#,
        )
        .bind(session_id)
        .bind(cashier)
        .bind(total_amount)
        .bind(input.payment_method.as_str())
        .bind(input.cash_session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let invoice = match inserted {
            Some((id, created_at)) => Invoice {
                id,
                session_id,
                cashier_id: cashier,
                total_amount,
                payment_method: input.payment_method,
                cash_session_id: input.cash_session_id,
                created_at,
            },
            // Duplicate call: hand back the row the first call created.
            None => {
                let row = sqlx::query_as::<_, InvoiceRow>(&format!(
                    "{} WHERE i.session_id = $1",
                    INVOICE_SELECT
                ))
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?;
                row.into_invoice()?.invoice
            }
        };

        let closed = sqlx::query("UPDATE order_sessions SET status = 'closed', tag = NULL WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        if closed.rows_affected() == 0 {
            return Err(AppError::NotFound("Order session".to_string()));
        }

        tx.commit().await?;

        self.events
            .publish(PosEvent::InvoiceCreated {
                session_id,
                invoice_id: invoice.id,
            })
            .await;
        self.events
            .publish(PosEvent::OrderSessionChanged {
                action: "status".to_string(),
                session_id: Some(session_id),
                status: Some(SessionStatus::Closed),
            })
            .await;

        Ok(invoice)
    }

    pub async fn list(&self) -> AppResult<Vec<InvoiceWithContext>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} ORDER BY i.created_at DESC",
            INVOICE_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_invoice()).collect()
    }

    pub async fn get(&self, invoice_id: Uuid) -> AppResult<InvoiceWithContext> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE i.id = $1", INVOICE_SELECT))
            .bind(invoice_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        row.into_invoice()
    }

    pub async fn find_by_session(&self, session_id: Uuid) -> AppResult<InvoiceWithContext> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE i.session_id = $1",
            INVOICE_SELECT
        ))
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice for session".to_string()))?;

        row.into_invoice()
    }

    pub async fn delete(&self, invoice_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }

        Ok(())
    }

    /// Daily takings per payment method over a date range
    pub async fn sales_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<SalesReportRow>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT DATE(created_at) as date,
                   COUNT(*) as invoice_count,
                   SUM(total_amount) as total_sales,
                   payment_method
            FROM invoices
            WHERE DATE(created_at) BETWEEN $1 AND $2
            GROUP BY DATE(created_at), payment_method
            ORDER BY date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                let payment_method = PaymentMethod::from_str(&r.payment_method).ok_or_else(|| {
                    AppError::Internal(format!("invalid payment method '{}'", r.payment_method))
                })?;
                Ok(SalesReportRow {
                    date: r.date,
                    invoice_count: r.invoice_count,
                    total_sales: r.total_sales,
                    payment_method,
                })
            })
            .collect()
    }

    /// Serialize report rows as CSV for download
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))?;

        Ok(csv_data)
    }
}
