//! Invoice and settlement models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an invoice was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "transfer" => Some(PaymentMethod::Transfer),
            _ => None,
        }
    }
}

/// The settlement record for a table session. At most one per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub session_id: Uuid,
    pub cashier_id: Uuid,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Set for cash payments so the drawer reconciliation can find them
    pub cash_session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One row of the sales report: a day's takings for one payment method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReportRow {
    pub date: chrono::NaiveDate,
    pub invoice_count: i64,
    pub total_sales: Decimal,
    pub payment_method: PaymentMethod,
}
