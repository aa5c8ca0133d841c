//! Cash drawer session models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a cash drawer session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CashSessionStatus {
    Open,
    Closed,
}

impl CashSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashSessionStatus::Open => "open",
            CashSessionStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(CashSessionStatus::Open),
            "closed" => Some(CashSessionStatus::Closed),
            _ => None,
        }
    }
}

/// One cash drawer shift. The register is global: at most one session is
/// open at any time even though each is keyed by the opening user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub opening_balance: Decimal,
    /// Counted cash at close; null while the session is open
    pub closing_balance: Option<Decimal>,
    /// opening_balance + cash-method invoice totals, fixed at close
    pub total_expected: Option<Decimal>,
    pub status: CashSessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Pre-close reconciliation figures for the drawer UI. The discrepancy
/// (counted − expected) is display-only and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSessionSummary {
    pub opening_balance: Decimal,
    pub cash_sales: Decimal,
    pub total_expected: Decimal,
}
