//! Inventory ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked item: either an ingredient consumed by recipes or a directly
/// sellable unit (bottled beer, canned soda).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    /// Current stock on hand. Never goes negative through a successful
    /// deduction; adjustments may correct it in either direction.
    pub stock: Decimal,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shortage detected while validating stock for a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortage {
    pub ingredient_name: String,
    pub available: Decimal,
    pub required: Decimal,
    pub unit_measure: String,
}

/// Result of a stock check across every ingredient of a sale line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCheck {
    pub has_stock: bool,
    /// Every failing ingredient, so callers can report all shortages at once
    pub insufficient_stock: Vec<Shortage>,
}

impl StockCheck {
    pub fn sufficient() -> Self {
        Self {
            has_stock: true,
            insufficient_stock: Vec::new(),
        }
    }

    pub fn from_shortages(insufficient_stock: Vec<Shortage>) -> Self {
        Self {
            has_stock: insufficient_stock.is_empty(),
            insufficient_stock,
        }
    }
}
