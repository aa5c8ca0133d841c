//! Sellable products and their recipes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable product on the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Shares identity space with `InventoryItem` when the product was
    /// created "from inventory" (a direct sellable).
    pub id: Uuid,
    pub name: String,
    pub sale_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// One ingredient of a composed product's recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub inventory_id: Uuid,
    /// Quantity consumed per one unit of product sold
    pub quantity_required: Decimal,
    pub unit_measure: String,
}

/// How a product maps onto inventory, resolved once per sale line.
///
/// A product with no recipe lines deducts from the inventory item sharing
/// its id; a product with recipe lines deducts from each ingredient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SellableItem {
    Direct { inventory_id: Uuid },
    Composed { product_id: Uuid, lines: Vec<RecipeLine> },
}

impl SellableItem {
    pub fn is_direct(&self) -> bool {
        matches!(self, SellableItem::Direct { .. })
    }

    /// The inventory rows this sellable touches, with the quantity each
    /// consumes per unit sold.
    pub fn requirements(&self) -> Vec<(Uuid, Decimal)> {
        match self {
            SellableItem::Direct { inventory_id } => vec![(*inventory_id, Decimal::ONE)],
            SellableItem::Composed { lines, .. } => lines
                .iter()
                .map(|l| (l.inventory_id, l.quantity_required))
                .collect(),
        }
    }
}
