//! Inventory ledger
//!
//! Direct CRUD plus the stock-adjustment entry point used for restocking
//! and manual corrections. Recipe-driven deduction lives in the stock
//! service; this one never touches tickets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::InventoryItem;

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Input for creating or replacing an inventory item
#[derive(Debug, serde::Deserialize)]
pub struct InventoryItemInput {
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Decimal,
    pub stock: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// Input for a stock adjustment: positive restocks, negative corrects
#[derive(Debug, serde::Deserialize)]
pub struct AdjustStockInput {
    pub quantity: Decimal,
}

/// An inventory item with its supplier's name for list views
#[derive(Debug, serde::Serialize)]
pub struct InventoryItemWithSupplier {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub supplier_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: Uuid,
    name: String,
    category: String,
    unit_price: Decimal,
    stock: Decimal,
    supplier_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    supplier_name: Option<String>,
}

impl From<InventoryRow> for InventoryItemWithSupplier {
    fn from(r: InventoryRow) -> Self {
        InventoryItemWithSupplier {
            item: InventoryItem {
                id: r.id,
                name: r.name,
                category: r.category,
                unit_price: r.unit_price,
                stock: r.stock,
                supplier_id: r.supplier_id,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            supplier_name: r.supplier_name,
        }
    }
}

const INVENTORY_SELECT: &str = r#"
    SELECT i.id, i.name, i.category, i.unit_price, i.stock, i.supplier_id,
           i.created_at, i.updated_at, s.name as supplier_name
    FROM inventory i
    LEFT JOIN suppliers s ON s.id = i.supplier_id
"#;

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<InventoryItemWithSupplier>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "{} ORDER BY i.name",
            INVENTORY_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get(&self, item_id: Uuid) -> AppResult<InventoryItemWithSupplier> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "{} WHERE i.id = $1",
            INVENTORY_SELECT
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(row.into())
    }

    /// Items at or below the given stock threshold, lowest first
    pub async fn low_stock(&self, threshold: Decimal) -> AppResult<Vec<InventoryItemWithSupplier>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "{} WHERE i.stock <= $1 ORDER BY i.stock ASC",
            INVENTORY_SELECT
        ))
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn create(&self, input: InventoryItemInput) -> AppResult<InventoryItemWithSupplier> {
        shared::validate_amount(input.unit_price).map_err(|e| AppError::Validation {
            field: "unit_price".to_string(),
            message: e.to_string(),
        })?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO inventory (name, category, unit_price, stock, supplier_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.category.as_deref().unwrap_or(""))
        .bind(input.unit_price)
        .bind(input.stock)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        self.get(id).await
    }

    pub async fn update(
        &self,
        item_id: Uuid,
        input: InventoryItemInput,
    ) -> AppResult<InventoryItemWithSupplier> {
        shared::validate_amount(input.unit_price).map_err(|e| AppError::Validation {
            field: "unit_price".to_string(),
            message: e.to_string(),
        })?;

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET name = $1, category = $2, unit_price = $3, stock = $4,
                supplier_id = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&input.name)
        .bind(input.category.as_deref().unwrap_or(""))
        .bind(input.unit_price)
        .bind(input.stock)
        .bind(input.supplier_id)
        .bind(item_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        self.get(item_id).await
    }

    /// Atomic stock increment: `stock = stock + quantity`. Restocks pass a
    /// positive quantity; corrections may pass a negative one.
    pub async fn adjust_stock(
        &self,
        item_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<InventoryItemWithSupplier> {
        let result = sqlx::query(
            "UPDATE inventory SET stock = stock + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(input.quantity)
        .bind(item_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        self.get(item_id).await
    }

    /// Delete an item unless a recipe line or a same-id product still
    /// references it.
    pub async fn delete(&self, item_id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM recipe_lines WHERE inventory_id = $1)
                OR EXISTS(SELECT 1 FROM products WHERE id = $1)
            "#,
        )
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "inventory".to_string(),
                message: "Inventory item is referenced by a recipe or product".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        Ok(())
    }
}
