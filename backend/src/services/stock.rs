//! Recipe resolution and stock validation
//!
//! A product with no recipe lines is a direct sellable: it deducts from the
//! inventory item sharing its id. A product with recipe lines deducts from
//! each ingredient. Both shapes resolve once into a `SellableItem` instead
//! of being re-inferred at every touch point.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{RecipeLine, SellableItem, Shortage, StockCheck};

/// Stock service: recipe resolution, availability checks, and the locked
/// deduction pass used by ticket approval
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Row for recipe lookup
#[derive(Debug, sqlx::FromRow)]
struct RecipeLineRow {
    id: Uuid,
    product_id: Uuid,
    inventory_id: Uuid,
    quantity_required: Decimal,
    unit_measure: String,
}

impl From<RecipeLineRow> for RecipeLine {
    fn from(r: RecipeLineRow) -> Self {
        RecipeLine {
            id: r.id,
            product_id: r.product_id,
            inventory_id: r.inventory_id,
            quantity_required: r.quantity_required,
            unit_measure: r.unit_measure,
        }
    }
}

/// Row for recipe lookup joined with live ingredient stock
#[derive(Debug, sqlx::FromRow)]
struct RecipeStockRow {
    inventory_id: Uuid,
    quantity_required: Decimal,
    unit_measure: String,
    ingredient_name: String,
    stock: Decimal,
}

/// One inventory row a sale needs, with the total quantity it consumes.
/// Requirements keep the order in which the caller's lines first touched
/// them so shortage reporting stays deterministic.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub inventory_id: Uuid,
    pub required: Decimal,
    pub unit_measure: String,
    /// Readable name when the inventory row is missing (direct products)
    pub fallback_name: String,
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve how a product maps onto inventory. Empty recipe means the
    /// product is itself a direct inventory item.
    pub async fn resolve(&self, product_id: Uuid) -> AppResult<SellableItem> {
        let rows = sqlx::query_as::<_, RecipeLineRow>(
            r#"
            SELECT id, product_id, inventory_id, quantity_required, unit_measure
            FROM recipe_lines
            WHERE product_id = $1
            ORDER BY id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            Ok(SellableItem::Direct {
                inventory_id: product_id,
            })
        } else {
            Ok(SellableItem::Composed {
                product_id,
                lines: rows.into_iter().map(|r| r.into()).collect(),
            })
        }
    }

    /// Check whether the ledger can cover `quantity` units of a product.
    ///
    /// Collects every failing ingredient, not just the first, so callers can
    /// report all shortages at once. Read-only; the approval path re-checks
    /// under row locks before deducting.
    pub async fn check_stock(&self, product_id: Uuid, quantity: Decimal) -> AppResult<StockCheck> {
        let rows = sqlx::query_as::<_, RecipeStockRow>(
            r#"
            SELECT rl.inventory_id, rl.quantity_required, rl.unit_measure,
                   i.name as ingredient_name, i.stock
            FROM recipe_lines rl
            JOIN inventory i ON i.id = rl.inventory_id
            WHERE rl.product_id = $1
            ORDER BY rl.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        if rows.is_empty() {
            return self.check_direct_stock(product_id, quantity).await;
        }

        let mut insufficient = Vec::new();
        for row in rows {
            let required = row.quantity_required * quantity;
            if row.stock < required {
                insufficient.push(Shortage {
                    ingredient_name: row.ingredient_name,
                    available: row.stock,
                    required,
                    unit_measure: row.unit_measure,
                });
            }
        }

        Ok(StockCheck::from_shortages(insufficient))
    }

    /// Direct products compare their own inventory row against the sale
    /// quantity. A missing inventory row counts as zero available.
    async fn check_direct_stock(&self, product_id: Uuid, quantity: Decimal) -> AppResult<StockCheck> {
        let row = sqlx::query_as::<_, (String, Option<Decimal>)>(
            r#"
            SELECT p.name, i.stock
            FROM products p
            LEFT JOIN inventory i ON i.id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let (name, stock) = row;
        let available = stock.unwrap_or(Decimal::ZERO);

        if available < quantity {
            Ok(StockCheck::from_shortages(vec![Shortage {
                ingredient_name: name,
                available,
                required: quantity,
                unit_measure: "unit".to_string(),
            }]))
        } else {
            Ok(StockCheck::sufficient())
        }
    }

    /// Validate and deduct stock for a set of sale lines inside one
    /// transaction.
    ///
    /// Every inventory row the sale touches is locked with
    /// `SELECT ... FOR UPDATE` in ascending-id order, stock is re-checked
    /// under the lock, and only then deducted, so two concurrent approvals
    /// cannot both pass a stale check. The first shortage (in sale-line
    /// order) aborts the whole transaction; nothing is deducted.
    pub async fn deduct_for_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[(Uuid, Decimal)],
    ) -> AppResult<()> {
        let requirements = self.collect_requirements(tx, items).await?;

        // Lock in ascending id order so concurrent approvals touching the
        // same ingredients cannot deadlock.
        let mut lock_order: Vec<usize> = (0..requirements.len()).collect();
        lock_order.sort_by_key(|&i| requirements[i].inventory_id);

        let mut locked: Vec<Option<(String, Decimal)>> = vec![None; requirements.len()];
        for &i in &lock_order {
            let row = sqlx::query_as::<_, (String, Decimal)>(
                "SELECT name, stock FROM inventory WHERE id = $1 FOR UPDATE",
            )
            .bind(requirements[i].inventory_id)
            .fetch_optional(&mut **tx)
            .await?;
            locked[i] = row;
        }

        // Verify in first-touched order; report the first failing ingredient.
        for (req, lock) in requirements.iter().zip(locked.iter()) {
            let (name, available) = match lock {
                Some((name, stock)) => (name.clone(), *stock),
                None => (req.fallback_name.clone(), Decimal::ZERO),
            };
            if available < req.required {
                return Err(AppError::InsufficientStock {
                    ingredient: name,
                    available,
                    required: req.required,
                    unit_measure: req.unit_measure.clone(),
                });
            }
        }

        for req in &requirements {
            sqlx::query(
                "UPDATE inventory SET stock = stock - $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(req.required)
            .bind(req.inventory_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Fold sale lines into per-inventory-row requirements. Two lines
    /// consuming the same ingredient add up; the earliest touch keeps its
    /// position for shortage reporting.
    async fn collect_requirements(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[(Uuid, Decimal)],
    ) -> AppResult<Vec<Requirement>> {
        let mut requirements: Vec<Requirement> = Vec::new();

        for &(product_id, quantity) in items {
            let lines = sqlx::query_as::<_, RecipeLineRow>(
                r#"
                SELECT id, product_id, inventory_id, quantity_required, unit_measure
                FROM recipe_lines
                WHERE product_id = $1
                ORDER BY id
                "#,
            )
            .bind(product_id)
            .fetch_all(&mut **tx)
            .await?;

            if lines.is_empty() {
                let name =
                    sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
                        .bind(product_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

                add_requirement(&mut requirements, product_id, quantity, "unit", name);
            } else {
                for line in lines {
                    add_requirement(
                        &mut requirements,
                        line.inventory_id,
                        line.quantity_required * quantity,
                        &line.unit_measure,
                        String::new(),
                    );
                }
            }
        }

        Ok(requirements)
    }
}

fn add_requirement(
    requirements: &mut Vec<Requirement>,
    inventory_id: Uuid,
    required: Decimal,
    unit_measure: &str,
    fallback_name: String,
) {
    match requirements
        .iter_mut()
        .find(|r| r.inventory_id == inventory_id)
    {
        Some(existing) => existing.required += required,
        None => requirements.push(Requirement {
            inventory_id,
            required,
            unit_measure: unit_measure.to_string(),
            fallback_name,
        }),
    }
}
