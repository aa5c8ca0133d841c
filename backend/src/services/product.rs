//! Sellable products and recipe management
//!
//! A product created "from inventory" reuses the inventory row's id; that
//! shared identity is what lets a recipe-less product deduct its own stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{Product, RecipeLine};

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product. `from_inventory_id` reuses that inventory
/// row's id, marking the product as a direct sellable.
#[derive(Debug, serde::Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub sale_price: Decimal,
    pub active: Option<bool>,
    pub from_inventory_id: Option<Uuid>,
}

/// Input for updating a product
#[derive(Debug, serde::Deserialize)]
pub struct UpdateProductInput {
    pub name: String,
    pub sale_price: Decimal,
    pub active: bool,
}

/// Input for one recipe line
#[derive(Debug, serde::Deserialize)]
pub struct RecipeLineInput {
    pub inventory_id: Uuid,
    pub quantity_required: Decimal,
    pub unit_measure: String,
}

/// A recipe line joined with its ingredient's live stock for the recipe
/// editor view
#[derive(Debug, serde::Serialize)]
pub struct RecipeLineWithIngredient {
    #[serde(flatten)]
    pub line: RecipeLine,
    pub ingredient_name: String,
    pub ingredient_stock: Decimal,
    pub ingredient_category: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    sale_price: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            sale_price: r.sale_price,
            active: r.active,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeLineJoinRow {
    id: Uuid,
    product_id: Uuid,
    inventory_id: Uuid,
    quantity_required: Decimal,
    unit_measure: String,
    ingredient_name: String,
    ingredient_stock: Decimal,
    ingredient_category: String,
}

impl From<RecipeLineJoinRow> for RecipeLineWithIngredient {
    fn from(r: RecipeLineJoinRow) -> Self {
        RecipeLineWithIngredient {
            line: RecipeLine {
                id: r.id,
                product_id: r.product_id,
                inventory_id: r.inventory_id,
                quantity_required: r.quantity_required,
                unit_measure: r.unit_measure,
            },
            ingredient_name: r.ingredient_name,
            ingredient_stock: r.ingredient_stock,
            ingredient_category: r.ingredient_category,
        }
    }
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, sale_price, active, created_at FROM products ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, sale_price, active, created_at FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        shared::validate_amount(input.sale_price).map_err(|e| AppError::Validation {
            field: "sale_price".to_string(),
            message: e.to_string(),
        })?;

        let active = input.active.unwrap_or(true);

        let row = match input.from_inventory_id {
            Some(inventory_id) => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM inventory WHERE id = $1)",
                )
                .bind(inventory_id)
                .fetch_one(&self.db)
                .await?;

                if !exists {
                    return Err(AppError::NotFound("Inventory item".to_string()));
                }

                let result = sqlx::query_as::<_, ProductRow>(
                    r#"
                    INSERT INTO products (id, name, sale_price, active)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, name, sale_price, active, created_at
                    "#,
                )
                .bind(inventory_id)
                .bind(&input.name)
                .bind(input.sale_price)
                .bind(active)
                .fetch_one(&self.db)
                .await;

                match result {
                    Ok(row) => row,
                    Err(e) if is_unique_violation(&e, "products_pkey") => {
                        return Err(AppError::DuplicateEntry("product".to_string()));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    INSERT INTO products (name, sale_price, active)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, sale_price, active, created_at
                    "#,
                )
                .bind(&input.name)
                .bind(input.sale_price)
                .bind(active)
                .fetch_one(&self.db)
                .await?
            }
        };

        Ok(row.into())
    }

    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        shared::validate_amount(input.sale_price).map_err(|e| AppError::Validation {
            field: "sale_price".to_string(),
            message: e.to_string(),
        })?;

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = $1, sale_price = $2, active = $3
            WHERE id = $4
            RETURNING id, name, sale_price, active, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.sale_price)
        .bind(input.active)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Retire a product from the menu. Rows are kept because invoiced
    /// ticket lines reference them.
    pub async fn deactivate(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE products SET active = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    pub async fn recipe(&self, product_id: Uuid) -> AppResult<Vec<RecipeLineWithIngredient>> {
        let rows = sqlx::query_as::<_, RecipeLineJoinRow>(
            r#"
            SELECT rl.id, rl.product_id, rl.inventory_id, rl.quantity_required, rl.unit_measure,
                   i.name as ingredient_name, i.stock as ingredient_stock,
                   i.category as ingredient_category
            FROM recipe_lines rl
            JOIN inventory i ON i.id = rl.inventory_id
            WHERE rl.product_id = $1
            ORDER BY rl.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Attach an ingredient to a product's recipe. Each ingredient may
    /// appear once per product.
    pub async fn add_recipe_line(
        &self,
        product_id: Uuid,
        input: RecipeLineInput,
    ) -> AppResult<RecipeLine> {
        shared::validate_recipe_line(input.quantity_required, &input.unit_measure)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        self.get(product_id).await?;

        let ingredient_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory WHERE id = $1)",
        )
        .bind(input.inventory_id)
        .fetch_one(&self.db)
        .await?;

        if !ingredient_exists {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO recipe_lines (product_id, inventory_id, quantity_required, unit_measure)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(input.inventory_id)
        .bind(input.quantity_required)
        .bind(&input.unit_measure)
        .fetch_one(&self.db)
        .await;

        let id = match result {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e, "recipe_lines_unique_ingredient") => {
                return Err(AppError::DuplicateEntry("recipe ingredient".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(RecipeLine {
            id,
            product_id,
            inventory_id: input.inventory_id,
            quantity_required: input.quantity_required,
            unit_measure: input.unit_measure,
        })
    }

    pub async fn update_recipe_line(
        &self,
        line_id: Uuid,
        input: RecipeLineInput,
    ) -> AppResult<RecipeLine> {
        shared::validate_recipe_line(input.quantity_required, &input.unit_measure)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let result = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            UPDATE recipe_lines
            SET inventory_id = $1, quantity_required = $2, unit_measure = $3
            WHERE id = $4
            RETURNING id, product_id
            "#,
        )
        .bind(input.inventory_id)
        .bind(input.quantity_required)
        .bind(&input.unit_measure)
        .bind(line_id)
        .fetch_optional(&self.db)
        .await;

        let (id, product_id) = match result {
            Ok(Some(row)) => row,
            Ok(None) => return Err(AppError::NotFound("Recipe line".to_string())),
            Err(e) if is_unique_violation(&e, "recipe_lines_unique_ingredient") => {
                return Err(AppError::DuplicateEntry("recipe ingredient".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(RecipeLine {
            id,
            product_id,
            inventory_id: input.inventory_id,
            quantity_required: input.quantity_required,
            unit_measure: input.unit_measure,
        })
    }

    pub async fn remove_recipe_line(&self, line_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM recipe_lines WHERE id = $1")
            .bind(line_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe line".to_string()));
        }

        Ok(())
    }

    /// Drop a product's whole recipe, turning it back into a direct sellable
    pub async fn clear_recipe(&self, product_id: Uuid) -> AppResult<()> {
        self.get(product_id).await?;

        sqlx::query("DELETE FROM recipe_lines WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
