//! HTTP handlers for products and recipes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Product, RecipeLine, StockCheck};
use crate::services::product::{
    CreateProductInput, ProductService, RecipeLineInput, RecipeLineWithIngredient,
    UpdateProductInput,
};
use crate::services::stock::StockService;
use crate::AppState;

/// Query parameters for a stock check
#[derive(Debug, serde::Deserialize)]
pub struct StockCheckQuery {
    pub quantity: Option<Decimal>,
}

/// List all products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.list().await?))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.get(product_id).await?))
}

/// Create a product, optionally from an existing inventory item
pub async fn create_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.create(input).await?))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.update(product_id, input).await?))
}

/// Retire a product from the menu
pub async fn deactivate_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service.deactivate(product_id).await?;
    Ok(Json(()))
}

/// Check whether stock covers a sale of the product at the given quantity.
/// Reports every failing ingredient.
pub async fn check_product_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<StockCheckQuery>,
) -> AppResult<Json<StockCheck>> {
    let quantity = query.quantity.unwrap_or(Decimal::ONE);
    let service = StockService::new(state.db);
    Ok(Json(service.check_stock(product_id, quantity).await?))
}

/// List a product's recipe with live ingredient stock
pub async fn get_recipe(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<RecipeLineWithIngredient>>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.recipe(product_id).await?))
}

/// Attach an ingredient to a product's recipe
pub async fn add_recipe_line(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<RecipeLineInput>,
) -> AppResult<Json<RecipeLine>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.add_recipe_line(product_id, input).await?))
}

/// Update a recipe line
pub async fn update_recipe_line(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
    Json(input): Json<RecipeLineInput>,
) -> AppResult<Json<RecipeLine>> {
    let service = ProductService::new(state.db);
    Ok(Json(service.update_recipe_line(line_id, input).await?))
}

/// Remove a recipe line
pub async fn remove_recipe_line(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service.remove_recipe_line(line_id).await?;
    Ok(Json(()))
}

/// Drop a product's whole recipe
pub async fn clear_recipe(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductService::new(state.db);
    service.clear_recipe(product_id).await?;
    Ok(Json(()))
}
