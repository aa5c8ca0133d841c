//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustStockInput, InventoryItemInput, InventoryItemWithSupplier, InventoryService,
};
use crate::AppState;

/// Query parameters for the low-stock listing
#[derive(Debug, serde::Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<Decimal>,
}

/// List all inventory items with their suppliers
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItemWithSupplier>>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.list().await?))
}

/// Get a single inventory item
pub async fn get_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItemWithSupplier>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.get(item_id).await?))
}

/// Items at or below the reorder threshold (default 10)
pub async fn list_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<InventoryItemWithSupplier>>> {
    let threshold = query.threshold.unwrap_or_else(|| Decimal::from(10));
    let service = InventoryService::new(state.db);
    Ok(Json(service.low_stock(threshold).await?))
}

/// Create an inventory item
pub async fn create_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<InventoryItemInput>,
) -> AppResult<Json<InventoryItemWithSupplier>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.create(input).await?))
}

/// Replace an inventory item
pub async fn update_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<InventoryItemInput>,
) -> AppResult<Json<InventoryItemWithSupplier>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.update(item_id, input).await?))
}

/// Adjust an item's stock by a delta (restock or manual correction)
pub async fn adjust_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryItemWithSupplier>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.adjust_stock(item_id, input).await?))
}

/// Delete an inventory item (refused while a recipe or product references it)
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = InventoryService::new(state.db);
    service.delete(item_id).await?;
    Ok(Json(()))
}
