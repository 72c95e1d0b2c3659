//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock_ledger::{
    AdjustStockInput, CountStockInput, CreateStockLevelInput, MovementFilter, StockAdjustment,
    StockCount, StockLedgerService, StockLevelFilter, StockLevelView, StockMovement,
    StockTransfer, TransferStockInput, UpdateStockLevelInput,
};
use crate::AppState;

/// Adjust stock by a signed quantity change
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockAdjustment>> {
    let service = StockLedgerService::new(state.db);
    let adjustment = service.adjust(input).await?;
    Ok(Json(adjustment))
}

/// Transfer stock between warehouses
pub async fn transfer_stock(
    State(state): State<AppState>,
    Json(input): Json<TransferStockInput>,
) -> AppResult<Json<StockTransfer>> {
    let service = StockLedgerService::new(state.db);
    let transfer = service.transfer(input).await?;
    Ok(Json(transfer))
}

/// Reconcile a stock level against a physical count
pub async fn count_stock(
    State(state): State<AppState>,
    Json(input): Json<CountStockInput>,
) -> AppResult<Json<StockCount>> {
    let service = StockLedgerService::new(state.db);
    let count = service.count(input).await?;
    Ok(Json(count))
}

/// List stock levels with optional filtering
pub async fn list_stock_levels(
    State(state): State<AppState>,
    Query(filter): Query<StockLevelFilter>,
) -> AppResult<Json<Vec<StockLevelView>>> {
    let service = StockLedgerService::new(state.db);
    let levels = service.list_stock_levels(&filter).await?;
    Ok(Json(levels))
}

/// Create a stock level row explicitly
pub async fn create_stock_level(
    State(state): State<AppState>,
    Json(input): Json<CreateStockLevelInput>,
) -> AppResult<(StatusCode, Json<StockLevelView>)> {
    let service = StockLedgerService::new(state.db);
    let level = service.create_stock_level(input).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

/// Get a stock level by id
pub async fn get_stock_level(
    State(state): State<AppState>,
    Path(level_id): Path<Uuid>,
) -> AppResult<Json<StockLevelView>> {
    let service = StockLedgerService::new(state.db);
    let level = service.get_stock_level(level_id).await?;
    Ok(Json(level))
}

/// Update a stock level's reorder thresholds
pub async fn update_stock_level(
    State(state): State<AppState>,
    Path(level_id): Path<Uuid>,
    Json(input): Json<UpdateStockLevelInput>,
) -> AppResult<Json<StockLevelView>> {
    let service = StockLedgerService::new(state.db);
    let level = service.update_stock_level(level_id, input).await?;
    Ok(Json(level))
}

/// List levels at or below their reorder point
pub async fn low_stock_levels(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockLevelView>>> {
    let service = StockLedgerService::new(state.db);
    let levels = service.low_stock_levels().await?;
    Ok(Json(levels))
}

/// List stock movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockLedgerService::new(state.db);
    let movements = service.list_movements(&filter).await?;
    Ok(Json(movements))
}
