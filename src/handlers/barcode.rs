//! HTTP handlers for barcode lookup and scan receiving

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::{Product, ProductService};
use crate::services::stock_ledger::{
    AdjustStockInput, StockAdjustment, StockLedgerService, StockLevelFilter, StockLevelView,
};
use crate::AppState;

/// Input for a barcode lookup
#[derive(Debug, Deserialize)]
pub struct BarcodeLookupInput {
    pub barcode: String,
}

/// Product with its stock situation across warehouses
#[derive(Debug, Serialize)]
pub struct BarcodeLookupResponse {
    pub product: Product,
    pub stock_levels: Vec<StockLevelView>,
    pub total_quantity: i32,
}

/// Input for receiving stock via a barcode scan
#[derive(Debug, Deserialize)]
pub struct ScanReceiveInput {
    pub barcode: String,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Response for a scan receive
#[derive(Debug, Serialize)]
pub struct ScanReceiveResponse {
    pub product: Product,
    #[serde(flatten)]
    pub adjustment: StockAdjustment,
}

/// Look up a product by barcode with stock across warehouses
pub async fn lookup_barcode(
    State(state): State<AppState>,
    Json(input): Json<BarcodeLookupInput>,
) -> AppResult<Json<BarcodeLookupResponse>> {
    if input.barcode.trim().is_empty() {
        return Err(AppError::Validation {
            field: "barcode".to_string(),
            message: "Barcode is required".to_string(),
        });
    }

    let products = ProductService::new(state.db.clone());
    let product = products.find_by_barcode(input.barcode.trim()).await?;

    let ledger = StockLedgerService::new(state.db);
    let stock_levels = ledger
        .list_stock_levels(&StockLevelFilter {
            product_id: Some(product.id),
            ..Default::default()
        })
        .await?;

    let total_quantity = stock_levels.iter().map(|level| level.quantity).sum();

    Ok(Json(BarcodeLookupResponse {
        product,
        stock_levels,
        total_quantity,
    }))
}

/// Receive stock by scanning a product barcode
pub async fn scan_receive(
    State(state): State<AppState>,
    Json(input): Json<ScanReceiveInput>,
) -> AppResult<Json<ScanReceiveResponse>> {
    if input.quantity <= 0 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity must be positive".to_string(),
        });
    }

    let products = ProductService::new(state.db.clone());
    let product = products.find_by_barcode(&input.barcode).await?;

    let ledger = StockLedgerService::new(state.db);
    let adjustment = ledger
        .adjust(AdjustStockInput {
            product_id: product.id,
            warehouse_id: input.warehouse_id,
            quantity_change: input.quantity,
            movement_type: None,
            reference_type: Some("barcode_scan".to_string()),
            reference_id: None,
            notes: input.notes,
            reorder_level: None,
            max_stock_level: None,
        })
        .await?;

    Ok(Json(ScanReceiveResponse {
        product,
        adjustment,
    }))
}
