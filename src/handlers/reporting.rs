//! Reporting handlers for analytics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::reporting::{
    DashboardSummary, MovementHistoryFilter, PurchaseOrderSummary, ReportingService,
    StockValuationReport,
};
use crate::services::stock_ledger::MovementType;
use crate::AppState;

#[derive(Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Deserialize)]
pub struct StockLevelsQuery {
    pub warehouse_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct ValuationQuery {
    pub warehouse_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct MovementHistoryQuery {
    pub days: Option<i64>,
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub format: Option<String>,
}

/// Get dashboard summary metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<DashboardSummary>> {
    let service = ReportingService::new(state.db);
    let summary = service.dashboard_summary().await?;
    Ok(Json(summary))
}

/// Get inventory turnover report
pub async fn get_inventory_turnover(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let data = service.inventory_turnover(query.days.unwrap_or(30)).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"inventory_turnover.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get current stock levels report
pub async fn get_stock_levels_report(
    State(state): State<AppState>,
    Query(query): Query<StockLevelsQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let data = service
        .stock_levels_report(query.warehouse_id, query.category_id)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"stock_levels.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get stock valuation report
pub async fn get_stock_valuation(
    State(state): State<AppState>,
    Query(query): Query<ValuationQuery>,
) -> AppResult<Json<StockValuationReport>> {
    let service = ReportingService::new(state.db);
    let report = service.stock_valuation(query.warehouse_id).await?;
    Ok(Json(report))
}

/// Get movement history report
pub async fn get_movement_history(
    State(state): State<AppState>,
    Query(query): Query<MovementHistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db);
    let filter = MovementHistoryFilter {
        days: query.days,
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        movement_type: query.movement_type,
    };
    let data = service.movement_history(&filter).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"movement_history.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get purchase order summary report
pub async fn get_purchase_order_summary(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<PurchaseOrderSummary>> {
    let service = ReportingService::new(state.db);
    let summary = service
        .purchase_order_summary(query.days.unwrap_or(30))
        .await?;
    Ok(Json(summary))
}
