//! Route definitions for the Warehouse Inventory Management System

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/warehouses", warehouse_routes())
        .nest("/suppliers", supplier_routes())
        // Stock ledger
        .nest("/inventory", inventory_routes())
        // Purchase orders
        .nest("/purchase-orders", purchase_order_routes())
        // Reporting
        .nest("/reports", report_routes())
        // CSV import/export
        .nest("/csv", csv_routes())
        // Barcode operations
        .nest("/barcode", barcode_routes())
        // Notification log
        .nest("/notifications", notification_routes())
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/low-stock", get(handlers::list_low_stock_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Category routes
fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_categories).post(handlers::create_category))
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
}

/// Warehouse routes
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_warehouses).post(handlers::create_warehouse))
        .route(
            "/:warehouse_id",
            get(handlers::get_warehouse)
                .put(handlers::update_warehouse)
                .delete(handlers::delete_warehouse),
        )
}

/// Supplier routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

/// Stock ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Ledger operations
        .route("/adjust", post(handlers::adjust_stock))
        .route("/transfer", post(handlers::transfer_stock))
        .route("/count", post(handlers::count_stock))
        // Stock levels
        .route("/", get(handlers::list_stock_levels).post(handlers::create_stock_level))
        .route("/low-stock", get(handlers::low_stock_levels))
        .route(
            "/:level_id",
            get(handlers::get_stock_level).put(handlers::update_stock_level),
        )
        // Movement history
        .route("/movements", get(handlers::list_movements))
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route(
            "/:order_id",
            get(handlers::get_purchase_order).put(handlers::update_purchase_order),
        )
        .route("/:order_id/approve", post(handlers::approve_purchase_order))
        .route("/:order_id/order", post(handlers::mark_purchase_order_ordered))
        .route("/:order_id/receive", post(handlers::receive_purchase_order))
        .route("/:order_id/cancel", post(handlers::cancel_purchase_order))
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/inventory-turnover", get(handlers::get_inventory_turnover))
        .route("/stock-levels", get(handlers::get_stock_levels_report))
        .route("/stock-valuation", get(handlers::get_stock_valuation))
        .route("/movement-history", get(handlers::get_movement_history))
        .route("/purchase-orders", get(handlers::get_purchase_order_summary))
}

/// CSV import/export routes
fn csv_routes() -> Router<AppState> {
    Router::new()
        .route("/products/export", get(handlers::export_products))
        .route("/products/import", post(handlers::import_products))
        .route("/stock-levels/export", get(handlers::export_stock_levels))
        .route("/stock-levels/import", post(handlers::import_stock_levels))
        .route("/suppliers/export", get(handlers::export_suppliers))
        .route("/suppliers/import", post(handlers::import_suppliers))
}

/// Barcode routes
fn barcode_routes() -> Router<AppState> {
    Router::new()
        .route("/lookup", post(handlers::lookup_barcode))
        .route("/scan-receive", post(handlers::scan_receive))
}

/// Notification log routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/scan", post(handlers::run_low_stock_scan))
        .route("/:notification_id/sent", post(handlers::mark_notification_sent))
        .route("/:notification_id/failed", post(handlers::mark_notification_failed))
}
