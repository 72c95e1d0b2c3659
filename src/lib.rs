//! Warehouse Inventory Management System backend
//!
//! Tracks per-warehouse stock levels with an append-only movement ledger,
//! runs the purchase-order fulfillment workflow that feeds it, and serves
//! read-only reporting over the accumulated state.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}
