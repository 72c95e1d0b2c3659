//! Reporting service
//!
//! Read-only projections over ledger and workflow state. Every report is a
//! fresh aggregation at call time; nothing is cached.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_ledger::MovementType;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard summary statistics
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_products: i64,
    pub total_warehouses: i64,
    pub low_stock_items: i64,
    pub pending_purchase_orders: i64,
    pub total_inventory_value: Decimal,
    pub recent_movements: i64,
}

/// Inventory turnover entry for one product
#[derive(Debug, Serialize)]
pub struct TurnoverEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub total_out_quantity: i64,
    pub avg_inventory: Decimal,
    pub turnover_rate: Decimal,
}

#[derive(Debug, FromRow)]
struct TurnoverRow {
    product_id: Uuid,
    product_name: String,
    sku: String,
    total_out_quantity: i64,
    avg_inventory: Decimal,
}

/// One row of the stock levels report
#[derive(Debug, Serialize, FromRow)]
pub struct StockLevelReportRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub category_id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub max_stock_level: i32,
    pub is_low_stock: bool,
    pub stock_percentage: Decimal,
}

/// One row of the valuation report
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ValuationRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i32,
    pub total_value: Decimal,
}

/// Per-warehouse valuation subtotal
#[derive(Debug, Serialize)]
pub struct WarehouseValuation {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub total_value: Decimal,
    pub item_count: i64,
}

/// Full stock valuation report
#[derive(Debug, Serialize)]
pub struct StockValuationReport {
    pub items: Vec<ValuationRow>,
    pub warehouse_totals: Vec<WarehouseValuation>,
    pub grand_total: Decimal,
}

/// Movement history entry with joined names
#[derive(Debug, Serialize, FromRow)]
pub struct MovementHistoryEntry {
    pub id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub sku: String,
    pub warehouse_name: String,
}

/// Per-status purchase order summary
#[derive(Debug, Serialize, FromRow)]
pub struct OrderStatusSummary {
    pub status: String,
    pub count: i64,
    pub total_amount: Decimal,
}

/// Per-supplier purchase order performance
#[derive(Debug, Serialize, FromRow)]
pub struct SupplierPerformance {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub avg_delivery_days: Option<Decimal>,
}

/// Purchase order summary report
#[derive(Debug, Serialize)]
pub struct PurchaseOrderSummary {
    pub status_summary: Vec<OrderStatusSummary>,
    pub supplier_performance: Vec<SupplierPerformance>,
}

/// Query filters shared by windowed reports
#[derive(Debug, Default, Deserialize)]
pub struct MovementHistoryFilter {
    pub days: Option<i64>,
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
}

/// Turnover rate: total outbound quantity over average inventory
pub fn turnover_rate(total_out: i64, avg_inventory: Decimal) -> Decimal {
    if avg_inventory <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (Decimal::from(total_out) / avg_inventory).round_dp(2)
    }
}

/// Percentage of maximum stock level currently on hand
pub fn stock_percentage(quantity: i32, max_stock_level: i32) -> Decimal {
    if max_stock_level <= 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(quantity) * Decimal::from(100) / Decimal::from(max_stock_level)).round_dp(2)
    }
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get dashboard summary statistics
    pub async fn dashboard_summary(&self) -> AppResult<DashboardSummary> {
        let total_products = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE is_active = TRUE",
        )
        .fetch_one(&self.db)
        .await?;

        let total_warehouses = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warehouses WHERE is_active = TRUE",
        )
        .fetch_one(&self.db)
        .await?;

        let low_stock_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_levels WHERE quantity <= reorder_level",
        )
        .fetch_one(&self.db)
        .await?;

        let pending_purchase_orders = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM purchase_orders WHERE status = 'pending'",
        )
        .fetch_one(&self.db)
        .await?;

        let total_inventory_value = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT SUM(sl.quantity * p.unit_price)
            FROM stock_levels sl
            JOIN products p ON p.id = sl.product_id
            WHERE p.unit_price IS NOT NULL
            "#,
        )
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        let seven_days_ago = Utc::now() - Duration::days(7);
        let recent_movements = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_movements WHERE created_at >= $1",
        )
        .bind(seven_days_ago)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardSummary {
            total_products,
            total_warehouses,
            low_stock_items,
            pending_purchase_orders,
            total_inventory_value,
            recent_movements,
        })
    }

    /// Inventory turnover over the trailing window, fastest movers first
    pub async fn inventory_turnover(&self, days: i64) -> AppResult<Vec<TurnoverEntry>> {
        let start = Utc::now() - Duration::days(days.max(1));

        let rows = sqlx::query_as::<_, TurnoverRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.sku,
                   SUM(m.quantity)::BIGINT AS total_out_quantity,
                   (SELECT COALESCE(AVG(quantity), 0)
                    FROM stock_levels WHERE product_id = p.id) AS avg_inventory
            FROM products p
            JOIN stock_movements m ON m.product_id = p.id
            WHERE m.movement_type = 'out' AND m.created_at >= $1
            GROUP BY p.id, p.name, p.sku
            "#,
        )
        .bind(start)
        .fetch_all(&self.db)
        .await?;

        let mut entries: Vec<TurnoverEntry> = rows
            .into_iter()
            .map(|r| TurnoverEntry {
                turnover_rate: turnover_rate(r.total_out_quantity, r.avg_inventory),
                product_id: r.product_id,
                product_name: r.product_name,
                sku: r.sku,
                total_out_quantity: r.total_out_quantity,
                avg_inventory: r.avg_inventory,
            })
            .collect();

        entries.sort_by(|a, b| b.turnover_rate.cmp(&a.turnover_rate));

        Ok(entries)
    }

    /// Current stock levels across warehouses
    pub async fn stock_levels_report(
        &self,
        warehouse_id: Option<Uuid>,
        category_id: Option<Uuid>,
    ) -> AppResult<Vec<StockLevelReportRow>> {
        let rows = sqlx::query_as::<_, StockLevelReportRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.sku, p.category_id,
                   w.id AS warehouse_id, w.name AS warehouse_name,
                   sl.quantity, sl.reorder_level, sl.max_stock_level,
                   (sl.quantity <= sl.reorder_level) AS is_low_stock,
                   CASE WHEN sl.max_stock_level > 0
                        THEN ROUND(sl.quantity * 100.0 / sl.max_stock_level, 2)
                        ELSE 0
                   END AS stock_percentage
            FROM stock_levels sl
            JOIN products p ON p.id = sl.product_id
            JOIN warehouses w ON w.id = sl.warehouse_id
            WHERE ($1::uuid IS NULL OR w.id = $1)
              AND ($2::uuid IS NULL OR p.category_id = $2)
            ORDER BY p.name, w.name
            "#,
        )
        .bind(warehouse_id)
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Stock valuation with per-warehouse subtotals and a grand total
    pub async fn stock_valuation(
        &self,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<StockValuationReport> {
        let items = sqlx::query_as::<_, ValuationRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.sku, p.unit_price,
                   w.id AS warehouse_id, w.name AS warehouse_name,
                   sl.quantity, (sl.quantity * p.unit_price) AS total_value
            FROM stock_levels sl
            JOIN products p ON p.id = sl.product_id
            JOIN warehouses w ON w.id = sl.warehouse_id
            WHERE p.unit_price IS NOT NULL
              AND ($1::uuid IS NULL OR w.id = $1)
            ORDER BY w.name, p.name
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assemble_valuation_report(items))
    }

    /// Movement history over a trailing window, newest first
    pub async fn movement_history(
        &self,
        filter: &MovementHistoryFilter,
    ) -> AppResult<Vec<MovementHistoryEntry>> {
        let start = Utc::now() - Duration::days(filter.days.unwrap_or(30).max(1));

        let entries = sqlx::query_as::<_, MovementHistoryEntry>(
            r#"
            SELECT m.id, m.movement_type, m.quantity, m.reference_type, m.reference_id,
                   m.notes, m.created_at,
                   p.name AS product_name, p.sku, w.name AS warehouse_name
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN warehouses w ON w.id = m.warehouse_id
            WHERE m.created_at >= $1
              AND ($2::uuid IS NULL OR m.product_id = $2)
              AND ($3::uuid IS NULL OR m.warehouse_id = $3)
              AND ($4::movement_type IS NULL OR m.movement_type = $4)
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(start)
        .bind(filter.product_id)
        .bind(filter.warehouse_id)
        .bind(filter.movement_type)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Purchase order summary over a trailing window
    pub async fn purchase_order_summary(&self, days: i64) -> AppResult<PurchaseOrderSummary> {
        let start = Utc::now() - Duration::days(days.max(1));

        let status_summary = sqlx::query_as::<_, OrderStatusSummary>(
            r#"
            SELECT status::TEXT AS status, COUNT(*) AS count,
                   COALESCE(SUM(total_amount), 0) AS total_amount
            FROM purchase_orders
            WHERE created_at >= $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(start)
        .fetch_all(&self.db)
        .await?;

        let supplier_performance = sqlx::query_as::<_, SupplierPerformance>(
            r#"
            SELECT s.id AS supplier_id, s.name AS supplier_name,
                   COUNT(po.id) AS order_count,
                   COALESCE(SUM(po.total_amount), 0) AS total_spent,
                   AVG(EXTRACT(EPOCH FROM (po.actual_delivery - po.order_date)) / 86400)::NUMERIC(10,2)
                       AS avg_delivery_days
            FROM purchase_orders po
            JOIN suppliers s ON s.id = po.supplier_id
            WHERE po.created_at >= $1
            GROUP BY s.id, s.name
            ORDER BY total_spent DESC
            "#,
        )
        .bind(start)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseOrderSummary {
            status_summary,
            supplier_performance,
        })
    }

    /// Export any serializable report to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV write error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))?;

        Ok(csv_data)
    }
}

/// Group valuation rows by warehouse and compute totals
pub fn assemble_valuation_report(items: Vec<ValuationRow>) -> StockValuationReport {
    let mut warehouse_totals: Vec<WarehouseValuation> = Vec::new();
    let mut grand_total = Decimal::ZERO;

    for item in &items {
        grand_total += item.total_value;

        match warehouse_totals
            .iter_mut()
            .find(|w| w.warehouse_id == item.warehouse_id)
        {
            Some(entry) => {
                entry.total_value += item.total_value;
                entry.item_count += 1;
            }
            None => warehouse_totals.push(WarehouseValuation {
                warehouse_id: item.warehouse_id,
                warehouse_name: item.warehouse_name.clone(),
                total_value: item.total_value,
                item_count: 1,
            }),
        }
    }

    StockValuationReport {
        items,
        warehouse_totals,
        grand_total,
    }
}
