//! Stock ledger service
//!
//! Owns the authoritative on-hand quantity per (product, warehouse) and the
//! append-only movement history explaining every change. Every mutation runs
//! in a single transaction with a row lock on the affected stock level, so a
//! quantity change and its movement record are never observable separately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock ledger service for stock levels and movement history
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

/// Stock movement types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Transfer => "transfer",
            MovementType::Adjustment => "adjustment",
        }
    }

    /// Infer the movement type from the sign of a quantity change
    pub fn infer(quantity_change: i32) -> Self {
        if quantity_change >= 0 {
            MovementType::In
        } else {
            MovementType::Out
        }
    }
}

/// Apply a signed quantity change, refusing results below zero or past `i32::MAX`
pub fn apply_quantity_change(current: i32, change: i32) -> Option<i32> {
    current.checked_add(change).filter(|next| *next >= 0)
}

/// Low-stock predicate: at or below the reorder threshold
pub fn is_low_stock(quantity: i32, reorder_level: i32) -> bool {
    quantity <= reorder_level
}

/// Current stock level for one product at one warehouse
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLevel {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub reorder_level: i32,
    pub max_stock_level: i32,
    pub last_updated: DateTime<Utc>,
}

/// Stock level joined with product and warehouse names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLevelView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub max_stock_level: i32,
    pub is_low_stock: bool,
    pub last_updated: DateTime<Utc>,
}

/// Immutable movement record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for adjusting stock
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity_change: i32,
    pub movement_type: Option<MovementType>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub reorder_level: Option<i32>,
    pub max_stock_level: Option<i32>,
}

/// Input for transferring stock between warehouses
#[derive(Debug, Deserialize)]
pub struct TransferStockInput {
    pub product_id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub quantity: i32,
}

/// Input for reconciling stock against a physical count
#[derive(Debug, Deserialize)]
pub struct CountStockInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub counted_quantity: i32,
    pub notes: Option<String>,
}

/// Input for explicitly creating a stock level row
#[derive(Debug, Deserialize)]
pub struct CreateStockLevelInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: Option<i32>,
    pub reorder_level: Option<i32>,
    pub max_stock_level: Option<i32>,
}

/// Input for updating a stock level's thresholds
///
/// Quantity is deliberately absent: on-hand changes go through adjust/count
/// so the movement ledger always reconciles with the stored quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateStockLevelInput {
    pub reorder_level: Option<i32>,
    pub max_stock_level: Option<i32>,
}

/// Filters for stock level listings
#[derive(Debug, Default, Deserialize)]
pub struct StockLevelFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub low_stock: Option<bool>,
}

/// Filters for movement listings
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
}

/// Result of an adjustment: the updated level and the appended movement
#[derive(Debug, Serialize)]
pub struct StockAdjustment {
    pub stock_level: StockLevel,
    pub movement: StockMovement,
}

/// Result of a transfer: both updated levels and the two movements
#[derive(Debug, Serialize)]
pub struct StockTransfer {
    pub source: StockLevel,
    pub destination: StockLevel,
    pub outbound_movement: StockMovement,
    pub inbound_movement: StockMovement,
}

/// Result of a stock count reconciliation
#[derive(Debug, Serialize)]
pub struct StockCount {
    pub stock_level: StockLevel,
    pub adjustment: i32,
    pub movement: Option<StockMovement>,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Adjust the stock level for a product in a warehouse and record the movement
    pub async fn adjust(&self, input: AdjustStockInput) -> AppResult<StockAdjustment> {
        let mut tx = self.db.begin().await?;
        let adjustment = Self::adjust_in_tx(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    /// Adjustment within a caller-provided transaction
    ///
    /// Used directly by the purchase-order receiving workflow so item updates
    /// and ledger writes commit or roll back together.
    pub(crate) async fn adjust_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &AdjustStockInput,
    ) -> AppResult<StockAdjustment> {
        if input.quantity_change == 0 {
            return Err(AppError::Validation {
                field: "quantity_change".to_string(),
                message: "Quantity change must be non-zero".to_string(),
            });
        }

        Self::ensure_product_exists(tx, input.product_id).await?;
        Self::ensure_warehouse_exists(tx, input.warehouse_id).await?;

        let level = Self::lock_or_create_level(
            tx,
            input.product_id,
            input.warehouse_id,
            input.reorder_level.unwrap_or(10),
            input.max_stock_level.unwrap_or(1000),
        )
        .await?;

        let new_quantity =
            apply_quantity_change(level.quantity, input.quantity_change).ok_or_else(|| {
                // A positive change can only be refused when it overflows the column
                if input.quantity_change > 0 {
                    AppError::Validation {
                        field: "quantity_change".to_string(),
                        message: format!(
                            "Change of {} exceeds the maximum storable quantity from {}",
                            input.quantity_change, level.quantity
                        ),
                    }
                } else {
                    AppError::InsufficientStock(format!(
                        "Cannot apply change of {} to current quantity {}",
                        input.quantity_change, level.quantity
                    ))
                }
            })?;

        let movement_type = input
            .movement_type
            .unwrap_or_else(|| MovementType::infer(input.quantity_change));

        let stock_level = Self::write_quantity(tx, level.id, new_quantity).await?;

        let movement = Self::append_movement(
            tx,
            input.product_id,
            input.warehouse_id,
            movement_type,
            input.quantity_change.unsigned_abs() as i32,
            input.reference_type.as_deref(),
            input.reference_id,
            input.notes.as_deref(),
        )
        .await?;

        Ok(StockAdjustment {
            stock_level,
            movement,
        })
    }

    /// Transfer stock between two warehouses as one atomic unit
    pub async fn transfer(&self, input: TransferStockInput) -> AppResult<StockTransfer> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Transfer quantity must be positive".to_string(),
            });
        }
        if input.from_warehouse_id == input.to_warehouse_id {
            return Err(AppError::Validation {
                field: "to_warehouse_id".to_string(),
                message: "Source and destination warehouses must differ".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        Self::ensure_product_exists(&mut tx, input.product_id).await?;
        let from_name = Self::warehouse_name(&mut tx, input.from_warehouse_id).await?;
        let to_name = Self::warehouse_name(&mut tx, input.to_warehouse_id).await?;

        // The destination row may not exist yet
        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, warehouse_id, quantity, reorder_level, max_stock_level)
            VALUES ($1, $2, 0, 10, 1000)
            ON CONFLICT (product_id, warehouse_id) DO NOTHING
            "#,
        )
        .bind(input.product_id)
        .bind(input.to_warehouse_id)
        .execute(&mut *tx)
        .await?;

        // Lock both rows in warehouse-id order so opposite transfers for the
        // same product queue on the locks instead of deadlocking
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT id, product_id, warehouse_id, quantity, reorder_level, max_stock_level, last_updated
            FROM stock_levels
            WHERE product_id = $1 AND warehouse_id IN ($2, $3)
            ORDER BY warehouse_id
            FOR UPDATE
            "#,
        )
        .bind(input.product_id)
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .fetch_all(&mut *tx)
        .await?;

        // Source may be absent: a missing row means zero on hand
        let source = levels
            .iter()
            .find(|level| level.warehouse_id == input.from_warehouse_id)
            .cloned();
        let destination = levels
            .into_iter()
            .find(|level| level.warehouse_id == input.to_warehouse_id)
            .ok_or_else(|| AppError::Internal("Destination stock level missing".to_string()))?;

        let source = match source {
            Some(level) if level.quantity >= input.quantity => level,
            other => {
                return Err(AppError::InsufficientStock(format!(
                    "Source warehouse has {} on hand, cannot transfer {}",
                    other.map(|l| l.quantity).unwrap_or(0),
                    input.quantity
                )));
            }
        };

        let received = apply_quantity_change(destination.quantity, input.quantity).ok_or_else(
            || AppError::Validation {
                field: "quantity".to_string(),
                message: format!(
                    "Transfer of {} exceeds the maximum storable quantity at the destination",
                    input.quantity
                ),
            },
        )?;

        let source = Self::write_quantity(&mut tx, source.id, source.quantity - input.quantity).await?;
        let destination = Self::write_quantity(&mut tx, destination.id, received).await?;

        let outbound_movement = Self::append_movement(
            &mut tx,
            input.product_id,
            input.from_warehouse_id,
            MovementType::Out,
            input.quantity,
            Some("transfer"),
            None,
            Some(&format!("Transfer to warehouse {}", to_name)),
        )
        .await?;

        let inbound_movement = Self::append_movement(
            &mut tx,
            input.product_id,
            input.to_warehouse_id,
            MovementType::In,
            input.quantity,
            Some("transfer"),
            None,
            Some(&format!("Transfer from warehouse {}", from_name)),
        )
        .await?;

        tx.commit().await?;

        Ok(StockTransfer {
            source,
            destination,
            outbound_movement,
            inbound_movement,
        })
    }

    /// Reconcile a stock level against a physical count
    ///
    /// Counting to the current quantity is idempotent and records no movement.
    pub async fn count(&self, input: CountStockInput) -> AppResult<StockCount> {
        if input.counted_quantity < 0 {
            return Err(AppError::Validation {
                field: "counted_quantity".to_string(),
                message: "Counted quantity cannot be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        Self::ensure_product_exists(&mut tx, input.product_id).await?;
        Self::ensure_warehouse_exists(&mut tx, input.warehouse_id).await?;

        let level =
            Self::lock_or_create_level(&mut tx, input.product_id, input.warehouse_id, 10, 1000)
                .await?;

        let adjustment = input.counted_quantity - level.quantity;
        let stock_level = Self::write_quantity(&mut tx, level.id, input.counted_quantity).await?;

        let movement = if adjustment != 0 {
            let notes = input.notes.clone().unwrap_or_else(|| {
                format!(
                    "Stock count: counted {}, previous {}",
                    input.counted_quantity, level.quantity
                )
            });
            Some(
                Self::append_movement(
                    &mut tx,
                    input.product_id,
                    input.warehouse_id,
                    MovementType::Adjustment,
                    adjustment.unsigned_abs() as i32,
                    Some("stock_count"),
                    None,
                    Some(&notes),
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await?;

        Ok(StockCount {
            stock_level,
            adjustment,
            movement,
        })
    }

    /// Explicitly create a stock level row
    ///
    /// A non-zero initial quantity is recorded as an `in` movement so the
    /// ledger still reconciles to the stored quantity.
    pub async fn create_stock_level(
        &self,
        input: CreateStockLevelInput,
    ) -> AppResult<StockLevelView> {
        let quantity = input.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Initial quantity cannot be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        Self::ensure_product_exists(&mut tx, input.product_id).await?;
        Self::ensure_warehouse_exists(&mut tx, input.warehouse_id).await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_levels WHERE product_id = $1 AND warehouse_id = $2)",
        )
        .bind(input.product_id)
        .bind(input.warehouse_id)
        .fetch_one(&mut *tx)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry(
                "product-warehouse stock level".to_string(),
            ));
        }

        let level_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_levels (product_id, warehouse_id, quantity, reorder_level, max_stock_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.product_id)
        .bind(input.warehouse_id)
        .bind(quantity)
        .bind(input.reorder_level.unwrap_or(10))
        .bind(input.max_stock_level.unwrap_or(1000))
        .fetch_one(&mut *tx)
        .await?;

        if quantity > 0 {
            Self::append_movement(
                &mut tx,
                input.product_id,
                input.warehouse_id,
                MovementType::In,
                quantity,
                Some("initial_stock"),
                None,
                Some("Initial stock on level creation"),
            )
            .await?;
        }

        tx.commit().await?;

        self.get_stock_level(level_id).await
    }

    /// Get a stock level by id, with product and warehouse names
    pub async fn get_stock_level(&self, id: Uuid) -> AppResult<StockLevelView> {
        sqlx::query_as::<_, StockLevelView>(&format!(
            "{} WHERE sl.id = $1",
            Self::LEVEL_VIEW_QUERY
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock level".to_string()))
    }

    /// List stock levels with optional filtering
    pub async fn list_stock_levels(
        &self,
        filter: &StockLevelFilter,
    ) -> AppResult<Vec<StockLevelView>> {
        let levels = sqlx::query_as::<_, StockLevelView>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR sl.product_id = $1)
              AND ($2::uuid IS NULL OR sl.warehouse_id = $2)
              AND ($3::bool IS NOT TRUE OR sl.quantity <= sl.reorder_level)
            ORDER BY p.name, w.name
            "#,
            Self::LEVEL_VIEW_QUERY
        ))
        .bind(filter.product_id)
        .bind(filter.warehouse_id)
        .bind(filter.low_stock)
        .fetch_all(&self.db)
        .await?;

        Ok(levels)
    }

    /// List all stock levels at or below their reorder threshold
    pub async fn low_stock_levels(&self) -> AppResult<Vec<StockLevelView>> {
        self.list_stock_levels(&StockLevelFilter {
            low_stock: Some(true),
            ..Default::default()
        })
        .await
    }

    /// Update the reorder and maximum thresholds of a stock level
    pub async fn update_stock_level(
        &self,
        id: Uuid,
        input: UpdateStockLevelInput,
    ) -> AppResult<StockLevelView> {
        let existing = sqlx::query_as::<_, (i32, i32)>(
            "SELECT reorder_level, max_stock_level FROM stock_levels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock level".to_string()))?;

        let reorder_level = input.reorder_level.unwrap_or(existing.0);
        let max_stock_level = input.max_stock_level.unwrap_or(existing.1);

        if reorder_level < 0 || max_stock_level < 0 {
            return Err(AppError::Validation {
                field: "reorder_level/max_stock_level".to_string(),
                message: "Thresholds cannot be negative".to_string(),
            });
        }

        sqlx::query("UPDATE stock_levels SET reorder_level = $1, max_stock_level = $2 WHERE id = $3")
            .bind(reorder_level)
            .bind(max_stock_level)
            .bind(id)
            .execute(&self.db)
            .await?;

        self.get_stock_level(id).await
    }

    /// List movements, newest first, with optional filtering
    pub async fn list_movements(&self, filter: &MovementFilter) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, warehouse_id, movement_type, quantity,
                   reference_type, reference_id, notes, created_at
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR warehouse_id = $2)
              AND ($3::movement_type IS NULL OR movement_type = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.warehouse_id)
        .bind(filter.movement_type)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    const LEVEL_VIEW_QUERY: &'static str = r#"
        SELECT sl.id, sl.product_id, p.name AS product_name, p.sku AS product_sku,
               sl.warehouse_id, w.name AS warehouse_name,
               sl.quantity, sl.reorder_level, sl.max_stock_level,
               (sl.quantity <= sl.reorder_level) AS is_low_stock, sl.last_updated
        FROM stock_levels sl
        JOIN products p ON p.id = sl.product_id
        JOIN warehouses w ON w.id = sl.warehouse_id
    "#;

    /// Lock the stock level row, creating it with defaults when absent
    async fn lock_or_create_level(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        warehouse_id: Uuid,
        reorder_level: i32,
        max_stock_level: i32,
    ) -> AppResult<StockLevel> {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, warehouse_id, quantity, reorder_level, max_stock_level)
            VALUES ($1, $2, 0, $3, $4)
            ON CONFLICT (product_id, warehouse_id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .bind(reorder_level)
        .bind(max_stock_level)
        .execute(&mut **tx)
        .await?;

        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT id, product_id, warehouse_id, quantity, reorder_level, max_stock_level, last_updated
            FROM stock_levels
            WHERE product_id = $1 AND warehouse_id = $2
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(level)
    }

    async fn write_quantity(
        tx: &mut Transaction<'_, Postgres>,
        level_id: Uuid,
        quantity: i32,
    ) -> AppResult<StockLevel> {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE stock_levels
            SET quantity = $1, last_updated = NOW()
            WHERE id = $2
            RETURNING id, product_id, warehouse_id, quantity, reorder_level, max_stock_level, last_updated
            "#,
        )
        .bind(quantity)
        .bind(level_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(level)
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_movement(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        warehouse_id: Uuid,
        movement_type: MovementType,
        quantity: i32,
        reference_type: Option<&str>,
        reference_id: Option<Uuid>,
        notes: Option<&str>,
    ) -> AppResult<StockMovement> {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (product_id, warehouse_id, movement_type, quantity,
                                         reference_type, reference_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, product_id, warehouse_id, movement_type, quantity,
                      reference_type, reference_id, notes, created_at
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .bind(movement_type)
        .bind(quantity)
        .bind(reference_type)
        .bind(reference_id)
        .bind(notes)
        .fetch_one(&mut **tx)
        .await?;

        Ok(movement)
    }

    async fn ensure_product_exists(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
    ) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&mut **tx)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    async fn ensure_warehouse_exists(
        tx: &mut Transaction<'_, Postgres>,
        warehouse_id: Uuid,
    ) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1)")
                .bind(warehouse_id)
                .fetch_one(&mut **tx)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }
        Ok(())
    }

    async fn warehouse_name(
        tx: &mut Transaction<'_, Postgres>,
        warehouse_id: Uuid,
    ) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM warehouses WHERE id = $1")
            .bind(warehouse_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }
}
