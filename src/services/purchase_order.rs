//! Purchase order workflow service
//!
//! Governs the order lifecycle (pending -> approved -> ordered -> received,
//! with cancellation from any non-terminal state) and the partial-receipt
//! accounting that feeds the stock ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_ledger::{AdjustStockInput, MovementType, StockLedgerService};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

/// Purchase order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Approved => "approved",
            PurchaseOrderStatus::Ordered => "ordered",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
        )
    }

    /// Receiving is only allowed once the order is approved or placed
    pub fn is_receivable(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Approved | PurchaseOrderStatus::Ordered
        )
    }

    /// Whether a forward transition to `next` is permitted
    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        match (self, next) {
            (Pending, Approved) => true,
            (Approved, Ordered) => true,
            (Approved, Received) | (Ordered, Received) => true,
            (Pending, Cancelled) | (Approved, Cancelled) | (Ordered, Cancelled) => true,
            _ => false,
        }
    }
}

/// Generate a date-stamped order number with a collision-resistant suffix
pub fn generate_order_number() -> String {
    let timestamp = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("PO-{}-{}", timestamp, suffix)
}

/// Clamp a requested receipt to what is still outstanding on the line
pub fn clamp_receipt(ordered: i32, already_received: i32, requested: i32) -> i32 {
    requested.min((ordered - already_received).max(0))
}

/// Purchase order record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub order_number: String,
    pub supplier_id: Uuid,
    pub status: PurchaseOrderStatus,
    pub order_date: DateTime<Utc>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase order line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub received_quantity: i32,
}

impl PurchaseOrderItem {
    pub fn pending_quantity(&self) -> i32 {
        (self.quantity - self.received_quantity).max(0)
    }

    pub fn is_fully_received(&self) -> bool {
        self.received_quantity >= self.quantity
    }
}

/// Purchase order together with its line items
#[derive(Debug, Serialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

/// Line item input for order creation
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Input for updating mutable order fields
///
/// Fields are tri-state: absent keeps the stored value, an explicit null
/// clears it, a value replaces it.
#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrderInput {
    #[serde(default)]
    pub expected_delivery: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

/// Resolve a tri-state patch field against the stored value
pub fn resolve_patch<T>(patch: Option<Option<T>>, current: Option<T>) -> Option<T> {
    match patch {
        None => current,
        Some(value) => value,
    }
}

/// One received line in a receive call
#[derive(Debug, Deserialize)]
pub struct ReceiveLineInput {
    pub item_id: Uuid,
    pub received_quantity: i32,
}

/// Input for receiving items against an order
#[derive(Debug, Deserialize)]
pub struct ReceiveOrderInput {
    pub warehouse_id: Uuid,
    pub received_items: Vec<ReceiveLineInput>,
}

/// Filters for order listings
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub supplier_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase order with its line items
    pub async fn create(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "At least one line item is required".to_string(),
            });
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Item quantity must be positive".to_string(),
                });
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "unit_price".to_string(),
                    message: "Item unit price must be positive".to_string(),
                });
            }
        }

        let supplier_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(input.supplier_id)
                .fetch_one(&self.db)
                .await?;

        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let mut tx = self.db.begin().await?;

        // Total is fixed at creation and not recomputed on partial receipt
        let total_amount: Decimal = input
            .items
            .iter()
            .map(|item| Decimal::from(item.quantity) * item.unit_price)
            .sum();

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_orders (order_number, supplier_id, status, expected_delivery, total_amount, notes)
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(generate_order_number())
        .bind(input.supplier_id)
        .bind(input.expected_delivery)
        .bind(total_amount)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            let product_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(item.product_id)
            .fetch_one(&mut *tx)
            .await?;

            if !product_exists {
                return Err(AppError::NotFound(format!("Product {}", item.product_id)));
            }

            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (purchase_order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(order_id).await
    }

    /// Get a purchase order with its items
    pub async fn get(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, order_number, supplier_id, status, order_date, expected_delivery,
                   actual_delivery, total_amount, notes, created_at, updated_at
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items = self.items_for(order_id).await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// List purchase orders, newest first, with optional filtering
    pub async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<PurchaseOrder>> {
        let limit = filter.limit.unwrap_or(20).clamp(1, 100);
        let offset = filter.offset.unwrap_or(0).max(0);

        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, order_number, supplier_id, status, order_date, expected_delivery,
                   actual_delivery, total_amount, notes, created_at, updated_at
            FROM purchase_orders
            WHERE ($1::uuid IS NULL OR supplier_id = $1)
              AND ($2::purchase_order_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.supplier_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Update mutable order fields while the order is pending or approved
    pub async fn update(
        &self,
        order_id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        let mut tx = self.db.begin().await?;

        let (status, expected, notes) = Self::lock_order_fields(&mut tx, order_id).await?;

        if !matches!(
            status,
            PurchaseOrderStatus::Pending | PurchaseOrderStatus::Approved
        ) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot update purchase order in status {}",
                status.as_str()
            )));
        }

        sqlx::query(
            "UPDATE purchase_orders SET expected_delivery = $1, notes = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(resolve_patch(input.expected_delivery, expected))
        .bind(resolve_patch(input.notes, notes))
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(order_id).await
    }

    /// Approve a pending purchase order
    pub async fn approve(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        self.transition(order_id, PurchaseOrderStatus::Approved)
            .await
    }

    /// Mark an approved purchase order as placed with the supplier
    pub async fn mark_ordered(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        self.transition(order_id, PurchaseOrderStatus::Ordered)
            .await
    }

    /// Cancel a purchase order
    ///
    /// Stock already received before cancellation stays on hand; the ledger
    /// history is append-only and receipts are not reversed.
    pub async fn cancel(&self, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        self.transition(order_id, PurchaseOrderStatus::Cancelled)
            .await
    }

    /// Receive items against an approved or placed order
    ///
    /// Each valid line increments the item's received quantity (clamped to
    /// what is still outstanding) and books an `in` movement on the ledger.
    /// The order flips to `received` once every line is fully received.
    pub async fn receive(
        &self,
        order_id: Uuid,
        input: ReceiveOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, order_number, supplier_id, status, order_date, expected_delivery,
                   actual_delivery, total_amount, notes, created_at, updated_at
            FROM purchase_orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if !order.status.is_receivable() {
            return Err(AppError::InvalidStateTransition(format!(
                "Can only receive against approved or ordered purchase orders, status is {}",
                order.status.as_str()
            )));
        }

        for line in &input.received_items {
            if line.received_quantity <= 0 {
                tracing::warn!(
                    item_id = %line.item_id,
                    "Skipping receive line with non-positive quantity"
                );
                continue;
            }

            let item = sqlx::query_as::<_, PurchaseOrderItem>(
                r#"
                SELECT id, purchase_order_id, product_id, quantity, unit_price, received_quantity
                FROM purchase_order_items
                WHERE id = $1 AND purchase_order_id = $2
                FOR UPDATE
                "#,
            )
            .bind(line.item_id)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(item) = item else {
                tracing::warn!(
                    item_id = %line.item_id,
                    order_id = %order_id,
                    "Skipping receive line for unknown item"
                );
                continue;
            };

            let accepted = clamp_receipt(item.quantity, item.received_quantity, line.received_quantity);
            if accepted == 0 {
                tracing::warn!(
                    item_id = %item.id,
                    "Skipping receive line, item already fully received"
                );
                continue;
            }
            if accepted < line.received_quantity {
                tracing::warn!(
                    item_id = %item.id,
                    requested = line.received_quantity,
                    accepted,
                    "Receive quantity exceeds outstanding amount, clamping"
                );
            }

            sqlx::query(
                "UPDATE purchase_order_items SET received_quantity = received_quantity + $1 WHERE id = $2",
            )
            .bind(accepted)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

            StockLedgerService::adjust_in_tx(
                &mut tx,
                &AdjustStockInput {
                    product_id: item.product_id,
                    warehouse_id: input.warehouse_id,
                    quantity_change: accepted,
                    movement_type: Some(MovementType::In),
                    reference_type: Some("purchase_order".to_string()),
                    reference_id: Some(order_id),
                    notes: Some(format!("Received from PO {}", order.order_number)),
                    reorder_level: None,
                    max_stock_level: None,
                },
            )
            .await?;
        }

        let all_received = sqlx::query_scalar::<_, bool>(
            "SELECT COALESCE(BOOL_AND(received_quantity >= quantity), FALSE) FROM purchase_order_items WHERE purchase_order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if all_received {
            sqlx::query(
                "UPDATE purchase_orders SET status = 'received', actual_delivery = NOW(), updated_at = NOW() WHERE id = $1",
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(order_id).await
    }

    /// Apply a single status transition after validating it
    async fn transition(
        &self,
        order_id: Uuid,
        next: PurchaseOrderStatus,
    ) -> AppResult<PurchaseOrderWithItems> {
        let mut tx = self.db.begin().await?;

        let (status, _, _) = Self::lock_order_fields(&mut tx, order_id).await?;

        if !status.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move purchase order from {} to {}",
                status.as_str(),
                next.as_str()
            )));
        }

        sqlx::query("UPDATE purchase_orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(order_id).await
    }

    async fn lock_order_fields(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
    ) -> AppResult<(
        PurchaseOrderStatus,
        Option<DateTime<Utc>>,
        Option<String>,
    )> {
        sqlx::query_as::<_, (PurchaseOrderStatus, Option<DateTime<Utc>>, Option<String>)>(
            "SELECT status, expected_delivery, notes FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))
    }

    async fn items_for(&self, order_id: Uuid) -> AppResult<Vec<PurchaseOrderItem>> {
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT id, purchase_order_id, product_id, quantity, unit_price, received_quantity
            FROM purchase_order_items
            WHERE purchase_order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }
}
