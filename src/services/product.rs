//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    pub category_id: Uuid,
    pub unit_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    pub category_id: Uuid,
    pub unit_price: Option<Decimal>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Filters for product listings
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, sku, barcode, category_id, unit_price, is_active, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        if input.name.trim().is_empty() || input.sku.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name/sku".to_string(),
                message: "Name and SKU are required".to_string(),
            });
        }

        let category_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(input.category_id)
                .fetch_one(&self.db)
                .await?;

        if !category_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let sku_taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)")
                .bind(&input.sku)
                .fetch_one(&self.db)
                .await?;

        if sku_taken {
            return Err(AppError::DuplicateEntry("SKU".to_string()));
        }

        if let Some(ref barcode) = input.barcode {
            let barcode_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE barcode = $1)",
            )
            .bind(barcode)
            .fetch_one(&self.db)
            .await?;

            if barcode_taken {
                return Err(AppError::DuplicateEntry("barcode".to_string()));
            }
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, description, sku, barcode, category_id, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.category_id)
        .bind(input.unit_price)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Find a product by barcode
    pub async fn find_by_barcode(&self, barcode: &str) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE barcode = $1",
            PRODUCT_COLUMNS
        ))
        .bind(barcode)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// List products with optional filtering
    pub async fn list(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let search = filter.search.as_ref().map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR sku ILIKE $3)
            ORDER BY name
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(filter.category_id)
        .bind(filter.is_active)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Update a product
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        if let Some(category_id) = input.category_id {
            let category_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
            )
            .bind(category_id)
            .fetch_one(&self.db)
            .await?;

            if !category_exists {
                return Err(AppError::NotFound("Category".to_string()));
            }
        }

        if let Some(ref barcode) = input.barcode {
            let barcode_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE barcode = $1 AND id <> $2)",
            )
            .bind(barcode)
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;

            if barcode_taken {
                return Err(AppError::DuplicateEntry("barcode".to_string()));
            }
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $1, description = $2, barcode = $3, category_id = $4,
                unit_price = $5, is_active = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.description.or(existing.description))
        .bind(input.barcode.or(existing.barcode))
        .bind(input.category_id.unwrap_or(existing.category_id))
        .bind(input.unit_price.or(existing.unit_price))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product
    ///
    /// Products with stock levels or movement history cannot be deleted:
    /// the ledger is append-only and must keep resolving its references.
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        self.get(product_id).await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM stock_levels WHERE product_id = $1)
                OR EXISTS(SELECT 1 FROM stock_movements WHERE product_id = $1)
                OR EXISTS(SELECT 1 FROM purchase_order_items WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: "Cannot delete a product with stock, movement history, or purchase orders"
                    .to_string(),
            });
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
