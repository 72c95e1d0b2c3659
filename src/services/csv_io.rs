//! CSV import/export service
//!
//! Exports catalog and stock data as CSV text and imports rows back,
//! collecting per-row errors instead of aborting the whole file. Stock
//! imports reconcile through the ledger so imported quantities leave a
//! movement trail like any other change.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_ledger::{CountStockInput, StockLedgerService, UpdateStockLevelInput};

/// CSV import/export service
#[derive(Clone)]
pub struct CsvService {
    db: PgPool,
    ledger: StockLedgerService,
}

/// Outcome of an import: row counts plus per-row error messages
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<String>,
}

/// Product row as exported/imported
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductCsvRow {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub category_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Stock level row as exported/imported; keyed by SKU and warehouse name
#[derive(Debug, Serialize, Deserialize)]
pub struct StockCsvRow {
    pub product_sku: String,
    pub warehouse_name: String,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub max_stock_level: Option<i32>,
}

/// Supplier row as exported/imported; keyed by name
#[derive(Debug, Serialize, Deserialize)]
pub struct SupplierCsvRow {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

/// Serialize rows to CSV text with a header row
pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))
}

/// Parse CSV text into typed rows
///
/// Rows that fail to deserialize become error strings rather than failing
/// the parse; the caller folds them into the import summary. Row numbers
/// are 1-based over data rows, matching what a spreadsheet user sees
/// below the header.
pub fn parse_csv_rows<T: DeserializeOwned>(content: &str) -> (Vec<(usize, T)>, Vec<String>) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.deserialize::<T>().enumerate() {
        let row_number = index + 1;
        match record {
            Ok(row) => rows.push((row_number, row)),
            Err(e) => errors.push(format!("Row {}: {}", row_number, e)),
        }
    }

    (rows, errors)
}

impl CsvService {
    /// Create a new CsvService instance
    pub fn new(db: PgPool) -> Self {
        let ledger = StockLedgerService::new(db.clone());
        Self { db, ledger }
    }

    // ========================================================================
    // Exports
    // ========================================================================

    /// Export all products as CSV
    pub async fn export_products(&self) -> AppResult<String> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, String, Option<Decimal>, bool)>(
            r#"
            SELECT p.name, p.sku, p.description, p.barcode, c.name, p.unit_price, p.is_active
            FROM products p
            JOIN categories c ON c.id = p.category_id
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<ProductCsvRow> = rows
            .into_iter()
            .map(
                |(name, sku, description, barcode, category_name, unit_price, is_active)| {
                    ProductCsvRow {
                        name,
                        sku,
                        description,
                        barcode,
                        category_name: Some(category_name),
                        unit_price,
                        is_active: Some(is_active),
                    }
                },
            )
            .collect();

        rows_to_csv(&rows)
    }

    /// Export all stock levels as CSV
    pub async fn export_stock_levels(&self) -> AppResult<String> {
        let rows = sqlx::query_as::<_, (String, String, i32, i32, i32)>(
            r#"
            SELECT p.sku, w.name, sl.quantity, sl.reorder_level, sl.max_stock_level
            FROM stock_levels sl
            JOIN products p ON p.id = sl.product_id
            JOIN warehouses w ON w.id = sl.warehouse_id
            ORDER BY p.sku, w.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<StockCsvRow> = rows
            .into_iter()
            .map(
                |(product_sku, warehouse_name, quantity, reorder_level, max_stock_level)| {
                    StockCsvRow {
                        product_sku,
                        warehouse_name,
                        quantity,
                        reorder_level: Some(reorder_level),
                        max_stock_level: Some(max_stock_level),
                    }
                },
            )
            .collect();

        rows_to_csv(&rows)
    }

    /// Export all suppliers as CSV
    pub async fn export_suppliers(&self) -> AppResult<String> {
        let rows = sqlx::query_as::<_, SupplierCsvRowDb>(
            r#"
            SELECT name, contact_person, email, phone, address, tax_id, payment_terms, is_active
            FROM suppliers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let rows: Vec<SupplierCsvRow> = rows.into_iter().map(SupplierCsvRow::from).collect();
        rows_to_csv(&rows)
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// Import products from CSV text
    ///
    /// Rows are keyed by SKU. An existing SKU is an error unless
    /// `update_existing` is set, in which case the row overwrites the
    /// stored product.
    pub async fn import_products(
        &self,
        content: &str,
        update_existing: bool,
    ) -> AppResult<ImportSummary> {
        let (rows, parse_errors) = parse_csv_rows::<ProductCsvRow>(content);
        let mut summary = ImportSummary {
            errors: parse_errors,
            ..Default::default()
        };

        for (row_number, row) in rows {
            if row.name.trim().is_empty() || row.sku.trim().is_empty() {
                summary
                    .errors
                    .push(format!("Row {}: name and sku are required", row_number));
                continue;
            }

            let category_id = match &row.category_name {
                Some(name) if !name.trim().is_empty() => {
                    match sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM categories WHERE name = $1",
                    )
                    .bind(name)
                    .fetch_optional(&self.db)
                    .await?
                    {
                        Some(id) => id,
                        None => {
                            summary.errors.push(format!(
                                "Row {}: category '{}' not found",
                                row_number, name
                            ));
                            continue;
                        }
                    }
                }
                _ => {
                    summary
                        .errors
                        .push(format!("Row {}: category_name is required", row_number));
                    continue;
                }
            };

            let existing_id = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM products WHERE sku = $1",
            )
            .bind(&row.sku)
            .fetch_optional(&self.db)
            .await?;

            match existing_id {
                Some(_) if !update_existing => {
                    summary.errors.push(format!(
                        "Row {}: product with SKU '{}' already exists",
                        row_number, row.sku
                    ));
                }
                Some(product_id) => {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET name = $1, description = $2, barcode = $3, category_id = $4,
                            unit_price = $5, is_active = $6, updated_at = NOW()
                        WHERE id = $7
                        "#,
                    )
                    .bind(&row.name)
                    .bind(&row.description)
                    .bind(&row.barcode)
                    .bind(category_id)
                    .bind(row.unit_price)
                    .bind(row.is_active.unwrap_or(true))
                    .bind(product_id)
                    .execute(&self.db)
                    .await?;
                    summary.updated += 1;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO products (name, description, sku, barcode, category_id, unit_price, is_active)
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        "#,
                    )
                    .bind(&row.name)
                    .bind(&row.description)
                    .bind(&row.sku)
                    .bind(&row.barcode)
                    .bind(category_id)
                    .bind(row.unit_price)
                    .bind(row.is_active.unwrap_or(true))
                    .execute(&self.db)
                    .await?;
                    summary.created += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Import stock levels from CSV text
    ///
    /// Quantities go through a stock count per row so every imported
    /// change lands in the movement ledger. An existing level is an
    /// error unless `update_existing` is set.
    pub async fn import_stock_levels(
        &self,
        content: &str,
        update_existing: bool,
    ) -> AppResult<ImportSummary> {
        let (rows, parse_errors) = parse_csv_rows::<StockCsvRow>(content);
        let mut summary = ImportSummary {
            errors: parse_errors,
            ..Default::default()
        };

        for (row_number, row) in rows {
            if row.quantity < 0 {
                summary
                    .errors
                    .push(format!("Row {}: quantity cannot be negative", row_number));
                continue;
            }

            let product_id = match sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM products WHERE sku = $1",
            )
            .bind(&row.product_sku)
            .fetch_optional(&self.db)
            .await?
            {
                Some(id) => id,
                None => {
                    summary.errors.push(format!(
                        "Row {}: product with SKU '{}' not found",
                        row_number, row.product_sku
                    ));
                    continue;
                }
            };

            let warehouse_id = match sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM warehouses WHERE name = $1",
            )
            .bind(&row.warehouse_name)
            .fetch_optional(&self.db)
            .await?
            {
                Some(id) => id,
                None => {
                    summary.errors.push(format!(
                        "Row {}: warehouse '{}' not found",
                        row_number, row.warehouse_name
                    ));
                    continue;
                }
            };

            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stock_levels WHERE product_id = $1 AND warehouse_id = $2)",
            )
            .bind(product_id)
            .bind(warehouse_id)
            .fetch_one(&self.db)
            .await?;

            if exists && !update_existing {
                summary.errors.push(format!(
                    "Row {}: stock level already exists for '{}' in '{}'",
                    row_number, row.product_sku, row.warehouse_name
                ));
                continue;
            }

            let count = self
                .ledger
                .count(CountStockInput {
                    product_id,
                    warehouse_id,
                    counted_quantity: row.quantity,
                    notes: Some("CSV import".to_string()),
                })
                .await?;

            if row.reorder_level.is_some() || row.max_stock_level.is_some() {
                self.ledger
                    .update_stock_level(
                        count.stock_level.id,
                        UpdateStockLevelInput {
                            reorder_level: row.reorder_level,
                            max_stock_level: row.max_stock_level,
                        },
                    )
                    .await?;
            }

            if exists {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
        }

        Ok(summary)
    }

    /// Import suppliers from CSV text; rows are keyed by name
    pub async fn import_suppliers(
        &self,
        content: &str,
        update_existing: bool,
    ) -> AppResult<ImportSummary> {
        let (rows, parse_errors) = parse_csv_rows::<SupplierCsvRow>(content);
        let mut summary = ImportSummary {
            errors: parse_errors,
            ..Default::default()
        };

        for (row_number, row) in rows {
            if row.name.trim().is_empty() {
                summary
                    .errors
                    .push(format!("Row {}: name is required", row_number));
                continue;
            }

            let existing_id = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM suppliers WHERE name = $1",
            )
            .bind(&row.name)
            .fetch_optional(&self.db)
            .await?;

            match existing_id {
                Some(_) if !update_existing => {
                    summary.errors.push(format!(
                        "Row {}: supplier '{}' already exists",
                        row_number, row.name
                    ));
                }
                Some(supplier_id) => {
                    sqlx::query(
                        r#"
                        UPDATE suppliers
                        SET contact_person = $1, email = $2, phone = $3, address = $4,
                            tax_id = $5, payment_terms = $6, is_active = $7, updated_at = NOW()
                        WHERE id = $8
                        "#,
                    )
                    .bind(&row.contact_person)
                    .bind(&row.email)
                    .bind(&row.phone)
                    .bind(&row.address)
                    .bind(&row.tax_id)
                    .bind(&row.payment_terms)
                    .bind(row.is_active.unwrap_or(true))
                    .bind(supplier_id)
                    .execute(&self.db)
                    .await?;
                    summary.updated += 1;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO suppliers (name, contact_person, email, phone, address, tax_id, payment_terms, is_active)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        "#,
                    )
                    .bind(&row.name)
                    .bind(&row.contact_person)
                    .bind(&row.email)
                    .bind(&row.phone)
                    .bind(&row.address)
                    .bind(&row.tax_id)
                    .bind(&row.payment_terms)
                    .bind(row.is_active.unwrap_or(true))
                    .execute(&self.db)
                    .await?;
                    summary.created += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[derive(sqlx::FromRow)]
struct SupplierCsvRowDb {
    name: String,
    contact_person: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    tax_id: Option<String>,
    payment_terms: Option<String>,
    is_active: bool,
}

impl From<SupplierCsvRowDb> for SupplierCsvRow {
    fn from(row: SupplierCsvRowDb) -> Self {
        Self {
            name: row.name,
            contact_person: row.contact_person,
            email: row.email,
            phone: row.phone,
            address: row.address,
            tax_id: row.tax_id,
            payment_terms: row.payment_terms,
            is_active: Some(row.is_active),
        }
    }
}
