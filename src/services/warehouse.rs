//! Warehouse service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Warehouse service
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

/// Warehouse record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseInput {
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a warehouse
#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseInput {
    pub name: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

const WAREHOUSE_COLUMNS: &str = "id, name, location, address, is_active, created_at, updated_at";

impl WarehouseService {
    /// Create a new WarehouseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a warehouse
    pub async fn create(&self, input: CreateWarehouseInput) -> AppResult<Warehouse> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }

        let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            INSERT INTO warehouses (name, location, address)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            WAREHOUSE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(warehouse)
    }

    /// Get a warehouse by id
    pub async fn get(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {} FROM warehouses WHERE id = $1",
            WAREHOUSE_COLUMNS
        ))
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// List all warehouses
    pub async fn list(&self, is_active: Option<bool>) -> AppResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            SELECT {}
            FROM warehouses
            WHERE ($1::bool IS NULL OR is_active = $1)
            ORDER BY name
            "#,
            WAREHOUSE_COLUMNS
        ))
        .bind(is_active)
        .fetch_all(&self.db)
        .await?;

        Ok(warehouses)
    }

    /// Update a warehouse
    pub async fn update(
        &self,
        warehouse_id: Uuid,
        input: UpdateWarehouseInput,
    ) -> AppResult<Warehouse> {
        let existing = self.get(warehouse_id).await?;

        let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
            r#"
            UPDATE warehouses
            SET name = $1, location = $2, address = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            WAREHOUSE_COLUMNS
        ))
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.location.or(existing.location))
        .bind(input.address.or(existing.address))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(warehouse_id)
        .fetch_one(&self.db)
        .await?;

        Ok(warehouse)
    }

    /// Delete a warehouse; rejected while stock or movement history references it
    pub async fn delete(&self, warehouse_id: Uuid) -> AppResult<()> {
        self.get(warehouse_id).await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM stock_levels WHERE warehouse_id = $1)
                OR EXISTS(SELECT 1 FROM stock_movements WHERE warehouse_id = $1)
            "#,
        )
        .bind(warehouse_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "warehouse".to_string(),
                message: "Cannot delete a warehouse with stock or movement history".to_string(),
            });
        }

        sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(warehouse_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
