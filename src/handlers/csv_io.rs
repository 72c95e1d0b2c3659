//! HTTP handlers for CSV import/export endpoints
//!
//! Imports take a multipart form with a `file` field holding the CSV
//! text and an optional `update_existing` flag. Exports return CSV as
//! a file attachment.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::{AppError, AppResult};
use crate::services::csv_io::{CsvService, ImportSummary};
use crate::AppState;

/// Export products as CSV
pub async fn export_products(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = CsvService::new(state.db);
    let csv = service.export_products().await?;
    Ok(csv_attachment("products.csv", csv))
}

/// Export stock levels as CSV
pub async fn export_stock_levels(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = CsvService::new(state.db);
    let csv = service.export_stock_levels().await?;
    Ok(csv_attachment("stock_levels.csv", csv))
}

/// Export suppliers as CSV
pub async fn export_suppliers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let service = CsvService::new(state.db);
    let csv = service.export_suppliers().await?;
    Ok(csv_attachment("suppliers.csv", csv))
}

/// Import products from an uploaded CSV file
pub async fn import_products(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let (content, update_existing) = read_import_upload(&mut multipart).await?;
    let service = CsvService::new(state.db);
    let summary = service.import_products(&content, update_existing).await?;
    Ok(Json(summary))
}

/// Import stock levels from an uploaded CSV file
pub async fn import_stock_levels(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let (content, update_existing) = read_import_upload(&mut multipart).await?;
    let service = CsvService::new(state.db);
    let summary = service
        .import_stock_levels(&content, update_existing)
        .await?;
    Ok(Json(summary))
}

/// Import suppliers from an uploaded CSV file
pub async fn import_suppliers(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let (content, update_existing) = read_import_upload(&mut multipart).await?;
    let service = CsvService::new(state.db);
    let summary = service.import_suppliers(&content, update_existing).await?;
    Ok(Json(summary))
}

/// Wrap CSV text as a downloadable attachment response
fn csv_attachment(filename: &str, csv: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
}

/// Pull the CSV text and the update_existing flag out of a multipart form
async fn read_import_upload(multipart: &mut Multipart) -> AppResult<(String, bool)> {
    let mut content: Option<String> = None;
    let mut update_existing = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::ValidationError(format!("Invalid multipart payload: {}", e))
    })? {
        let name = field.name().map(str::to_string);
        let text = field.text().await.map_err(|e| {
            AppError::ValidationError(format!("Failed to read upload: {}", e))
        })?;

        match name.as_deref() {
            Some("file") => content = Some(text),
            Some("update_existing") => {
                update_existing = matches!(text.trim(), "true" | "1" | "yes");
            }
            _ => {}
        }
    }

    let content = content
        .ok_or_else(|| AppError::ValidationError("Missing 'file' field in upload".to_string()))?;

    Ok((content, update_existing))
}
