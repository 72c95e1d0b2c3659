//! CSV import/export tests
//!
//! Tests for CSV parsing and serialization:
//! - Typed row parsing with per-row error collection
//! - Header handling and row numbering
//! - Low stock alert message formatting

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use wims_backend::services::csv_io::{
    parse_csv_rows, rows_to_csv, ProductCsvRow, StockCsvRow, SupplierCsvRow,
};
use wims_backend::services::notification::low_stock_alert;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test parsing well-formed product rows
    #[test]
    fn test_parse_product_rows() {
        let csv = "name,sku,description,barcode,category_name,unit_price,is_active\n\
                   Widget,WID-001,A widget,123456,Hardware,9.99,true\n\
                   Gadget,GAD-002,,,Hardware,,\n";

        let (rows, errors) = parse_csv_rows::<ProductCsvRow>(csv);

        assert!(errors.is_empty());
        assert_eq!(rows.len(), 2);

        let (row_number, widget) = &rows[0];
        assert_eq!(*row_number, 1);
        assert_eq!(widget.name, "Widget");
        assert_eq!(widget.sku, "WID-001");
        assert_eq!(widget.unit_price, Some(Decimal::from_str("9.99").unwrap()));
        assert_eq!(widget.is_active, Some(true));

        let (_, gadget) = &rows[1];
        assert_eq!(gadget.unit_price, None);
        assert_eq!(gadget.is_active, None);
    }

    /// Test that a malformed row becomes an error, not a failed parse
    #[test]
    fn test_parse_collects_row_errors() {
        let csv = "product_sku,warehouse_name,quantity,reorder_level,max_stock_level\n\
                   WID-001,Main,50,10,100\n\
                   WID-002,Main,not_a_number,,\n\
                   WID-003,Overflow,7,,\n";

        let (rows, errors) = parse_csv_rows::<StockCsvRow>(csv);

        assert_eq!(rows.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Row 2:"));

        // Surviving rows keep their original numbering
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[1].0, 3);
    }

    /// Test that surrounding whitespace is trimmed
    #[test]
    fn test_parse_trims_whitespace() {
        let csv = "product_sku,warehouse_name,quantity,reorder_level,max_stock_level\n\
                   \" WID-001 \", Main , 50 ,,\n";

        let (rows, errors) = parse_csv_rows::<StockCsvRow>(csv);

        assert!(errors.is_empty());
        assert_eq!(rows[0].1.product_sku, "WID-001");
        assert_eq!(rows[0].1.warehouse_name, "Main");
        assert_eq!(rows[0].1.quantity, 50);
    }

    /// Test empty input yields no rows and no errors
    #[test]
    fn test_parse_empty_input() {
        let (rows, errors) = parse_csv_rows::<SupplierCsvRow>("");
        assert!(rows.is_empty());
        assert!(errors.is_empty());
    }

    /// Test serialization emits a header row
    #[test]
    fn test_serialize_emits_header() {
        let rows = vec![StockCsvRow {
            product_sku: "WID-001".to_string(),
            warehouse_name: "Main".to_string(),
            quantity: 50,
            reorder_level: Some(10),
            max_stock_level: Some(100),
        }];

        let csv = rows_to_csv(&rows).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "product_sku,warehouse_name,quantity,reorder_level,max_stock_level"
        );
        assert_eq!(lines.next().unwrap(), "WID-001,Main,50,10,100");
    }

    /// Test serializing an empty slice yields empty output
    #[test]
    fn test_serialize_empty() {
        let csv = rows_to_csv::<StockCsvRow>(&[]).unwrap();
        assert!(csv.is_empty());
    }

    /// Test the low stock alert title and message content
    #[test]
    fn test_low_stock_alert_format() {
        let (title, message) = low_stock_alert("Widget", "WID-001", "Main", 3, 10);

        assert_eq!(title, "Low Stock Alert - Widget");
        assert!(message.contains("WID-001"));
        assert!(message.contains("Main"));
        assert!(message.contains("3 on hand"));
        assert!(message.contains("reorder level 10"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for SKU-like strings without CSV metacharacters
    fn sku_strategy() -> impl Strategy<Value = String> {
        "[A-Z]{3}-[0-9]{3}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Serialized stock rows parse back unchanged
        #[test]
        fn prop_stock_rows_survive_serialization(
            skus in prop::collection::vec(sku_strategy(), 1..10),
            quantities in prop::collection::vec(0i32..=100_000, 10)
        ) {
            let rows: Vec<StockCsvRow> = skus
                .iter()
                .zip(quantities.iter())
                .map(|(sku, qty)| StockCsvRow {
                    product_sku: sku.clone(),
                    warehouse_name: "Main".to_string(),
                    quantity: *qty,
                    reorder_level: None,
                    max_stock_level: None,
                })
                .collect();

            let csv = rows_to_csv(&rows).unwrap();
            let (parsed, errors) = parse_csv_rows::<StockCsvRow>(&csv);

            prop_assert!(errors.is_empty());
            prop_assert_eq!(parsed.len(), rows.len());

            for ((_, parsed_row), original) in parsed.iter().zip(rows.iter()) {
                prop_assert_eq!(&parsed_row.product_sku, &original.product_sku);
                prop_assert_eq!(parsed_row.quantity, original.quantity);
            }
        }

        /// Every data row ends up either parsed or reported, never dropped
        #[test]
        fn prop_no_row_silently_dropped(
            good_count in 0usize..=10,
            bad_count in 0usize..=10
        ) {
            let mut csv = String::from(
                "product_sku,warehouse_name,quantity,reorder_level,max_stock_level\n",
            );
            for i in 0..good_count {
                csv.push_str(&format!("SKU-{:03},Main,{},,\n", i, i * 5));
            }
            for _ in 0..bad_count {
                csv.push_str("SKU-BAD,Main,not_a_number,,\n");
            }

            let (rows, errors) = parse_csv_rows::<StockCsvRow>(&csv);

            prop_assert_eq!(rows.len(), good_count);
            prop_assert_eq!(errors.len(), bad_count);
        }
    }
}
