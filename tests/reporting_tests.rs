//! Reporting aggregation tests
//!
//! Tests for report arithmetic:
//! - Turnover rate calculation and rounding
//! - Stock percentage against maximum levels
//! - Valuation grouping and totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use wims_backend::services::reporting::{
    assemble_valuation_report, stock_percentage, turnover_rate, ValuationRow,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn valuation_row(warehouse_id: Uuid, warehouse_name: &str, quantity: i32, price: &str) -> ValuationRow {
    let unit_price = dec(price);
    ValuationRow {
        product_id: Uuid::new_v4(),
        product_name: "Widget".to_string(),
        sku: "WID-001".to_string(),
        unit_price,
        warehouse_id,
        warehouse_name: warehouse_name.to_string(),
        quantity,
        total_value: Decimal::from(quantity) * unit_price,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test a straightforward turnover rate
    #[test]
    fn test_turnover_rate() {
        // 300 units moved out over an average inventory of 100
        assert_eq!(turnover_rate(300, dec("100")), dec("3.00"));
    }

    /// Test turnover rounding to two decimal places
    #[test]
    fn test_turnover_rounding() {
        // 100 / 3 = 33.33...
        assert_eq!(turnover_rate(100, dec("3")), dec("33.33"));
    }

    /// Test turnover with no inventory is zero, not a division error
    #[test]
    fn test_turnover_zero_inventory() {
        assert_eq!(turnover_rate(50, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(turnover_rate(50, dec("-10")), Decimal::ZERO);
    }

    /// Test turnover with no outbound movement
    #[test]
    fn test_turnover_no_outbound() {
        assert_eq!(turnover_rate(0, dec("100")), dec("0.00"));
    }

    /// Test stock percentage calculation
    #[test]
    fn test_stock_percentage() {
        assert_eq!(stock_percentage(50, 200), dec("25.00"));
        assert_eq!(stock_percentage(200, 200), dec("100.00"));
        assert_eq!(stock_percentage(250, 200), dec("125.00")); // over-filled
    }

    /// Test stock percentage with no maximum configured
    #[test]
    fn test_stock_percentage_no_max() {
        assert_eq!(stock_percentage(50, 0), Decimal::ZERO);
        assert_eq!(stock_percentage(50, -1), Decimal::ZERO);
    }

    /// Test valuation grouping by warehouse
    #[test]
    fn test_valuation_grouping() {
        let main = Uuid::new_v4();
        let overflow = Uuid::new_v4();

        let report = assemble_valuation_report(vec![
            valuation_row(main, "Main", 10, "2.50"),
            valuation_row(main, "Main", 4, "10.00"),
            valuation_row(overflow, "Overflow", 3, "1.00"),
        ]);

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.warehouse_totals.len(), 2);

        let main_total = report
            .warehouse_totals
            .iter()
            .find(|w| w.warehouse_id == main)
            .unwrap();
        assert_eq!(main_total.total_value, dec("65.00")); // 25.00 + 40.00
        assert_eq!(main_total.item_count, 2);

        assert_eq!(report.grand_total, dec("68.00"));
    }

    /// Test an empty valuation report
    #[test]
    fn test_valuation_empty() {
        let report = assemble_valuation_report(vec![]);
        assert!(report.items.is_empty());
        assert!(report.warehouse_totals.is_empty());
        assert_eq!(report.grand_total, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for average inventory values
    fn inventory_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 10000.00
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Turnover rate is never negative
        #[test]
        fn prop_turnover_non_negative(
            total_out in 0i64..=1_000_000,
            avg in inventory_strategy()
        ) {
            prop_assert!(turnover_rate(total_out, avg) >= Decimal::ZERO);
        }

        /// Turnover rate always carries at most two decimal places
        #[test]
        fn prop_turnover_two_decimals(
            total_out in 0i64..=1_000_000,
            avg in inventory_strategy()
        ) {
            let rate = turnover_rate(total_out, avg);
            prop_assert_eq!(rate, rate.round_dp(2));
        }

        /// Stock percentage scales with quantity
        #[test]
        fn prop_stock_percentage_monotonic(
            quantity in 0i32..=10_000,
            max in 1i32..=10_000
        ) {
            let lower = stock_percentage(quantity, max);
            let higher = stock_percentage(quantity.saturating_add(max), max);
            prop_assert!(higher >= lower);
        }

        /// The grand total equals the sum of the warehouse subtotals
        #[test]
        fn prop_valuation_totals_consistent(
            quantities in prop::collection::vec((1i32..=500, 1i64..=100_000), 1..20),
            warehouse_count in 1usize..=4
        ) {
            let warehouses: Vec<Uuid> = (0..warehouse_count).map(|_| Uuid::new_v4()).collect();

            let items: Vec<ValuationRow> = quantities
                .iter()
                .enumerate()
                .map(|(i, (qty, price_cents))| {
                    let warehouse_id = warehouses[i % warehouses.len()];
                    valuation_row(
                        warehouse_id,
                        "W",
                        *qty,
                        &Decimal::new(*price_cents, 2).to_string(),
                    )
                })
                .collect();

            let expected_total: Decimal = items.iter().map(|i| i.total_value).sum();
            let report = assemble_valuation_report(items);

            let subtotal_sum: Decimal = report
                .warehouse_totals
                .iter()
                .map(|w| w.total_value)
                .sum();

            prop_assert_eq!(report.grand_total, expected_total);
            prop_assert_eq!(subtotal_sum, expected_total);

            let item_count_sum: i64 = report.warehouse_totals.iter().map(|w| w.item_count).sum();
            prop_assert_eq!(item_count_sum as usize, report.items.len());
        }
    }
}
