//! Stock ledger tests
//!
//! Tests for ledger decision logic:
//! - Quantity changes never drive a level below zero
//! - Movement type inference from the sign of a change
//! - Low stock detection against the reorder level

use proptest::prelude::*;

use wims_backend::services::stock_ledger::{
    apply_quantity_change, is_low_stock, MovementType,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test applying a positive change
    #[test]
    fn test_apply_positive_change() {
        assert_eq!(apply_quantity_change(10, 5), Some(15));
        assert_eq!(apply_quantity_change(0, 100), Some(100));
    }

    /// Test applying a negative change within the available quantity
    #[test]
    fn test_apply_negative_change() {
        assert_eq!(apply_quantity_change(10, -5), Some(5));
        assert_eq!(apply_quantity_change(10, -10), Some(0));
    }

    /// Test that an over-draw is refused
    #[test]
    fn test_apply_overdraw_refused() {
        assert_eq!(apply_quantity_change(10, -11), None);
        assert_eq!(apply_quantity_change(0, -1), None);
    }

    /// Test zero change is a no-op
    #[test]
    fn test_apply_zero_change() {
        assert_eq!(apply_quantity_change(42, 0), Some(42));
    }

    /// Test changes at the top of the representable range
    #[test]
    fn test_apply_change_at_capacity() {
        assert_eq!(apply_quantity_change(i32::MAX, 0), Some(i32::MAX));
        assert_eq!(apply_quantity_change(i32::MAX - 1, 1), Some(i32::MAX));
        // Past capacity is refused, not wrapped
        assert_eq!(apply_quantity_change(i32::MAX, 1), None);
        assert_eq!(apply_quantity_change(1, i32::MAX), None);
        assert_eq!(apply_quantity_change(0, i32::MIN), None);
    }

    /// Test movement type inference from sign
    #[test]
    fn test_movement_type_inference() {
        assert_eq!(MovementType::infer(5), MovementType::In);
        assert_eq!(MovementType::infer(0), MovementType::In);
        assert_eq!(MovementType::infer(-5), MovementType::Out);
    }

    /// Test movement type wire names
    #[test]
    fn test_movement_type_names() {
        assert_eq!(MovementType::In.as_str(), "in");
        assert_eq!(MovementType::Out.as_str(), "out");
        assert_eq!(MovementType::Transfer.as_str(), "transfer");
        assert_eq!(MovementType::Adjustment.as_str(), "adjustment");
    }

    /// Test low stock detection at, below, and above the reorder level
    #[test]
    fn test_low_stock_detection() {
        assert!(is_low_stock(5, 10));
        assert!(is_low_stock(10, 10)); // boundary: at the reorder level is low
        assert!(!is_low_stock(11, 10));
        assert!(is_low_stock(0, 0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for on-hand quantities, up to the full column range
    fn quantity_strategy() -> impl Strategy<Value = i32> {
        0i32..=i32::MAX
    }

    /// Strategy for signed quantity changes, full range
    fn change_strategy() -> impl Strategy<Value = i32> {
        i32::MIN..=i32::MAX
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// An applied change never yields a negative quantity, and never
        /// wraps past the representable range
        #[test]
        fn prop_no_negative_quantities(
            current in quantity_strategy(),
            change in change_strategy()
        ) {
            let exact = current as i64 + change as i64;
            match apply_quantity_change(current, change) {
                Some(next) => {
                    prop_assert!(next >= 0);
                    prop_assert_eq!(next as i64, exact);
                }
                None => prop_assert!(exact < 0 || exact > i32::MAX as i64),
            }
        }

        /// A change is accepted exactly when the result is representable
        #[test]
        fn prop_change_accepted_iff_covered(
            current in quantity_strategy(),
            change in change_strategy()
        ) {
            let exact = current as i64 + change as i64;
            let accepted = apply_quantity_change(current, change).is_some();
            prop_assert_eq!(accepted, (0..=i32::MAX as i64).contains(&exact));
        }

        /// A sequence of accepted changes sums exactly
        #[test]
        fn prop_sequence_of_changes_sums(
            start in quantity_strategy(),
            changes in prop::collection::vec(change_strategy(), 1..20)
        ) {
            let mut quantity = start;
            let mut applied = 0i64;

            for change in &changes {
                if let Some(next) = apply_quantity_change(quantity, *change) {
                    quantity = next;
                    applied += *change as i64;
                }
            }

            prop_assert_eq!(quantity as i64, start as i64 + applied);
        }

        /// Negative changes infer outbound movements, others inbound
        #[test]
        fn prop_inference_matches_sign(change in change_strategy()) {
            let inferred = MovementType::infer(change);
            if change < 0 {
                prop_assert_eq!(inferred, MovementType::Out);
            } else {
                prop_assert_eq!(inferred, MovementType::In);
            }
        }

        /// Low stock triggers exactly at or below the reorder level
        #[test]
        fn prop_low_stock_boundary(
            quantity in quantity_strategy(),
            reorder_level in quantity_strategy()
        ) {
            prop_assert_eq!(is_low_stock(quantity, reorder_level), quantity <= reorder_level);
        }

        /// Raising stock above the reorder level always clears the flag
        #[test]
        fn prop_low_stock_no_false_positive(
            reorder_level in quantity_strategy(),
            extra in 1i32..=1000
        ) {
            prop_assert!(!is_low_stock(reorder_level.saturating_add(extra), reorder_level));
        }
    }
}
