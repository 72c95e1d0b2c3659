//! Purchase order workflow tests
//!
//! Tests for order lifecycle logic:
//! - Status transition rules
//! - Order number format
//! - Receipt clamping against outstanding quantities
//! - Order total computation

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use wims_backend::services::purchase_order::{
    clamp_receipt, generate_order_number, resolve_patch, PurchaseOrderItem, PurchaseOrderStatus,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use PurchaseOrderStatus::*;

    /// Test the allowed forward transitions
    #[test]
    fn test_valid_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Ordered));
        assert!(Approved.can_transition_to(Received));
        assert!(Ordered.can_transition_to(Received));
    }

    /// Test cancellation is allowed from every non-terminal status
    #[test]
    fn test_cancellation_transitions() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(Ordered.can_transition_to(Cancelled));
    }

    /// Test rejected transitions
    #[test]
    fn test_invalid_transitions() {
        assert!(!Pending.can_transition_to(Ordered)); // skip approval
        assert!(!Pending.can_transition_to(Received)); // skip everything
        assert!(!Approved.can_transition_to(Pending)); // backward
        assert!(!Received.can_transition_to(Cancelled)); // from terminal
        assert!(!Cancelled.can_transition_to(Approved)); // from terminal
    }

    /// Test terminal statuses
    #[test]
    fn test_terminal_statuses() {
        assert!(Received.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Approved.is_terminal());
        assert!(!Ordered.is_terminal());
    }

    /// Test which statuses accept receipts
    #[test]
    fn test_receivable_statuses() {
        assert!(Approved.is_receivable());
        assert!(Ordered.is_receivable());
        assert!(!Pending.is_receivable());
        assert!(!Received.is_receivable());
        assert!(!Cancelled.is_receivable());
    }

    /// Test status wire names
    #[test]
    fn test_status_names() {
        assert_eq!(Pending.as_str(), "pending");
        assert_eq!(Approved.as_str(), "approved");
        assert_eq!(Ordered.as_str(), "ordered");
        assert_eq!(Received.as_str(), "received");
        assert_eq!(Cancelled.as_str(), "cancelled");
    }

    /// Test order number format: PO-YYYYMMDD-XXXXXXXX
    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PO");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    /// Test order numbers are unique across calls
    #[test]
    fn test_order_numbers_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }

    /// Test receipt clamping against the outstanding quantity
    #[test]
    fn test_receipt_clamping() {
        // 10 ordered, 0 received, asking for 4: all accepted
        assert_eq!(clamp_receipt(10, 0, 4), 4);
        // 10 ordered, 8 received, asking for 5: clamped to 2
        assert_eq!(clamp_receipt(10, 8, 5), 2);
        // Fully received already: nothing accepted
        assert_eq!(clamp_receipt(10, 10, 3), 0);
        // Over-received row cannot go negative
        assert_eq!(clamp_receipt(10, 12, 3), 0);
    }

    /// Test line item receipt bookkeeping
    #[test]
    fn test_item_receipt_bookkeeping() {
        let item = |quantity, received_quantity| PurchaseOrderItem {
            id: uuid::Uuid::new_v4(),
            purchase_order_id: uuid::Uuid::new_v4(),
            product_id: uuid::Uuid::new_v4(),
            quantity,
            unit_price: dec("1.00"),
            received_quantity,
        };

        let open = item(10, 4);
        assert_eq!(open.pending_quantity(), 6);
        assert!(!open.is_fully_received());

        let done = item(10, 10);
        assert_eq!(done.pending_quantity(), 0);
        assert!(done.is_fully_received());

        // Over-received lines stay complete and never report negative pending
        let over = item(10, 12);
        assert_eq!(over.pending_quantity(), 0);
        assert!(over.is_fully_received());
    }

    /// Test tri-state patch resolution for updatable order fields
    #[test]
    fn test_patch_resolution() {
        let stored = Some("keep me".to_string());

        // Absent field keeps the stored value
        assert_eq!(resolve_patch(None, stored.clone()), stored);
        // Explicit null clears it
        assert_eq!(resolve_patch(Some(None), stored.clone()), None);
        // A value replaces it
        assert_eq!(
            resolve_patch(Some(Some("new".to_string())), stored),
            Some("new".to_string())
        );
        // Clearing an already-empty field stays empty
        assert_eq!(resolve_patch::<String>(Some(None), None), None);
    }

    /// Test order total computation
    #[test]
    fn test_order_total() {
        let items = [(5, dec("10.50")), (2, dec("3.25"))];
        let total: Decimal = items
            .iter()
            .map(|(qty, price)| Decimal::from(*qty) * price)
            .sum();

        // 5 * 10.50 + 2 * 3.25 = 52.50 + 6.50 = 59.00
        assert_eq!(total, dec("59.00"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for ordered quantities
    fn ordered_strategy() -> impl Strategy<Value = i32> {
        1i32..=10_000
    }

    /// Strategy for any purchase order status
    fn status_strategy() -> impl Strategy<Value = PurchaseOrderStatus> {
        prop_oneof![
            Just(PurchaseOrderStatus::Pending),
            Just(PurchaseOrderStatus::Approved),
            Just(PurchaseOrderStatus::Ordered),
            Just(PurchaseOrderStatus::Received),
            Just(PurchaseOrderStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Accepted receipts never exceed the request or the outstanding amount
        #[test]
        fn prop_receipt_never_exceeds_outstanding(
            ordered in ordered_strategy(),
            already in 0i32..=10_000,
            requested in 0i32..=10_000
        ) {
            let accepted = clamp_receipt(ordered, already, requested);

            prop_assert!(accepted >= 0);
            prop_assert!(accepted <= requested);
            prop_assert!(already + accepted <= ordered.max(already));
        }

        /// Receiving the outstanding amount exactly completes the line
        #[test]
        fn prop_receiving_outstanding_completes(
            ordered in ordered_strategy(),
            already in 0i32..=10_000
        ) {
            let outstanding = (ordered - already).max(0);
            let accepted = clamp_receipt(ordered, already, outstanding);
            prop_assert_eq!(accepted, outstanding);
        }

        /// No transition ever leaves a terminal status
        #[test]
        fn prop_terminal_statuses_are_final(
            from in status_strategy(),
            to in status_strategy()
        ) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        /// Every receivable status can still be cancelled
        #[test]
        fn prop_receivable_implies_cancellable(status in status_strategy()) {
            if status.is_receivable() {
                prop_assert!(status.can_transition_to(PurchaseOrderStatus::Cancelled));
            }
        }

        /// Order totals are linear in quantity
        #[test]
        fn prop_total_linear_in_quantity(
            quantity in 1i32..=1000,
            price_cents in 1i64..=1_000_000
        ) {
            let price = Decimal::new(price_cents, 2);
            let total = Decimal::from(quantity) * price;
            let doubled = Decimal::from(quantity * 2) * price;

            prop_assert_eq!(doubled, total * Decimal::from(2));
        }
    }
}
