//! Ticket state machine tests
//!
//! Pending is the only live state; approval and rejection are terminal.
//! Only approval touches inventory, and deleting a ticket never restores
//! what approval deducted.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{TicketDetail, TicketStatus};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn detail(quantity: &str, unit_price: &str) -> TicketDetail {
    TicketDetail {
        id: Uuid::new_v4(),
        ticket_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        quantity: dec(quantity),
        unit_price_at_sale: dec(unit_price),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_pending_can_reach_both_terminals() {
        assert!(TicketStatus::Pending.can_transition_to(TicketStatus::Approved));
        assert!(TicketStatus::Pending.can_transition_to(TicketStatus::Rejected));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [TicketStatus::Approved, TicketStatus::Rejected] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(TicketStatus::Pending));
            assert!(!terminal.can_transition_to(TicketStatus::Approved));
            assert!(!terminal.can_transition_to(TicketStatus::Rejected));
        }
    }

    #[test]
    fn test_pending_is_not_a_transition_target() {
        assert!(!TicketStatus::Pending.can_transition_to(TicketStatus::Pending));
        assert!(!TicketStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TicketStatus::Pending,
            TicketStatus::Approved,
            TicketStatus::Rejected,
        ] {
            assert_eq!(TicketStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::from_str("cancelled"), None);
        assert_eq!(TicketStatus::from_str("Pending"), None);
    }

    /// Subtotals are quantity × the price captured at sale time
    #[test]
    fn test_detail_subtotal() {
        let d = detail("3", "4.50");
        assert_eq!(d.subtotal(), dec("13.50"));
    }

    /// A later product price change cannot move an existing line's subtotal
    #[test]
    fn test_snapshot_price_immune_to_product_changes() {
        let d = detail("2", "5.00");
        let subtotal_before = d.subtotal();

        // the menu price moving from 5.00 to 9.00 is invisible to the line
        let new_menu_price = dec("9.00");
        assert_ne!(new_menu_price, d.unit_price_at_sale);
        assert_eq!(d.subtotal(), subtotal_before);
    }

    /// Ticket totals sum the line subtotals
    #[test]
    fn test_ticket_total_sums_lines() {
        let details = [detail("2", "5.00"), detail("1", "12.00"), detail("4", "1.25")];
        let total: Decimal = details.iter().map(|d| d.subtotal()).sum();
        assert_eq!(total, dec("27.00"));
    }

    /// Rejection has no inventory effect: modelled as a status-only change
    #[test]
    fn test_reject_never_deducts() {
        let stock_before = dec("40");
        let status = TicketStatus::Pending;

        // rejecting is a pure status transition
        assert!(status.can_transition_to(TicketStatus::Rejected));
        let stock_after = stock_before;

        assert_eq!(stock_after, stock_before);
    }

    /// Deleting an approved ticket does not restore its deduction
    #[test]
    fn test_delete_approved_keeps_deduction() {
        let mut stock = dec("40");
        let quantity = dec("3");

        // approval deducts
        stock -= quantity;
        assert_eq!(stock, dec("37"));

        // deletion of the approved ticket is record-keeping only
        let deleted = true;
        assert!(deleted);
        assert_eq!(stock, dec("37"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = TicketStatus> {
        prop_oneof![
            Just(TicketStatus::Pending),
            Just(TicketStatus::Approved),
            Just(TicketStatus::Rejected),
        ]
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// No transition ever leaves a terminal state
        #[test]
        fn prop_terminal_states_absorb(from in status_strategy(), to in status_strategy()) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        /// Every allowed transition starts at pending and ends terminal
        #[test]
        fn prop_transitions_pending_to_terminal(from in status_strategy(), to in status_strategy()) {
            if from.can_transition_to(to) {
                prop_assert_eq!(from, TicketStatus::Pending);
                prop_assert!(to.is_terminal());
            }
        }

        /// Subtotal is always quantity × snapshotted price
        #[test]
        fn prop_subtotal_math(quantity in quantity_strategy(), price in price_strategy()) {
            let d = TicketDetail {
                id: Uuid::new_v4(),
                ticket_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity,
                unit_price_at_sale: price,
            };
            prop_assert_eq!(d.subtotal(), quantity * price);
        }

        /// A ticket total never depends on line order
        #[test]
        fn prop_total_order_independent(
            lines in prop::collection::vec((quantity_strategy(), price_strategy()), 1..10)
        ) {
            let details: Vec<TicketDetail> = lines
                .iter()
                .map(|(q, p)| TicketDetail {
                    id: Uuid::new_v4(),
                    ticket_id: Uuid::new_v4(),
                    product_id: Uuid::new_v4(),
                    quantity: *q,
                    unit_price_at_sale: *p,
                })
                .collect();

            let total: Decimal = details.iter().map(|d| d.subtotal()).sum();
            let total_rev: Decimal = details.iter().rev().map(|d| d.subtotal()).sum();

            prop_assert_eq!(total, total_rev);
        }
    }
}
