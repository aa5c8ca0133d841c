//! Cash drawer session tests
//!
//! One global register: a second open is a conflict. Closing fixes the
//! counted balance and the expected total (opening balance plus cash-method
//! invoice totals); the discrepancy is display-only.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{CashSessionStatus, PaymentMethod};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory stand-in for the cash drawer ledger
#[derive(Debug, Default)]
struct Register {
    sessions: Vec<(CashSessionStatus, Decimal, Option<Decimal>)>,
    /// (cash_session index, amount, method)
    invoices: Vec<(usize, Decimal, PaymentMethod)>,
}

impl Register {
    fn open(&mut self, opening_balance: Decimal) -> Result<usize, &'static str> {
        if self
            .sessions
            .iter()
            .any(|(status, _, _)| *status == CashSessionStatus::Open)
        {
            return Err("a cash session is already open");
        }
        self.sessions
            .push((CashSessionStatus::Open, opening_balance, None));
        Ok(self.sessions.len() - 1)
    }

    fn cash_sales(&self, session: usize) -> Decimal {
        self.invoices
            .iter()
            .filter(|(s, _, m)| *s == session && *m == PaymentMethod::Cash)
            .map(|(_, amount, _)| *amount)
            .sum()
    }

    fn total_expected(&self, session: usize) -> Decimal {
        self.sessions[session].1 + self.cash_sales(session)
    }

    fn close(&mut self, session: usize, counted: Decimal) -> Decimal {
        let expected = self.total_expected(session);
        self.sessions[session].0 = CashSessionStatus::Closed;
        self.sessions[session].2 = Some(counted);
        expected
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Opening while a session is open is a conflict and creates no row
    #[test]
    fn test_single_open_invariant() {
        let mut r = Register::default();
        r.open(dec("100")).unwrap();

        let second = r.open(dec("50"));
        assert!(second.is_err());
        assert_eq!(r.sessions.len(), 1);
    }

    /// A closed drawer frees the register for the next shift
    #[test]
    fn test_reopen_after_close() {
        let mut r = Register::default();
        let s = r.open(dec("100")).unwrap();
        r.close(s, dec("100"));

        assert!(r.open(dec("80")).is_ok());
        assert_eq!(r.sessions.len(), 2);
    }

    /// Expected total is opening balance plus cash-method invoices only
    #[test]
    fn test_expected_total_counts_cash_only() {
        let mut r = Register::default();
        let s = r.open(dec("100")).unwrap();
        r.invoices.push((s, dec("40.00"), PaymentMethod::Cash));
        r.invoices.push((s, dec("25.00"), PaymentMethod::Transfer));
        r.invoices.push((s, dec("10.00"), PaymentMethod::Cash));

        assert_eq!(r.cash_sales(s), dec("50.00"));
        assert_eq!(r.total_expected(s), dec("150.00"));
    }

    /// An empty drawer session expects exactly its opening balance
    #[test]
    fn test_expected_total_no_sales() {
        let mut r = Register::default();
        let s = r.open(dec("75.50")).unwrap();

        assert_eq!(r.total_expected(s), dec("75.50"));
    }

    /// The discrepancy (counted − expected) is derived for display, never
    /// stored: closing persists the counted balance and the expected total
    #[test]
    fn test_discrepancy_is_display_only() {
        let mut r = Register::default();
        let s = r.open(dec("100")).unwrap();
        r.invoices.push((s, dec("50.00"), PaymentMethod::Cash));

        let expected = r.close(s, dec("145.00"));
        let discrepancy = dec("145.00") - expected;

        assert_eq!(expected, dec("150.00"));
        assert_eq!(discrepancy, dec("-5.00"));
        // the register kept counted balance and status, nothing else
        assert_eq!(r.sessions[s].0, CashSessionStatus::Closed);
        assert_eq!(r.sessions[s].2, Some(dec("145.00")));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [CashSessionStatus::Open, CashSessionStatus::Closed] {
            assert_eq!(CashSessionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(CashSessionStatus::from_str("Open"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn method_strategy() -> impl Strategy<Value = PaymentMethod> {
        prop_oneof![Just(PaymentMethod::Cash), Just(PaymentMethod::Transfer)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// At most one open session, no matter the open/close sequence
        #[test]
        fn prop_never_two_open(opens in prop::collection::vec(amount_strategy(), 2..8)) {
            let mut r = Register::default();
            let mut succeeded = 0;
            for opening in &opens {
                if r.open(*opening).is_ok() {
                    succeeded += 1;
                }
            }

            prop_assert_eq!(succeeded, 1);
            let open_count = r
                .sessions
                .iter()
                .filter(|(s, _, _)| *s == CashSessionStatus::Open)
                .count();
            prop_assert_eq!(open_count, 1);
        }

        /// Expected total is exactly opening + Σ cash invoices
        #[test]
        fn prop_expected_total_formula(
            opening in amount_strategy(),
            invoices in prop::collection::vec((amount_strategy(), method_strategy()), 0..10)
        ) {
            let mut r = Register::default();
            let s = r.open(opening).unwrap();

            let mut cash_sum = Decimal::ZERO;
            for (amount, method) in &invoices {
                r.invoices.push((s, *amount, *method));
                if *method == PaymentMethod::Cash {
                    cash_sum += *amount;
                }
            }

            prop_assert_eq!(r.total_expected(s), opening + cash_sum);
        }

        /// Transfer-method invoices never move the expected drawer contents
        #[test]
        fn prop_transfers_never_counted(
            opening in amount_strategy(),
            transfers in prop::collection::vec(amount_strategy(), 1..10)
        ) {
            let mut r = Register::default();
            let s = r.open(opening).unwrap();
            for amount in &transfers {
                r.invoices.push((s, *amount, PaymentMethod::Transfer));
            }

            prop_assert_eq!(r.total_expected(s), opening);
        }
    }
}
