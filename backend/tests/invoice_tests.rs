//! Invoice and settlement tests
//!
//! Settlement creates at most one invoice per session and closes the
//! session in the same step; retrying returns the invoice the first call
//! created and leaves the session closed.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{PaymentMethod, SessionStatus};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory stand-in for the settlement transaction: a unique index over
/// session_id plus the session row it closes.
#[derive(Debug, Default)]
struct Settlement {
    invoices: HashMap<Uuid, (Uuid, Decimal, PaymentMethod)>,
    sessions: HashMap<Uuid, (SessionStatus, Option<String>)>,
}

impl Settlement {
    fn open_session(&mut self, tag: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .insert(id, (SessionStatus::Open, tag.map(|t| t.to_string())));
        id
    }

    /// generate_invoice: insert-or-fetch on the session_id key, then close
    /// the session and clear its tag, atomically.
    fn generate(
        &mut self,
        session_id: Uuid,
        total: Decimal,
        method: PaymentMethod,
    ) -> Result<Uuid, &'static str> {
        if !self.sessions.contains_key(&session_id) {
            return Err("session not found");
        }

        let invoice_id = match self.invoices.get(&session_id) {
            // duplicate call: the unique constraint absorbed the insert
            Some((existing, _, _)) => *existing,
            None => {
                let id = Uuid::new_v4();
                self.invoices.insert(session_id, (id, total, method));
                id
            }
        };

        self.sessions
            .insert(session_id, (SessionStatus::Closed, None));

        Ok(invoice_id)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Calling generate twice returns the same invoice id and leaves exactly
    /// one invoice row; the session closes on the first call and stays closed
    #[test]
    fn test_idempotent_invoice() {
        let mut s = Settlement::default();
        let session = s.open_session(Some("VIP"));

        let first = s.generate(session, dec("42.00"), PaymentMethod::Cash).unwrap();
        assert_eq!(s.sessions[&session].0, SessionStatus::Closed);

        let second = s.generate(session, dec("42.00"), PaymentMethod::Cash).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.invoices.len(), 1);
        assert_eq!(s.sessions[&session].0, SessionStatus::Closed);
    }

    /// Settlement clears the seating tag along with closing the session
    #[test]
    fn test_settlement_clears_tag() {
        let mut s = Settlement::default();
        let session = s.open_session(Some("terrace"));

        s.generate(session, dec("10.00"), PaymentMethod::Transfer).unwrap();

        let (status, tag) = &s.sessions[&session];
        assert_eq!(*status, SessionStatus::Closed);
        assert!(tag.is_none());
    }

    /// A duplicate call keeps the first call's amount, whatever the retry
    /// claims
    #[test]
    fn test_duplicate_keeps_original_amount() {
        let mut s = Settlement::default();
        let session = s.open_session(None);

        s.generate(session, dec("42.00"), PaymentMethod::Cash).unwrap();
        s.generate(session, dec("99.00"), PaymentMethod::Cash).unwrap();

        assert_eq!(s.invoices[&session].1, dec("42.00"));
    }

    /// Unknown sessions are rejected without creating anything
    #[test]
    fn test_unknown_session_rejected() {
        let mut s = Settlement::default();
        let result = s.generate(Uuid::new_v4(), dec("10.00"), PaymentMethod::Cash);

        assert!(result.is_err());
        assert!(s.invoices.is_empty());
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in [PaymentMethod::Cash, PaymentMethod::Transfer] {
            assert_eq!(PaymentMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::from_str("card"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn method_strategy() -> impl Strategy<Value = PaymentMethod> {
        prop_oneof![Just(PaymentMethod::Cash), Just(PaymentMethod::Transfer)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// However many times settlement is retried, one invoice row exists
        /// and every retry returns the same id
        #[test]
        fn prop_retries_collapse_to_one_invoice(
            amount in amount_strategy(),
            method in method_strategy(),
            retries in 1usize..10
        ) {
            let mut s = Settlement::default();
            let session = s.open_session(Some("tag"));

            let first = s.generate(session, amount, method).unwrap();
            for _ in 0..retries {
                let again = s.generate(session, amount, method).unwrap();
                prop_assert_eq!(first, again);
            }

            prop_assert_eq!(s.invoices.len(), 1);
            prop_assert_eq!(s.sessions[&session].0, SessionStatus::Closed);
        }

        /// Settled sessions never keep a tag
        #[test]
        fn prop_settled_sessions_untagged(
            amount in amount_strategy(),
            method in method_strategy(),
            tag in "[a-zA-Z]{1,12}"
        ) {
            let mut s = Settlement::default();
            let session = s.open_session(Some(&tag));

            s.generate(session, amount, method).unwrap();
            prop_assert!(s.sessions[&session].1.is_none());
        }
    }
}
