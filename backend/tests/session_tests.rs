//! Table session lifecycle tests
//!
//! A table identifier holds at most one open session; closing always clears
//! the seating tag, and reopening a table never resurrects an old tag.

use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use shared::models::SessionStatus;
use shared::validate_table_identifier;

/// In-memory stand-in for the session table with its partial unique index
#[derive(Debug, Default)]
struct Floor {
    sessions: HashMap<Uuid, (String, Option<String>, SessionStatus)>,
}

impl Floor {
    /// INSERT guarded by the one-open-per-table unique index
    fn open(&mut self, table: &str, tag: Option<&str>) -> Result<Uuid, &'static str> {
        if self
            .sessions
            .values()
            .any(|(t, _, status)| t == table && *status == SessionStatus::Open)
        {
            return Err("table already has an open session");
        }
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            (
                table.to_string(),
                tag.map(|t| t.to_string()),
                SessionStatus::Open,
            ),
        );
        Ok(id)
    }

    /// Close clears the tag in the same step
    fn close(&mut self, id: Uuid) -> Result<(), &'static str> {
        let session = self.sessions.get_mut(&id).ok_or("session not found")?;
        session.1 = None;
        session.2 = SessionStatus::Closed;
        Ok(())
    }

    fn tag(&self, id: Uuid) -> Option<&str> {
        self.sessions.get(&id).and_then(|(_, tag, _)| tag.as_deref())
    }

    fn status(&self, id: Uuid) -> SessionStatus {
        self.sessions[&id].2
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A session opened with tag "VIP" and then closed has no tag, and
    /// reopening the same table does not resurrect it
    #[test]
    fn test_close_clears_tag() {
        let mut floor = Floor::default();
        let first = floor.open("T-1", Some("VIP")).unwrap();
        assert_eq!(floor.tag(first), Some("VIP"));

        floor.close(first).unwrap();
        assert_eq!(floor.tag(first), None);
        assert_eq!(floor.status(first), SessionStatus::Closed);

        let second = floor.open("T-1", None).unwrap();
        assert_eq!(floor.tag(second), None);
    }

    /// A new tag on reopen is the only way a tag comes back
    #[test]
    fn test_reopen_takes_new_tag() {
        let mut floor = Floor::default();
        let first = floor.open("T-1", Some("VIP")).unwrap();
        floor.close(first).unwrap();

        let second = floor.open("T-1", Some("terrace")).unwrap();
        assert_eq!(floor.tag(second), Some("terrace"));
        assert_eq!(floor.tag(first), None);
    }

    /// Two opens of the same table conflict while the first is open
    #[test]
    fn test_double_open_conflicts() {
        let mut floor = Floor::default();
        floor.open("T-1", None).unwrap();

        assert!(floor.open("T-1", Some("late")).is_err());
        assert_eq!(floor.sessions.len(), 1);
    }

    /// Different tables coexist
    #[test]
    fn test_tables_are_independent() {
        let mut floor = Floor::default();
        floor.open("T-1", None).unwrap();
        assert!(floor.open("T-2", None).is_ok());
    }

    #[test]
    fn test_table_identifier_validation() {
        assert!(validate_table_identifier("T-12").is_ok());
        assert!(validate_table_identifier("bar").is_ok());
        assert!(validate_table_identifier("").is_err());
        assert!(validate_table_identifier("  ").is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// At most one open session per table, regardless of the sequence of
        /// opens and closes
        #[test]
        fn prop_one_open_per_table(
            ops in prop::collection::vec(prop::bool::ANY, 1..20),
            table in "[A-Z]-[0-9]{1,2}"
        ) {
            let mut floor = Floor::default();
            let mut current: Option<Uuid> = None;

            for should_open in ops {
                if should_open {
                    if let Ok(id) = floor.open(&table, None) {
                        current = Some(id);
                    }
                } else if let Some(id) = current.take() {
                    floor.close(id).unwrap();
                }

                let open_count = floor
                    .sessions
                    .values()
                    .filter(|(t, _, s)| *t == table && *s == SessionStatus::Open)
                    .count();
                prop_assert!(open_count <= 1);
            }
        }

        /// Closed sessions never carry a tag
        #[test]
        fn prop_closed_sessions_untagged(
            tag in "[a-zA-Z]{1,10}",
            table in "[A-Z]-[0-9]{1,2}"
        ) {
            let mut floor = Floor::default();
            let id = floor.open(&table, Some(&tag)).unwrap();
            floor.close(id).unwrap();

            prop_assert!(floor.tag(id).is_none());
            prop_assert_eq!(floor.status(id), SessionStatus::Closed);
        }
    }
}
