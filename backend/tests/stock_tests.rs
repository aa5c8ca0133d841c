//! Stock validation and recipe deduction tests
//!
//! Covers the order-to-inventory workflow invariants:
//! - direct products deduct their own stock, nothing else
//! - composed products deduct every ingredient, all or nothing
//! - a shortage on any line blocks the whole approval

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{SellableItem, Shortage, StockCheck};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory stand-in for the inventory ledger
#[derive(Debug, Clone)]
struct Ledger {
    stock: HashMap<Uuid, (String, Decimal)>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            stock: HashMap::new(),
        }
    }

    fn with(mut self, id: Uuid, name: &str, stock: Decimal) -> Self {
        self.stock.insert(id, (name.to_string(), stock));
        self
    }

    fn available(&self, id: Uuid) -> Decimal {
        self.stock.get(&id).map(|(_, s)| *s).unwrap_or(Decimal::ZERO)
    }

    fn name(&self, id: Uuid) -> String {
        self.stock
            .get(&id)
            .map(|(n, _)| n.clone())
            .unwrap_or_default()
    }
}

/// One sale line resolved to its per-ingredient requirements
fn requirements(item: &SellableItem, quantity: Decimal) -> Vec<(Uuid, Decimal, String)> {
    match item {
        SellableItem::Direct { inventory_id } => {
            vec![(*inventory_id, quantity, "unit".to_string())]
        }
        SellableItem::Composed { lines, .. } => lines
            .iter()
            .map(|l| {
                (
                    l.inventory_id,
                    l.quantity_required * quantity,
                    l.unit_measure.clone(),
                )
            })
            .collect(),
    }
}

/// The validation pass: every failing ingredient, not just the first
fn check_stock(ledger: &Ledger, item: &SellableItem, quantity: Decimal) -> StockCheck {
    let mut insufficient = Vec::new();
    for (id, required, unit) in requirements(item, quantity) {
        let available = ledger.available(id);
        if available < required {
            insufficient.push(Shortage {
                ingredient_name: ledger.name(id),
                available,
                required,
                unit_measure: unit,
            });
        }
    }
    StockCheck::from_shortages(insufficient)
}

/// The approval pass over a whole ticket: validate every line, then deduct.
/// Returns the ledger untouched when any line falls short.
fn approve_ticket(
    ledger: &Ledger,
    lines: &[(SellableItem, Decimal)],
) -> Result<Ledger, Shortage> {
    // fold requirements across all lines so shared ingredients add up
    let mut needed: Vec<(Uuid, Decimal, String)> = Vec::new();
    for (item, quantity) in lines {
        for (id, required, unit) in requirements(item, *quantity) {
            match needed.iter_mut().find(|(nid, _, _)| *nid == id) {
                Some((_, total, _)) => *total += required,
                None => needed.push((id, required, unit)),
            }
        }
    }

    for (id, required, unit) in &needed {
        let available = ledger.available(*id);
        if available < *required {
            return Err(Shortage {
                ingredient_name: ledger.name(*id),
                available,
                required: *required,
                unit_measure: unit.clone(),
            });
        }
    }

    let mut after = ledger.clone();
    for (id, required, _) in &needed {
        if let Some((_, stock)) = after.stock.get_mut(id) {
            *stock -= *required;
        }
    }
    Ok(after)
}

fn direct(id: Uuid) -> SellableItem {
    SellableItem::Direct { inventory_id: id }
}

fn composed(product: Uuid, lines: &[(Uuid, &str, &str)]) -> SellableItem {
    SellableItem::Composed {
        product_id: product,
        lines: lines
            .iter()
            .map(|(id, qty, unit)| shared::models::RecipeLine {
                id: Uuid::new_v4(),
                product_id: product,
                inventory_id: *id,
                quantity_required: dec(qty),
                unit_measure: unit.to_string(),
            })
            .collect(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Approving a quantity-3 line for a recipe-less product decrements that
    /// product's own stock by exactly 3 and nothing else
    #[test]
    fn test_direct_product_deduction() {
        let beer = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ledger = Ledger::new()
            .with(beer, "Bottled beer", dec("24"))
            .with(other, "Gin", dec("700"));

        let after = approve_ticket(&ledger, &[(direct(beer), dec("3"))]).unwrap();

        assert_eq!(after.available(beer), dec("21"));
        assert_eq!(after.available(other), dec("700"));
    }

    /// Recipe {A: 2/unit, B: 1/unit} at quantity 4 deducts A by 8 and B by 4
    #[test]
    fn test_composed_product_deduction() {
        let gin = Uuid::new_v4();
        let tonic = Uuid::new_v4();
        let product = Uuid::new_v4();
        let ledger = Ledger::new()
            .with(gin, "Gin", dec("100"))
            .with(tonic, "Tonic", dec("50"));

        let item = composed(product, &[(gin, "2", "oz"), (tonic, "1", "bottle")]);
        let after = approve_ticket(&ledger, &[(item, dec("4"))]).unwrap();

        assert_eq!(after.available(gin), dec("92"));
        assert_eq!(after.available(tonic), dec("46"));
    }

    /// A shortage on any ingredient leaves every stock untouched, including
    /// ingredients that did have enough
    #[test]
    fn test_insufficient_stock_blocks_whole_ticket() {
        let gin = Uuid::new_v4();
        let tonic = Uuid::new_v4();
        let product = Uuid::new_v4();
        let ledger = Ledger::new()
            .with(gin, "Gin", dec("100"))
            .with(tonic, "Tonic", dec("2"));

        let item = composed(product, &[(gin, "2", "oz"), (tonic, "1", "bottle")]);
        let result = approve_ticket(&ledger, &[(item, dec("4"))]);

        let shortage = result.unwrap_err();
        assert_eq!(shortage.ingredient_name, "Tonic");
        assert_eq!(shortage.available, dec("2"));
        assert_eq!(shortage.required, dec("4"));
        // ledger untouched by construction: approve_ticket returned Err
        assert_eq!(ledger.available(gin), dec("100"));
        assert_eq!(ledger.available(tonic), dec("2"));
    }

    /// The check pass reports every failing ingredient, not just the first
    #[test]
    fn test_check_collects_all_shortages() {
        let gin = Uuid::new_v4();
        let tonic = Uuid::new_v4();
        let lime = Uuid::new_v4();
        let product = Uuid::new_v4();
        let ledger = Ledger::new()
            .with(gin, "Gin", dec("1"))
            .with(tonic, "Tonic", dec("0"))
            .with(lime, "Lime", dec("100"));

        let item = composed(
            product,
            &[(gin, "2", "oz"), (tonic, "1", "bottle"), (lime, "1", "pc")],
        );
        let check = check_stock(&ledger, &item, dec("2"));

        assert!(!check.has_stock);
        assert_eq!(check.insufficient_stock.len(), 2);
        assert_eq!(check.insufficient_stock[0].ingredient_name, "Gin");
        assert_eq!(check.insufficient_stock[1].ingredient_name, "Tonic");
    }

    /// A direct product with no inventory row counts as zero available
    #[test]
    fn test_missing_inventory_is_zero_available() {
        let ghost = Uuid::new_v4();
        let ledger = Ledger::new();

        let check = check_stock(&ledger, &direct(ghost), dec("1"));

        assert!(!check.has_stock);
        assert_eq!(check.insufficient_stock[0].available, Decimal::ZERO);
        assert_eq!(check.insufficient_stock[0].required, dec("1"));
    }

    /// Exact stock passes: available == required is sufficient
    #[test]
    fn test_exact_stock_is_sufficient() {
        let beer = Uuid::new_v4();
        let ledger = Ledger::new().with(beer, "Beer", dec("3"));

        let check = check_stock(&ledger, &direct(beer), dec("3"));
        assert!(check.has_stock);

        let after = approve_ticket(&ledger, &[(direct(beer), dec("3"))]).unwrap();
        assert_eq!(after.available(beer), Decimal::ZERO);
    }

    /// Two lines sharing an ingredient must cover their combined requirement
    #[test]
    fn test_shared_ingredient_requirements_add_up() {
        let gin = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let ledger = Ledger::new().with(gin, "Gin", dec("5"));

        let gt = composed(p1, &[(gin, "2", "oz")]);
        let martini = composed(p2, &[(gin, "3", "oz")]);

        // 2 + 3 = 5 fits exactly
        let after = approve_ticket(
            &ledger,
            &[(gt.clone(), dec("1")), (martini.clone(), dec("1"))],
        )
        .unwrap();
        assert_eq!(after.available(gin), Decimal::ZERO);

        // 2×2 + 3 = 7 does not, even though each line alone would pass
        let result = approve_ticket(&ledger, &[(gt, dec("2")), (martini, dec("1"))]);
        assert!(result.is_err());
    }

    /// Resolution shape: no recipe lines means direct
    #[test]
    fn test_sellable_item_requirements() {
        let id = Uuid::new_v4();
        let item = direct(id);
        assert!(item.is_direct());
        assert_eq!(item.requirements(), vec![(id, Decimal::ONE)]);

        let gin = Uuid::new_v4();
        let product = Uuid::new_v4();
        let item = composed(product, &[(gin, "2.5", "oz")]);
        assert!(!item.is_direct());
        assert_eq!(item.requirements(), vec![(gin, dec("2.5"))]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 100.0
    }

    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 1)) // 0.0 to 10000.0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Direct deduction removes exactly the sold quantity
        #[test]
        fn prop_direct_deduction_exact(
            stock in stock_strategy(),
            quantity in quantity_strategy()
        ) {
            let id = Uuid::new_v4();
            let ledger = Ledger::new().with(id, "Item", stock);
            let result = approve_ticket(&ledger, &[(direct(id), quantity)]);

            if stock >= quantity {
                let after = result.unwrap();
                prop_assert_eq!(after.available(id), stock - quantity);
            } else {
                prop_assert!(result.is_err());
            }
        }

        /// Composed deduction scales every ingredient by the sold quantity
        #[test]
        fn prop_composed_deduction_scales(
            per_unit in quantity_strategy(),
            quantity in quantity_strategy()
        ) {
            let gin = Uuid::new_v4();
            let product = Uuid::new_v4();
            let required = per_unit * quantity;
            let ledger = Ledger::new().with(gin, "Gin", required);

            let item = SellableItem::Composed {
                product_id: product,
                lines: vec![shared::models::RecipeLine {
                    id: Uuid::new_v4(),
                    product_id: product,
                    inventory_id: gin,
                    quantity_required: per_unit,
                    unit_measure: "ml".to_string(),
                }],
            };

            let after = approve_ticket(&ledger, &[(item, quantity)]).unwrap();
            prop_assert_eq!(after.available(gin), Decimal::ZERO);
        }

        /// Stock never goes negative through an approval
        #[test]
        fn prop_no_negative_stock(
            stock in stock_strategy(),
            quantity in quantity_strategy()
        ) {
            let id = Uuid::new_v4();
            let ledger = Ledger::new().with(id, "Item", stock);

            if let Ok(after) = approve_ticket(&ledger, &[(direct(id), quantity)]) {
                prop_assert!(after.available(id) >= Decimal::ZERO);
            }
        }

        /// A failed approval must leave the ledger exactly as it was
        #[test]
        fn prop_failed_approval_mutates_nothing(
            stock in stock_strategy(),
            quantity in quantity_strategy()
        ) {
            let short = Uuid::new_v4();
            let plenty = Uuid::new_v4();
            let product = Uuid::new_v4();
            let ledger = Ledger::new()
                .with(short, "Short", Decimal::ZERO)
                .with(plenty, "Plenty", stock);

            let item = SellableItem::Composed {
                product_id: product,
                lines: vec![
                    shared::models::RecipeLine {
                        id: Uuid::new_v4(),
                        product_id: product,
                        inventory_id: plenty,
                        quantity_required: Decimal::ONE,
                        unit_measure: "ml".to_string(),
                    },
                    shared::models::RecipeLine {
                        id: Uuid::new_v4(),
                        product_id: product,
                        inventory_id: short,
                        quantity_required: Decimal::ONE,
                        unit_measure: "ml".to_string(),
                    },
                ],
            };

            prop_assert!(approve_ticket(&ledger, &[(item, quantity)]).is_err());
            prop_assert_eq!(ledger.available(plenty), stock);
            prop_assert_eq!(ledger.available(short), Decimal::ZERO);
        }

        /// check_stock reports shortages exactly for the failing ingredients
        #[test]
        fn prop_check_matches_approval(
            stock in stock_strategy(),
            quantity in quantity_strategy()
        ) {
            let id = Uuid::new_v4();
            let ledger = Ledger::new().with(id, "Item", stock);
            let item = direct(id);

            let check = check_stock(&ledger, &item, quantity);
            let approval = approve_ticket(&ledger, &[(item, quantity)]);

            prop_assert_eq!(check.has_stock, approval.is_ok());
        }
    }
}
