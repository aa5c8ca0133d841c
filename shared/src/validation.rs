//! Validation helpers for the Cantina point-of-sale system

use rust_decimal::Decimal;

use crate::models::{PaymentMethod, RecipeLine};

// ============================================================================
// Quantity and money validations
// ============================================================================

/// Validate a sale or recipe quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a monetary amount carries no negative sign
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate an opening or closing drawer balance
pub fn validate_balance(balance: Decimal) -> Result<(), &'static str> {
    if balance < Decimal::ZERO {
        return Err("Balance cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Recipe validations
// ============================================================================

/// Validate one recipe line before it is attached to a product
pub fn validate_recipe_line(quantity_required: Decimal, unit_measure: &str) -> Result<(), &'static str> {
    validate_quantity(quantity_required)?;
    if unit_measure.trim().is_empty() {
        return Err("Unit of measure is required");
    }
    Ok(())
}

/// Validate a whole recipe: ingredient ids must be unique per product
pub fn validate_recipe(lines: &[RecipeLine]) -> Result<(), &'static str> {
    for (i, line) in lines.iter().enumerate() {
        if lines[..i].iter().any(|l| l.inventory_id == line.inventory_id) {
            return Err("Duplicate ingredient in recipe");
        }
    }
    Ok(())
}

// ============================================================================
// Payment validations
// ============================================================================

/// Parse a payment method string, rejecting anything but cash/transfer
pub fn validate_payment_method(s: &str) -> Result<PaymentMethod, &'static str> {
    PaymentMethod::from_str(s).ok_or("Payment method must be 'cash' or 'transfer'")
}

/// Validate a table identifier is present and short enough for a badge
pub fn validate_table_identifier(identifier: &str) -> Result<(), &'static str> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err("Table identifier is required");
    }
    if trimmed.len() > 32 {
        return Err("Table identifier is too long");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(product: Uuid, ingredient: Uuid) -> RecipeLine {
        RecipeLine {
            id: Uuid::new_v4(),
            product_id: product,
            inventory_id: ingredient,
            quantity_required: dec("1.0"),
            unit_measure: "ml".to_string(),
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(dec("0.5")).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(dec("-1")).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(dec("120.50")).is_ok());
        assert!(validate_amount(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_recipe_line() {
        assert!(validate_recipe_line(dec("2"), "oz").is_ok());
        assert!(validate_recipe_line(Decimal::ZERO, "oz").is_err());
        assert!(validate_recipe_line(dec("2"), "  ").is_err());
    }

    #[test]
    fn test_validate_recipe_rejects_duplicate_ingredient() {
        let product = Uuid::new_v4();
        let gin = Uuid::new_v4();
        let tonic = Uuid::new_v4();

        assert!(validate_recipe(&[line(product, gin), line(product, tonic)]).is_ok());
        assert!(validate_recipe(&[line(product, gin), line(product, gin)]).is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert_eq!(validate_payment_method("cash"), Ok(PaymentMethod::Cash));
        assert_eq!(
            validate_payment_method("transfer"),
            Ok(PaymentMethod::Transfer)
        );
        assert!(validate_payment_method("card").is_err());
        assert!(validate_payment_method("").is_err());
    }

    #[test]
    fn test_validate_table_identifier() {
        assert!(validate_table_identifier("T-12").is_ok());
        assert!(validate_table_identifier("").is_err());
        assert!(validate_table_identifier("   ").is_err());
        assert!(validate_table_identifier(&"x".repeat(40)).is_err());
    }
}
