//! # Validation Module
//!
//! Field validators run by the API layer before any business logic.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: serde (HTTP body shape, enum names)                           │
//! │  Layer 2: THIS MODULE (lengths, ranges, id formats)                     │
//! │  Layer 3: SQLite (NOT NULL, UNIQUE, FOREIGN KEY, CHECK)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_LINE_QUANTITY, MAX_STOCK_LEVEL};

pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTE_LEN: usize = 1000;

/// Validates a required, bounded text field (names, categories).
///
/// ```rust
/// use vetpos_core::validation::validate_required_text;
///
/// assert!(validate_required_text("Rabies vaccine", "name", 200).is_ok());
/// assert!(validate_required_text("   ", "name", 200).is_err());
/// ```
pub fn validate_required_text(value: &str, field: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field such as notes.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max: usize,
) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a line or movement quantity: 1..=MAX_LINE_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level (quantity on hand or minimum stock): 0..=MAX_STOCK_LEVEL.
pub fn validate_stock_level(qty: i64, field: &str) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if qty > MAX_STOCK_LEVEL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }
    Ok(())
}

/// Validates a cent amount that may be zero (prices, drawer counts).
///
/// ```rust
/// use vetpos_core::validation::validate_non_negative_cents;
///
/// assert!(validate_non_negative_cents(0, "price").is_ok());
/// assert!(validate_non_negative_cents(-1, "price").is_err());
/// assert!(validate_non_negative_cents(i64::MAX / 2, "price").is_err());
/// ```
pub fn validate_non_negative_cents(cents: i64, field: &str) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_amount_ceiling(cents, 0, field)
}

/// Validates a cent amount that must be strictly positive (deposits, withdrawals).
pub fn validate_positive_cents(cents: i64, field: &str) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    validate_amount_ceiling(cents, 1, field)
}

fn validate_amount_ceiling(cents: i64, min: i64, field: &str) -> ValidationResult<()> {
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates a tax rate: 0%..=100%.
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_text() {
        assert!(validate_required_text("Deworming tablet", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
        // Counts characters, not bytes
        assert!(validate_required_text(&"ñ".repeat(200), "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text(&None, "notes", 10).is_ok());
        assert!(validate_optional_text(&Some("short".into()), "notes", 10).is_ok());
        assert!(validate_optional_text(&Some("far too long".into()), "notes", 10).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_stock_level(0, "min_stock").is_ok());
        assert!(validate_stock_level(-1, "min_stock").is_err());
        assert!(validate_positive_cents(1, "amount").is_ok());
        assert!(validate_positive_cents(0, "amount").is_err());
        assert!(validate_tax_rate_bps(1600).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_amount_ceilings() {
        assert!(validate_non_negative_cents(MAX_AMOUNT_CENTS, "price").is_ok());
        assert!(matches!(
            validate_non_negative_cents(MAX_AMOUNT_CENTS + 1, "price"),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));
        assert!(validate_positive_cents(i64::MAX, "amount").is_err());
        assert!(validate_stock_level(MAX_STOCK_LEVEL, "quantity").is_ok());
        assert!(validate_stock_level(MAX_STOCK_LEVEL + 1, "quantity").is_err());
    }
}
