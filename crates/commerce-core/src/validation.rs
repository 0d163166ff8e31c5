//! # Validation Module
//!
//! Input validation for order sheets and ledger amounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Staging / CLI (Rust)                                         │
//! │  └── THIS MODULE: sheet shape, quantities, prices                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Checkout Engine                                              │
//! │  └── THIS MODULE again: the sheet is re-validated before planning      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity > 0), CHECK (amount >= 0)                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use commerce_core::validation::{validate_quantity, validate_unit_price};
//!
//! validate_quantity(3).unwrap();
//! validate_unit_price(0).unwrap(); // free items are allowed
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::OrderSheetLine;
use crate::{MAX_RANKING_LIMIT, MAX_SHEET_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_unit_price(price: i64) -> ValidationResult<()> {
    if price < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an amount credited to or debited from a ledger.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_ledger_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a ranking limit.
///
/// ## Rules
/// - Must be between 1 and MAX_RANKING_LIMIT (100)
pub fn validate_ranking_limit(limit: u32) -> ValidationResult<()> {
    if limit == 0 || limit > MAX_RANKING_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_RANKING_LIMIT as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the lines of an order sheet.
///
/// ## Rules
/// - At least one line
/// - At most MAX_SHEET_LINES (100) lines
/// - Every line has a positive quantity and a non-negative unit price
pub fn validate_sheet_lines(lines: &[OrderSheetLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_SHEET_LINES {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_SHEET_LINES,
        });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
        validate_unit_price(line.unit_price)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(0).is_ok());
        assert!(validate_unit_price(1000).is_ok());
        assert!(validate_unit_price(-100).is_err());
    }

    #[test]
    fn test_validate_ledger_amount() {
        assert!(validate_ledger_amount("amount", 1).is_ok());
        assert!(validate_ledger_amount("amount", 0).is_err());
        assert!(validate_ledger_amount("amount", -5).is_err());
    }

    #[test]
    fn test_validate_ranking_limit() {
        assert!(validate_ranking_limit(1).is_ok());
        assert!(validate_ranking_limit(5).is_ok());
        assert!(validate_ranking_limit(100).is_ok());
        assert!(validate_ranking_limit(0).is_err());
        assert!(validate_ranking_limit(101).is_err());
    }

    #[test]
    fn test_validate_sheet_lines() {
        assert!(validate_sheet_lines(&[OrderSheetLine::new(1, 7, 3, 1000)]).is_ok());

        assert!(matches!(
            validate_sheet_lines(&[]),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_sheet_lines(&[OrderSheetLine::new(1, 7, 0, 1000)]).is_err());
        assert!(validate_sheet_lines(&[OrderSheetLine::new(1, 7, 1, -1)]).is_err());

        let too_many = vec![OrderSheetLine::new(1, 7, 1, 1); MAX_SHEET_LINES + 1];
        assert!(matches!(
            validate_sheet_lines(&too_many),
            Err(ValidationError::TooMany { .. })
        ));
    }
}
