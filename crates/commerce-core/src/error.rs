//! # Error Types
//!
//! The checkout error taxonomy.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  commerce-core errors (this file)                                      │
//! │  ├── CheckoutError    - Closed set of checkout failure kinds           │
//! │  └── ValidationError  - Malformed input (sheet lines, amounts)         │
//! │                                                                         │
//! │  commerce-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, mapped into                  │
//! │                         CheckoutError::Conflict / ::Storage            │
//! │                                                                         │
//! │  Flow: ValidationError → CheckoutError ← DbError                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Classes
//! | Kind                | Retryable | Caller action                      |
//! |---------------------|-----------|------------------------------------|
//! | NotFound            | no        | resource not found                 |
//! | MemberNotFound      | no        | resource not found                 |
//! | InsufficientStock   | no        | re-stage sheet with less quantity  |
//! | InsufficientBalance | no        | charge balance or shrink sheet     |
//! | Conflict            | yes       | retry the whole checkout           |
//! | Validation          | no        | fix the input                      |
//! | Storage             | no        | infrastructure failure             |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Resource
// =============================================================================

/// Kinds of entity a checkout can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    OrderSheet,
    Product,
    ProductOption,
    Order,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::OrderSheet => "order sheet",
            Resource::Product => "product",
            Resource::ProductOption => "product option",
            Resource::Order => "order",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Every way a checkout can fail.
///
/// Each variant is a distinct, branchable cause. Whatever the variant, a
/// failed checkout leaves stock, balance and orders exactly as they were.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// An order sheet, product, product option or order does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: i64 },

    /// The sheet's member has no balance record.
    #[error("Member not found: {member_id}")]
    MemberNotFound { member_id: i64 },

    /// A line asks for more than the option has available.
    ///
    /// ## User Workflow
    /// ```text
    /// Sheet line: option 7 × 3
    ///      │
    ///      ▼
    /// Stock ledger: option 7 has 2
    ///      │
    ///      ▼
    /// InsufficientStock { product_option_id: 7, available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Caller re-stages the sheet with an adjusted quantity
    /// ```
    #[error(
        "Insufficient stock for option {product_option_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_option_id: i64,
        available: i64,
        requested: i64,
    },

    /// The sheet total exceeds the member's balance.
    #[error("Insufficient balance for member {member_id}: available {available}, required {required}")]
    InsufficientBalance {
        member_id: i64,
        available: i64,
        required: i64,
    },

    /// A concurrent update invalidated this checkout. Nothing was committed.
    #[error("Checkout conflict: {0}")]
    Conflict(String),

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failure that is not a concurrency conflict.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Discriminant of [`CheckoutError`] for callers that only branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    MemberNotFound,
    InsufficientStock,
    InsufficientBalance,
    Conflict,
    Validation,
    Storage,
}

impl CheckoutError {
    /// Creates a NotFound error for a given resource and ID.
    pub fn not_found(resource: Resource, id: i64) -> Self {
        CheckoutError::NotFound { resource, id }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CheckoutError::Conflict(message.into())
    }

    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::NotFound { .. } => ErrorKind::NotFound,
            CheckoutError::MemberNotFound { .. } => ErrorKind::MemberNotFound,
            CheckoutError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CheckoutError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            CheckoutError::Conflict(_) => ErrorKind::Conflict,
            CheckoutError::Validation(_) => ErrorKind::Validation,
            CheckoutError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if the whole checkout may be retried from scratch.
    ///
    /// Only conflicts are transient. Business rejections stay rejected until
    /// the caller changes the sheet or the balance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Conflict(_))
    }

    /// Returns true for the "resource not found" class.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CheckoutError::NotFound { .. } | CheckoutError::MemberNotFound { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a sheet or an amount doesn't meet requirements.
/// Checked before any ledger is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Collection is larger than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Arithmetic on a monetary amount overflowed.
    #[error("{field} overflowed")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CheckoutError.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CheckoutError::InsufficientStock {
            product_option_id: 7,
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for option 7: available 2, requested 3"
        );

        let err = CheckoutError::not_found(Resource::OrderSheet, 9);
        assert_eq!(err.to_string(), "order sheet not found: 9");
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(CheckoutError::conflict("database is locked").is_retryable());

        assert!(!CheckoutError::not_found(Resource::Product, 1).is_retryable());
        assert!(!CheckoutError::MemberNotFound { member_id: 1 }.is_retryable());
        assert!(!CheckoutError::InsufficientBalance {
            member_id: 1,
            available: 0,
            required: 1,
        }
        .is_retryable());
        assert!(!CheckoutError::Storage("disk full".into()).is_retryable());
    }

    #[test]
    fn test_kind_and_not_found_class() {
        let err = CheckoutError::MemberNotFound { member_id: 3 };
        assert_eq!(err.kind(), ErrorKind::MemberNotFound);
        assert!(err.is_not_found());

        let err = CheckoutError::not_found(Resource::ProductOption, 8);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_not_found());

        let err = CheckoutError::conflict("busy");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }

    #[test]
    fn test_validation_converts_to_checkout_error() {
        let validation_err = ValidationError::Required {
            field: "lines".to_string(),
        };
        let err: CheckoutError = validation_err.into();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
