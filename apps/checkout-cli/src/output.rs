//! # Command Output
//!
//! Everything the CLI prints to stdout is one JSON document: either the
//! command's result or an error envelope.
//!
//! ```json
//! {
//!   "error": {
//!     "code": "INSUFFICIENT_STOCK",
//!     "message": "Insufficient stock for option 7: available 2, requested 3",
//!     "retryable": false
//!   }
//! }
//! ```

use commerce_core::{
    CheckoutError, ErrorKind, Order, OrderSheet, Product, ProductOptionStock, TopOrderedOption,
};
use serde::Serialize;

/// Successful command result.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    Sheet(OrderSheet),
    Order(Order),
    Top(Vec<TopOrderedOption>),
    Product(Product),
    Balance { member_id: i64, amount: i64 },
    Stock(ProductOptionStock),
}

/// Error envelope printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Machine-readable failure: the error kind plus a display message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
    /// True only for conflicts; re-running the same command may succeed.
    pub retryable: bool,
}

impl From<&CheckoutError> for ErrorEnvelope {
    fn from(err: &CheckoutError) -> Self {
        ErrorEnvelope {
            error: ErrorBody {
                code: err.kind(),
                message: err.to_string(),
                retryable: err.is_retryable(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_core::Resource;
    use serde_json::json;

    #[test]
    fn test_error_envelope_shape() {
        let err = CheckoutError::InsufficientBalance {
            member_id: 4,
            available: 100,
            required: 250,
        };
        let value = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();

        assert_eq!(
            value,
            json!({
                "error": {
                    "code": "INSUFFICIENT_BALANCE",
                    "message": "Insufficient balance for member 4: available 100, required 250",
                    "retryable": false
                }
            })
        );
    }

    #[test]
    fn test_conflict_is_marked_retryable() {
        let err = CheckoutError::conflict("database is locked");
        let envelope = ErrorEnvelope::from(&err);

        assert_eq!(envelope.error.code, ErrorKind::Conflict);
        assert!(envelope.error.retryable);
    }

    #[test]
    fn test_not_found_message() {
        let err = CheckoutError::not_found(Resource::Product, 12);
        let envelope = ErrorEnvelope::from(&err);

        assert_eq!(envelope.error.code, ErrorKind::NotFound);
        assert_eq!(envelope.error.message, "product not found: 12");
    }

    #[test]
    fn test_outputs_serialize_without_wrapper() {
        let value = serde_json::to_value(Output::Balance {
            member_id: 1,
            amount: 5000,
        })
        .unwrap();
        assert_eq!(value, json!({ "member_id": 1, "amount": 5000 }));

        let value = serde_json::to_value(Output::Stock(ProductOptionStock {
            product_option_id: 3,
            available_quantity: 9,
        }))
        .unwrap();
        assert_eq!(value, json!({ "product_option_id": 3, "available_quantity": 9 }));

        let value = serde_json::to_value(Output::Top(Vec::new())).unwrap();
        assert_eq!(value, json!([]));
    }
}
