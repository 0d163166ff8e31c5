//! # Domain Types
//!
//! Core domain types used throughout the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderSheet    │   │    Product      │   │    Balance      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  member_id      │   │  options[]      │   │  member_id      │       │
//! │  │  lines[] ───────┼──►│   └─ stock      │   │  amount ≥ 0     │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ checkout                                                    │
//! │           ▼                                                             │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   OrderDraft    │──►│     Order       │  (identity assigned by      │
//! │  │  order_number   │   │  id, items[]    │   the order store)          │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Orders carry:
//! - `id`: integer row identity assigned on save, used for relations
//! - `order_number`: UUID v4 business key generated with the draft

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// Available quantity of one product option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductOptionStock {
    pub product_option_id: i64,
    /// Never negative.
    pub available_quantity: i64,
}

/// A purchasable variant of a product (size, colour, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    /// Current catalog price. Sheets capture it at staging time.
    pub price: i64,
    pub stock: ProductOptionStock,
}

impl ProductOption {
    /// Returns the current catalog price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::new(self.price)
    }
}

/// A product with its nested options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub options: Vec<ProductOption>,
}

impl Product {
    /// Looks up one of this product's options.
    pub fn option(&self, option_id: i64) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// Input for creating a product option together with its opening stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductOption {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

// =============================================================================
// Balance
// =============================================================================

/// A member's spendable funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Balance {
    pub member_id: i64,
    /// Never negative.
    pub amount: i64,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Returns the balance as Money.
    #[inline]
    pub fn available(&self) -> Money {
        Money::new(self.amount)
    }
}

// =============================================================================
// Order Sheet
// =============================================================================

/// One selected option in a staged cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderSheetLine {
    pub product_id: i64,
    pub product_option_id: i64,
    /// Strictly positive.
    pub quantity: i64,
    /// Price captured when the line was staged.
    pub unit_price: i64,
}

impl OrderSheetLine {
    pub fn new(product_id: i64, product_option_id: i64, quantity: i64, unit_price: i64) -> Self {
        OrderSheetLine {
            product_id,
            product_option_id,
            quantity,
            unit_price,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::new(self.unit_price)
    }

    /// `quantity × unit_price`, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul_quantity(self.quantity)
    }
}

/// A cart selection before its price is captured from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub product_id: i64,
    pub product_option_id: i64,
    pub quantity: i64,
}

/// A staged, not-yet-finalized cart tied to one member.
///
/// Read-only from the checkout engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSheet {
    pub id: i64,
    pub member_id: i64,
    pub ordered_at: DateTime<Utc>,
    /// Sequence order is significant: lines are checked and locked in it.
    pub lines: Vec<OrderSheetLine>,
}

// =============================================================================
// Order
// =============================================================================

/// An order built by a successful checkout plan, not yet persisted.
///
/// Uses the snapshot pattern: quantities and unit prices are copied from the
/// sheet so later catalog price changes never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_number: String,
    pub member_id: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderSheetLine>,
}

impl OrderDraft {
    /// Builds a draft with a fresh business key.
    pub fn new(
        member_id: i64,
        total_price: Money,
        created_at: DateTime<Utc>,
        lines: Vec<OrderSheetLine>,
    ) -> Self {
        OrderDraft {
            order_number: generate_order_number(),
            member_id,
            total_price: total_price.amount(),
            created_at,
            lines,
        }
    }
}

/// A line item of a persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    /// Back-reference to the owning order.
    pub order_id: i64,
    pub product_id: i64,
    pub product_option_id: i64,
    pub quantity: i64,
    /// Unit price at time of purchase (frozen).
    pub unit_price: i64,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::new(self.unit_price)
    }
}

/// An immutable, persisted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub member_id: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::new(self.total_price)
    }
}

// =============================================================================
// Ranking
// =============================================================================

/// One entry of the "top products" ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopOrderedOption {
    pub product_id: i64,
    pub product_option_id: i64,
    /// Σ quantity over all order items for this option.
    pub total_quantity: i64,
}

/// Generates a new order business key.
pub fn generate_order_number() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: i64, quantity: i64) -> ProductOption {
        ProductOption {
            id,
            product_id: 1,
            name: format!("option-{id}"),
            price: 1000,
            stock: ProductOptionStock {
                product_option_id: id,
                available_quantity: quantity,
            },
        }
    }

    #[test]
    fn test_product_option_lookup() {
        let product = Product {
            id: 1,
            name: "T-Shirt".to_string(),
            created_at: Utc::now(),
            options: vec![option(7, 10), option(8, 0)],
        };

        assert_eq!(product.option(7).map(|o| o.stock.available_quantity), Some(10));
        assert_eq!(product.option(8).map(|o| o.stock.available_quantity), Some(0));
        assert!(product.option(9).is_none());
    }

    #[test]
    fn test_line_total() {
        let line = OrderSheetLine::new(1, 7, 3, 1000);
        assert_eq!(line.line_total(), Some(Money::new(3000)));

        let huge = OrderSheetLine::new(1, 7, 2, i64::MAX);
        assert_eq!(huge.line_total(), None);
    }

    #[test]
    fn test_drafts_get_distinct_order_numbers() {
        let a = OrderDraft::new(1, Money::new(100), Utc::now(), vec![]);
        let b = OrderDraft::new(1, Money::new(100), Utc::now(), vec![]);
        assert_ne!(a.order_number, b.order_number);
        assert!(Uuid::parse_str(&a.order_number).is_ok());
    }
}
