//! # Repository Module
//!
//! Database repositories and ledgers.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-level (autocommit)              Connection-level (caller's tx)   │
//! │  ───────────────────────              ─────────────────────────────    │
//! │  db.stock().restock(7, 5)             stock::check_and_decrement(      │
//! │  db.balances().charge(42, 5000)           &mut tx, 7, 3)               │
//! │  db.order_sheets().stage(..)          order::save(&mut tx, &draft)     │
//! │       │                                     │                          │
//! │       │ acquires its own connection         │ used by CheckoutEngine   │
//! │       ▼                                     ▼                          │
//! │              same SQL, same checks, same errors                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockLedger`](stock::StockLedger) - per-option stock
//! - [`BalanceLedger`](balance::BalanceLedger) - per-member funds
//! - [`OrderSheetRepository`](order_sheet::OrderSheetRepository) - staged carts
//! - [`ProductRepository`](product::ProductRepository) - catalog
//! - [`OrderRepository`](order::OrderRepository) - orders and ranking

pub mod balance;
pub mod order;
pub mod order_sheet;
pub mod product;
pub mod stock;
