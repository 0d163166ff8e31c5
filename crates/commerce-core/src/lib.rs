//! # commerce-core: Pure Checkout Logic
//!
//! This crate holds the business rules of the checkout engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Commerce Checkout Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    checkout-cli (apps/)                         │   │
//! │  │        stage ──► checkout ──► show / top                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               commerce-db (CheckoutEngine)                      │   │
//! │  │   transaction ── ledgers ── order sheet / order stores          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ commerce-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │ OrderSheet│  │   Money   │  │   Plan    │  │   rules   │  │   │
//! │  │   │   Order   │  │           │  │  Settled  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (OrderSheet, Product, Balance, Order, ...)
//! - [`money`] - Money type with checked integer arithmetic
//! - [`error`] - Checkout error taxonomy
//! - [`validation`] - Input validation
//! - [`checkout`] - Two-phase checkout planner
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use commerce_core::{Balance, CheckoutPlan, OrderSheet, OrderSheetLine};
//!
//! let sheet = OrderSheet {
//!     id: 1,
//!     member_id: 42,
//!     ordered_at: Utc::now(),
//!     lines: vec![OrderSheetLine::new(1, 7, 3, 1000)],
//! };
//!
//! let mut plan = CheckoutPlan::new(&sheet);
//! plan.stage_line(&sheet.lines[0], 10).unwrap();
//!
//! let balance = Balance { member_id: 42, amount: 5000, updated_at: Utc::now() };
//! let settled = plan.settle(&balance, Utc::now()).unwrap();
//!
//! assert_eq!(settled.total_price().amount(), 3000);
//! assert_eq!(settled.remaining_balance().amount(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutPlan, SettledCheckout, StagedDecrement};
pub use error::{CheckoutError, CheckoutResult, ErrorKind, Resource, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of entries returned by the "top products" ranking by default.
pub const TOP_ORDERED_OPTIONS_LIMIT: u32 = 5;

/// Upper bound accepted for a caller-supplied ranking limit.
pub const MAX_RANKING_LIMIT: u32 = 100;

/// Maximum lines allowed in a single order sheet.
///
/// ## Business Reason
/// Keeps a single checkout transaction (and the row locks it takes) bounded.
pub const MAX_SHEET_LINES: usize = 100;
