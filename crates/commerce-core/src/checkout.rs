//! # Checkout Planner
//!
//! The pure half of the checkout engine: decides whether a sheet can be
//! fulfilled and what must be written, without writing anything.
//!
//! ## Two-Phase Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stage → Settle → (storage) Commit                    │
//! │                                                                         │
//! │  PHASE 1: PLAN (this module, no I/O)                                   │
//! │     for line in sheet.lines (in order):                                │
//! │       stage_line(line, available)  ── remaining < 0 → InsufficientStock│
//! │       total_price += quantity × unit_price                             │
//! │     settle(balance)                ── remaining < 0 → InsufficientBal. │
//! │       └── SettledCheckout { decrements, debit, OrderDraft }           │
//! │                                                                         │
//! │  PHASE 2: COMMIT (commerce-db, one transaction)                        │
//! │     apply every StagedDecrement, debit balance, save order, COMMIT     │
//! │                                                                         │
//! │  A rejection in phase 1 happens before any write exists, so a failure  │
//! │  on line 3 of 5 can never leave lines 1-2 decremented.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Repeated Options
//! A sheet may list the same option twice. Stock is checked cumulatively:
//! the second line sees what the first one left, and a single aggregated
//! decrement is produced per option, in first-seen order.

use chrono::{DateTime, Utc};

use crate::error::{CheckoutError, CheckoutResult, ValidationError};
use crate::money::Money;
use crate::types::{Balance, OrderDraft, OrderSheet, OrderSheetLine};
use crate::validation::{validate_quantity, validate_unit_price};

// =============================================================================
// Staged Decrement
// =============================================================================

/// A stock decrement that passed validation but is not yet written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedDecrement {
    pub product_option_id: i64,
    /// Total quantity to take, summed over every line for this option.
    pub quantity: i64,
    /// Stock observed when the option was first staged.
    pub available: i64,
}

impl StagedDecrement {
    /// Stock left once this decrement is applied.
    #[inline]
    pub fn expected_remaining(&self) -> i64 {
        self.available - self.quantity
    }
}

// =============================================================================
// Checkout Plan
// =============================================================================

/// Accumulates staged lines for one order sheet.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    order_sheet_id: i64,
    member_id: i64,
    lines: Vec<OrderSheetLine>,
    decrements: Vec<StagedDecrement>,
    total_price: Money,
}

impl CheckoutPlan {
    /// Starts an empty plan for the given sheet.
    pub fn new(sheet: &OrderSheet) -> Self {
        CheckoutPlan {
            order_sheet_id: sheet.id,
            member_id: sheet.member_id,
            lines: Vec::with_capacity(sheet.lines.len()),
            decrements: Vec::new(),
            total_price: Money::zero(),
        }
    }

    /// Stages one sheet line against the option's available stock.
    ///
    /// `available` is the stock read from the ledger. It is only consulted
    /// the first time an option is staged; later lines for the same option
    /// see what earlier lines left.
    ///
    /// ## Returns
    /// * `Ok(remaining)` - stock left for this option after all staged lines
    /// * `Err(InsufficientStock)` - this line does not fit
    pub fn stage_line(&mut self, line: &OrderSheetLine, available: i64) -> CheckoutResult<i64> {
        validate_quantity(line.quantity)?;
        validate_unit_price(line.unit_price)?;

        let line_total = line.line_total().ok_or_else(|| overflow("line total"))?;
        let total_price = self
            .total_price
            .checked_add(line_total)
            .ok_or_else(|| overflow("total_price"))?;

        let slot = self
            .decrements
            .iter()
            .position(|d| d.product_option_id == line.product_option_id);

        let (observed, already_staged) = match slot {
            Some(i) => (self.decrements[i].available, self.decrements[i].quantity),
            None => (available, 0),
        };

        let requested = already_staged
            .checked_add(line.quantity)
            .ok_or_else(|| overflow("quantity"))?;
        let remaining = observed - requested;

        if remaining < 0 {
            return Err(CheckoutError::InsufficientStock {
                product_option_id: line.product_option_id,
                available: observed - already_staged,
                requested: line.quantity,
            });
        }

        match slot {
            Some(i) => self.decrements[i].quantity = requested,
            None => self.decrements.push(StagedDecrement {
                product_option_id: line.product_option_id,
                quantity: requested,
                available: observed,
            }),
        }

        self.total_price = total_price;
        self.lines.push(line.clone());

        Ok(remaining)
    }

    /// Running total of staged lines.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Decrements staged so far.
    pub fn decrements(&self) -> &[StagedDecrement] {
        &self.decrements
    }

    /// Checks the staged total against the member's balance.
    ///
    /// ## Returns
    /// * `Ok(SettledCheckout)` - everything fits; ready to commit
    /// * `Err(InsufficientBalance)` - the plan is discarded, nothing staged
    ///   is ever written
    pub fn settle(self, balance: &Balance, now: DateTime<Utc>) -> CheckoutResult<SettledCheckout> {
        let remaining_balance = balance
            .available()
            .checked_sub(self.total_price)
            .ok_or_else(|| overflow("balance"))?;

        if remaining_balance.is_negative() {
            return Err(CheckoutError::InsufficientBalance {
                member_id: self.member_id,
                available: balance.amount,
                required: self.total_price.amount(),
            });
        }

        Ok(SettledCheckout {
            order_sheet_id: self.order_sheet_id,
            member_id: self.member_id,
            decrements: self.decrements,
            debit: self.total_price,
            remaining_balance,
            draft: OrderDraft::new(self.member_id, self.total_price, now, self.lines),
        })
    }
}

fn overflow(field: &str) -> CheckoutError {
    CheckoutError::Validation(ValidationError::Overflow {
        field: field.to_string(),
    })
}

// =============================================================================
// Settled Checkout
// =============================================================================

/// A fully validated checkout: every write it implies is known to fit.
#[derive(Debug, Clone)]
pub struct SettledCheckout {
    order_sheet_id: i64,
    member_id: i64,
    decrements: Vec<StagedDecrement>,
    debit: Money,
    remaining_balance: Money,
    draft: OrderDraft,
}

impl SettledCheckout {
    pub fn order_sheet_id(&self) -> i64 {
        self.order_sheet_id
    }

    pub fn member_id(&self) -> i64 {
        self.member_id
    }

    /// Stock decrements to apply, one per option, in sheet order.
    pub fn decrements(&self) -> &[StagedDecrement] {
        &self.decrements
    }

    /// Amount to debit from the balance.
    pub fn total_price(&self) -> Money {
        self.debit
    }

    /// Balance left once the debit is applied.
    pub fn remaining_balance(&self) -> Money {
        self.remaining_balance
    }

    /// The order to persist.
    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// Consumes the settlement, yielding the order to persist.
    pub fn into_draft(self) -> OrderDraft {
        self.draft
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
