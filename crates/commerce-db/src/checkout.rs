//! # Checkout Engine
//!
//! Turns an order sheet into an order inside one SQLite transaction.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     checkout(order_sheet_id)                            │
//! │                                                                         │
//! │  BEGIN IMMEDIATE (waits up to busy_timeout for the write lock)          │
//! │   │                                                                     │
//! │   ├── load sheet ─────────────────────────── missing → NotFound         │
//! │   │                                                                     │
//! │   ├── PHASE 1: plan (reads only)                                        │
//! │   │     for line in sheet order:                                        │
//! │   │       load product + option stock ────── missing → NotFound         │
//! │   │       plan.stage_line() ─────────────── short → InsufficientStock   │
//! │   │     load balance ────────────────────── missing → MemberNotFound    │
//! │   │     plan.settle() ───────────────────── short → InsufficientBalance │
//! │   │                                                                     │
//! │   ├── PHASE 2: apply (writes)                                           │
//! │   │     stock check-and-decrement × option ── drifted → Conflict        │
//! │   │     balance check-and-decrement ───────── drifted → Conflict        │
//! │   │     save order + items                                              │
//! │   │                                                                     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error drops the transaction before COMMIT: SQLite rolls back and   │
//! │  stock, balance and orders look exactly as they did before the call.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Lock
//! The transaction takes SQLite's write lock before its first read, so
//! concurrent checkouts queue on the busy timeout and each one plans against
//! the stock its predecessors left behind.
//!
//! ## Retries
//! Only [`CheckoutError::Conflict`] is retried, and always from the top:
//! a new transaction re-reads the sheet, the stock and the balance. Business
//! rejections are returned on the first attempt. Waits between attempts grow
//! exponentially from `retry_backoff`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, info_span, warn, Instrument};

use crate::error::DbError;
use crate::repository::{balance, order, order_sheet, product, stock};
use commerce_core::validation::validate_sheet_lines;
use commerce_core::{
    CheckoutError, CheckoutPlan, CheckoutResult, Order, OrderSheetLine, Product, Resource,
    SettledCheckout, StagedDecrement,
};

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy for conflicting checkouts.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use commerce_db::CheckoutConfig;
///
/// let config = CheckoutConfig::default()
///     .max_attempts(5)
///     .retry_backoff(Duration::from_millis(10));
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Total attempts including the first one. Never less than 1.
    /// Default: 3
    pub max_attempts: u32,

    /// First wait between attempts. Later waits double, up to 8× this.
    /// Default: 25ms
    pub retry_backoff: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

impl CheckoutConfig {
    /// Sets the attempt budget.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the initial backoff interval.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Creates the exponential backoff between conflicting attempts.
    ///
    /// No elapsed-time limit: `max_attempts` decides when to give up.
    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.retry_backoff,
            initial_interval: self.retry_backoff,
            max_interval: self.retry_backoff * 8,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Runs checkouts against the database.
///
/// Cheap to clone; every clone shares the pool. Each `checkout` call is an
/// independent unit of work.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
    config: CheckoutConfig,
}

impl CheckoutEngine {
    /// Creates an engine over the given pool.
    pub fn new(pool: SqlitePool, config: CheckoutConfig) -> Self {
        CheckoutEngine { pool, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Checks out an order sheet.
    ///
    /// ## Returns
    /// * `Ok(Order)` - stock and balance debited, order persisted
    /// * `Err(_)` - nothing changed; see [`CheckoutError`] for the causes
    ///
    /// ## Not Idempotent
    /// The sheet is left in place. Checking it out again places a second
    /// order and debits both ledgers a second time.
    pub async fn checkout(&self, order_sheet_id: i64) -> CheckoutResult<Order> {
        with_retry(&self.config, move |attempt| async move {
            let result = self
                .checkout_once(order_sheet_id)
                .instrument(info_span!("checkout", order_sheet_id, attempt))
                .await;

            if let Err(err) = &result {
                if !err.is_retryable() {
                    warn!(order_sheet_id, kind = ?err.kind(), error = %err, "Checkout rejected");
                }
            }
            result
        })
        .await
    }

    async fn checkout_once(&self, order_sheet_id: i64) -> CheckoutResult<Order> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::from)?;

        let sheet = order_sheet::find_sheet(&mut tx, order_sheet_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found(Resource::OrderSheet, order_sheet_id))?;
        validate_sheet_lines(&sheet.lines)?;

        // Phase 1: plan
        let mut plan = CheckoutPlan::new(&sheet);
        let mut products = HashMap::new();
        for line in &sheet.lines {
            let available = available_for(&mut tx, &mut products, line).await?;
            plan.stage_line(line, available)?;
        }

        let balance = balance::find_balance(&mut tx, sheet.member_id)
            .await?
            .ok_or(CheckoutError::MemberNotFound {
                member_id: sheet.member_id,
            })?;
        let settled = plan.settle(&balance, Utc::now())?;

        // Phase 2: apply
        for decrement in settled.decrements() {
            apply_decrement(&mut tx, decrement).await?;
        }
        apply_debit(&mut tx, &settled).await?;
        let order = order::save(&mut tx, settled.draft()).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_sheet_id = settled.order_sheet_id(),
            order_id = order.id,
            order_number = %order.order_number,
            member_id = order.member_id,
            total_price = %order.total(),
            "Checkout committed"
        );
        Ok(order)
    }
}

/// Stock of the line's option, loading each product once per checkout.
async fn available_for(
    conn: &mut SqliteConnection,
    products: &mut HashMap<i64, Product>,
    line: &OrderSheetLine,
) -> CheckoutResult<i64> {
    let product = match products.entry(line.product_id) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let product = product::find_product_with_options(conn, line.product_id)
                .await?
                .ok_or_else(|| CheckoutError::not_found(Resource::Product, line.product_id))?;
            entry.insert(product)
        }
    };

    product
        .option(line.product_option_id)
        .map(|option| option.stock.available_quantity)
        .ok_or_else(|| CheckoutError::not_found(Resource::ProductOption, line.product_option_id))
}

async fn apply_decrement(
    conn: &mut SqliteConnection,
    decrement: &StagedDecrement,
) -> CheckoutResult<()> {
    let expected = decrement.expected_remaining();

    match stock::check_and_decrement(conn, decrement.product_option_id, decrement.quantity).await {
        Ok(remaining) if remaining == expected => Ok(()),
        Ok(remaining) => Err(CheckoutError::conflict(format!(
            "stock of option {} changed during checkout: expected {} left, found {}",
            decrement.product_option_id, expected, remaining
        ))),
        Err(CheckoutError::InsufficientStock { .. }) | Err(CheckoutError::NotFound { .. }) => {
            Err(CheckoutError::conflict(format!(
                "stock of option {} changed during checkout",
                decrement.product_option_id
            )))
        }
        Err(err) => Err(err),
    }
}

async fn apply_debit(conn: &mut SqliteConnection, settled: &SettledCheckout) -> CheckoutResult<()> {
    let debit = settled.total_price();
    if debit.is_zero() {
        return Ok(());
    }

    let member_id = settled.member_id();
    let expected = settled.remaining_balance().amount();

    match balance::check_and_decrement(conn, member_id, debit.amount()).await {
        Ok(remaining) if remaining == expected => Ok(()),
        Ok(remaining) => Err(CheckoutError::conflict(format!(
            "balance of member {} changed during checkout: expected {} left, found {}",
            member_id, expected, remaining
        ))),
        Err(CheckoutError::InsufficientBalance { .. })
        | Err(CheckoutError::MemberNotFound { .. }) => Err(CheckoutError::conflict(format!(
            "balance of member {} changed during checkout",
            member_id
        ))),
        Err(err) => Err(err),
    }
}

// =============================================================================
// Retry
// =============================================================================

/// Runs `op` until it succeeds, fails for good, or the attempts run out.
///
/// `op` receives the 1-based attempt number. Conflicts are transient until
/// the last attempt; every other error is permanent.
pub(crate) async fn with_retry<T, F, Fut>(config: &CheckoutConfig, mut op: F) -> CheckoutResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = CheckoutResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    backoff::future::retry_notify(
        config.backoff_policy(),
        || {
            attempt += 1;
            let current = attempt;
            let outcome = op(current);
            async move {
                match outcome.await {
                    Ok(value) => Ok(value),
                    Err(err) if err.is_retryable() && current < max_attempts => {
                        Err(backoff::Error::transient(err))
                    }
                    Err(err) => {
                        if err.is_retryable() {
                            warn!(attempt = current, error = %err, "Checkout conflict, giving up");
                        }
                        Err(backoff::Error::permanent(err))
                    }
                }
            }
        },
        |err: CheckoutError, wait: Duration| {
            warn!(max_attempts, retry_in = ?wait, error = %err, "Checkout conflict, retrying");
        },
    )
    .await
}

// =============================================================================
// Unit Tests
// =============================================================================
