//! # Stock Ledger
//!
//! Available quantity per product option.
//!
//! ## Check-and-Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │           One statement, no read-then-write window                      │
//! │                                                                         │
//! │  UPDATE product_option_stocks                                          │
//! │     SET quantity = quantity - :requested                               │
//! │   WHERE product_option_id = :id                                        │
//! │     AND quantity >= :requested        ◄── the check                    │
//! │  RETURNING quantity                   ◄── the new value                │
//! │                                                                         │
//! │  row returned  → Ok(new_quantity)                                      │
//! │  no row        → re-read: missing option  → NotFound(product option)   │
//! │                           present option  → InsufficientStock          │
//! │                                                                         │
//! │  Two checkouts racing for the same option serialize on SQLite's write  │
//! │  lock; the loser either sees the decremented value or gets a busy      │
//! │  error. Stock never goes below zero.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Connection-level functions run inside a caller's transaction (the
//! checkout engine). [`StockLedger`] methods run each operation as its own
//! autocommit statement.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use commerce_core::validation::{validate_ledger_amount, validate_quantity};
use commerce_core::{CheckoutError, CheckoutResult, ProductOptionStock, Resource};

/// Repository for the per-option stock ledger.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Current stock of an option, `None` if the option has no stock record.
    pub async fn available(&self, product_option_id: i64) -> DbResult<Option<ProductOptionStock>> {
        let mut conn = self.pool.acquire().await?;
        find_stock(&mut conn, product_option_id).await
    }

    /// Atomically takes `quantity` units if at least that many are available.
    ///
    /// ## Returns
    /// * `Ok(new_quantity)` - stock after the decrement
    /// * `Err(InsufficientStock)` - nothing was changed
    /// * `Err(NotFound)` - the option has no stock record
    pub async fn check_and_decrement(
        &self,
        product_option_id: i64,
        quantity: i64,
    ) -> CheckoutResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        check_and_decrement(&mut conn, product_option_id, quantity).await
    }

    /// Adds `quantity` units to an option's stock.
    pub async fn restock(&self, product_option_id: i64, quantity: i64) -> CheckoutResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        restock(&mut conn, product_option_id, quantity).await
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Reads an option's stock record.
pub async fn find_stock(
    conn: &mut SqliteConnection,
    product_option_id: i64,
) -> DbResult<Option<ProductOptionStock>> {
    let stock: Option<ProductOptionStock> = sqlx::query_as(
        r#"
        SELECT product_option_id, quantity AS available_quantity
        FROM product_option_stocks
        WHERE product_option_id = ?1
        "#,
    )
    .bind(product_option_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock)
}

/// Conditional decrement; see the module docs.
pub async fn check_and_decrement(
    conn: &mut SqliteConnection,
    product_option_id: i64,
    quantity: i64,
) -> CheckoutResult<i64> {
    validate_quantity(quantity)?;

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE product_option_stocks
        SET quantity = quantity - ?2,
            updated_at = ?3
        WHERE product_option_id = ?1 AND quantity >= ?2
        RETURNING quantity
        "#,
    )
    .bind(product_option_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if let Some(remaining) = remaining {
        debug!(product_option_id, quantity, remaining, "Stock decremented");
        return Ok(remaining);
    }

    match find_stock(conn, product_option_id).await? {
        Some(stock) => Err(CheckoutError::InsufficientStock {
            product_option_id,
            available: stock.available_quantity,
            requested: quantity,
        }),
        None => Err(CheckoutError::not_found(
            Resource::ProductOption,
            product_option_id,
        )),
    }
}

/// Adds stock to an existing option.
pub async fn restock(
    conn: &mut SqliteConnection,
    product_option_id: i64,
    quantity: i64,
) -> CheckoutResult<i64> {
    validate_ledger_amount("quantity", quantity)?;

    let new_quantity: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE product_option_stocks
        SET quantity = quantity + ?2,
            updated_at = ?3
        WHERE product_option_id = ?1
        RETURNING quantity
        "#,
    )
    .bind(product_option_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(DbError::from)?;

    let new_quantity = new_quantity
        .ok_or_else(|| CheckoutError::not_found(Resource::ProductOption, product_option_id))?;

    debug!(product_option_id, quantity, new_quantity, "Stock replenished");
    Ok(new_quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::{memory_db, seed_option};
    use commerce_core::{CheckoutError, ErrorKind};

    #[tokio::test]
    async fn test_check_and_decrement() {
        let db = memory_db().await;
        let (_, option_id) = seed_option(&db, 1000, 10).await;

        let remaining = db.stock().check_and_decrement(option_id, 3).await.unwrap();
        assert_eq!(remaining, 7);

        let stock = db.stock().available(option_id).await.unwrap().unwrap();
        assert_eq!(stock.available_quantity, 7);
    }

    #[tokio::test]
    async fn test_decrement_to_exactly_zero() {
        let db = memory_db().await;
        let (_, option_id) = seed_option(&db, 1000, 4).await;

        assert_eq!(db.stock().check_and_decrement(option_id, 4).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_quantity() {
        let db = memory_db().await;
        let (_, option_id) = seed_option(&db, 1000, 2).await;

        let err = db.stock().check_and_decrement(option_id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));

        let stock = db.stock().available(option_id).await.unwrap().unwrap();
        assert_eq!(stock.available_quantity, 2);
    }

    #[tokio::test]
    async fn test_missing_option() {
        let db = memory_db().await;

        let err = db.stock().check_and_decrement(999, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(db.stock().available(999).await.unwrap().is_none());

        let err = db.stock().restock(999, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_restock() {
        let db = memory_db().await;
        let (_, option_id) = seed_option(&db, 1000, 0).await;

        assert_eq!(db.stock().restock(option_id, 5).await.unwrap(), 5);
        assert_eq!(db.stock().restock(option_id, 2).await.unwrap(), 7);

        let err = db.stock().restock(option_id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = memory_db().await;
        let (_, option_id) = seed_option(&db, 1000, 5).await;

        let err = db.stock().check_and_decrement(option_id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = db.stock().check_and_decrement(option_id, -2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
