//! # Balance Ledger
//!
//! Spendable funds per member.
//!
//! Same discipline as the stock ledger: the sufficiency check lives in the
//! WHERE clause of the UPDATE that applies the debit, so the balance can
//! never be read, found sufficient, and then overdrawn by a second writer.
//!
//! ## Operations
//! - `find_by_member_id` - read a balance
//! - `check_and_decrement` - debit if funds suffice
//! - `charge` - credit, creating the balance on first use

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use commerce_core::validation::validate_ledger_amount;
use commerce_core::{Balance, CheckoutError, CheckoutResult};

/// Repository for member balances.
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    pool: SqlitePool,
}

impl BalanceLedger {
    /// Creates a new BalanceLedger.
    pub fn new(pool: SqlitePool) -> Self {
        BalanceLedger { pool }
    }

    /// Gets a member's balance.
    pub async fn find_by_member_id(&self, member_id: i64) -> DbResult<Option<Balance>> {
        let mut conn = self.pool.acquire().await?;
        find_balance(&mut conn, member_id).await
    }

    /// Atomically debits `amount` if the member has at least that much.
    ///
    /// ## Returns
    /// * `Ok(new_amount)` - balance after the debit
    /// * `Err(InsufficientBalance)` - nothing was changed
    /// * `Err(MemberNotFound)` - the member has no balance
    pub async fn check_and_decrement(&self, member_id: i64, amount: i64) -> CheckoutResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        check_and_decrement(&mut conn, member_id, amount).await
    }

    /// Credits `amount` to a member, opening the balance if needed.
    pub async fn charge(&self, member_id: i64, amount: i64) -> CheckoutResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        charge(&mut conn, member_id, amount).await
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Reads a member's balance.
pub async fn find_balance(conn: &mut SqliteConnection, member_id: i64) -> DbResult<Option<Balance>> {
    let balance: Option<Balance> = sqlx::query_as(
        r#"
        SELECT member_id, amount, updated_at
        FROM balances
        WHERE member_id = ?1
        "#,
    )
    .bind(member_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(balance)
}

/// Conditional debit.
pub async fn check_and_decrement(
    conn: &mut SqliteConnection,
    member_id: i64,
    amount: i64,
) -> CheckoutResult<i64> {
    validate_ledger_amount("amount", amount)?;

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE balances
        SET amount = amount - ?2,
            updated_at = ?3
        WHERE member_id = ?1 AND amount >= ?2
        RETURNING amount
        "#,
    )
    .bind(member_id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if let Some(remaining) = remaining {
        debug!(member_id, amount, remaining, "Balance debited");
        return Ok(remaining);
    }

    match find_balance(conn, member_id).await? {
        Some(balance) => Err(CheckoutError::InsufficientBalance {
            member_id,
            available: balance.amount,
            required: amount,
        }),
        None => Err(CheckoutError::MemberNotFound { member_id }),
    }
}

/// Upsert credit.
pub async fn charge(conn: &mut SqliteConnection, member_id: i64, amount: i64) -> CheckoutResult<i64> {
    validate_ledger_amount("amount", amount)?;

    let new_amount: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO balances (member_id, amount, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (member_id) DO UPDATE SET
            amount = amount + excluded.amount,
            updated_at = excluded.updated_at
        RETURNING amount
        "#,
    )
    .bind(member_id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(DbError::from)?;

    debug!(member_id, amount, new_amount, "Balance charged");
    Ok(new_amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use commerce_core::{CheckoutError, ErrorKind};

    #[tokio::test]
    async fn test_charge_opens_and_tops_up() {
        let db = memory_db().await;

        assert!(db.balances().find_by_member_id(42).await.unwrap().is_none());
        assert_eq!(db.balances().charge(42, 5000).await.unwrap(), 5000);
        assert_eq!(db.balances().charge(42, 1500).await.unwrap(), 6500);

        let balance = db.balances().find_by_member_id(42).await.unwrap().unwrap();
        assert_eq!(balance.member_id, 42);
        assert_eq!(balance.amount, 6500);
    }

    #[tokio::test]
    async fn test_check_and_decrement() {
        let db = memory_db().await;
        db.balances().charge(42, 5000).await.unwrap();

        assert_eq!(db.balances().check_and_decrement(42, 3000).await.unwrap(), 2000);
        assert_eq!(db.balances().check_and_decrement(42, 2000).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_amount() {
        let db = memory_db().await;
        db.balances().charge(42, 1000).await.unwrap();

        let err = db.balances().check_and_decrement(42, 1001).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientBalance {
                member_id: 42,
                available: 1000,
                required: 1001,
            }
        ));

        let balance = db.balances().find_by_member_id(42).await.unwrap().unwrap();
        assert_eq!(balance.amount, 1000);
    }

    #[tokio::test]
    async fn test_missing_member() {
        let db = memory_db().await;

        let err = db.balances().check_and_decrement(7, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemberNotFound);
    }

    #[tokio::test]
    async fn test_amount_must_be_positive() {
        let db = memory_db().await;

        let err = db.balances().charge(42, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = db.balances().check_and_decrement(42, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
