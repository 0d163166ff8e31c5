//! # Order Repository
//!
//! Persisted orders and the top-ordered-options ranking.
//!
//! ## Snapshot Pattern
//! Order items copy quantity and unit price from the sheet at checkout.
//! Nothing here ever re-reads the catalog, so a later price change cannot
//! rewrite order history.
//!
//! ## Ranking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order_items                         find_top_ordered_options(3)        │
//! │  ┌────────┬──────────┐                                                  │
//! │  │ option │ quantity │               option  total                      │
//! │  ├────────┼──────────┤               ──────  ─────                      │
//! │  │   9    │    2     │        ──►      8       5                        │
//! │  │   8    │    5     │                 7       4   ◄── tie: lower id    │
//! │  │   7    │    4     │                 9       4       goes first       │
//! │  │   9    │    2     │                                                  │
//! │  └────────┴──────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use commerce_core::validation::validate_ranking_limit;
use commerce_core::{
    CheckoutResult, Order, OrderDraft, OrderItem, TopOrderedOption, TOP_ORDERED_OPTIONS_LIMIT,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    member_id: i64,
    total_price: i64,
    created_at: DateTime<Utc>,
}

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a draft outside of any checkout.
    ///
    /// The checkout engine calls [`save`] on its own transaction instead.
    pub async fn save(&self, draft: &OrderDraft) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let order = save(&mut tx, draft).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Gets an order with its items in line order.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        find_order(&mut conn, id).await
    }

    /// Counts persisted orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Options ranked by total quantity ordered.
    ///
    /// ## Ordering
    /// Total quantity descending, ties broken by option id ascending.
    ///
    /// ## Arguments
    /// * `limit` - 1..=100 entries
    pub async fn find_top_ordered_options(&self, limit: u32) -> CheckoutResult<Vec<TopOrderedOption>> {
        validate_ranking_limit(limit)?;

        let top: Vec<TopOrderedOption> = sqlx::query_as(
            r#"
            SELECT
                product_id,
                product_option_id,
                SUM(quantity) AS total_quantity
            FROM order_items
            GROUP BY product_option_id, product_id
            ORDER BY total_quantity DESC, product_option_id ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(top)
    }

    /// The default five-entry ranking.
    pub async fn find_top_five(&self) -> CheckoutResult<Vec<TopOrderedOption>> {
        self.find_top_ordered_options(TOP_ORDERED_OPTIONS_LIMIT).await
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Inserts an order and one item per draft line.
///
/// Assigns the order's row identity; items reference it through `order_id`.
pub async fn save(conn: &mut SqliteConnection, draft: &OrderDraft) -> DbResult<Order> {
    let id = sqlx::query(
        r#"
        INSERT INTO orders (order_number, member_id, total_price, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&draft.order_number)
    .bind(draft.member_id)
    .bind(draft.total_price)
    .bind(draft.created_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let mut items = Vec::with_capacity(draft.lines.len());
    for (line_no, line) in draft.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, line_no, product_id, product_option_id,
                quantity, unit_price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(id)
        .bind(line_no as i64)
        .bind(line.product_id)
        .bind(line.product_option_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *conn)
        .await?;

        items.push(OrderItem {
            order_id: id,
            product_id: line.product_id,
            product_option_id: line.product_option_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
    }

    debug!(
        order_id = id,
        order_number = %draft.order_number,
        items = items.len(),
        "Order saved"
    );

    Ok(Order {
        id,
        order_number: draft.order_number.clone(),
        member_id: draft.member_id,
        total_price: draft.total_price,
        created_at: draft.created_at,
        items,
    })
}

/// Reads an order and its items.
pub async fn find_order(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
        SELECT id, order_number, member_id, total_price, created_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<OrderItem> = sqlx::query_as(
        r#"
        SELECT order_id, product_id, product_option_id, quantity, unit_price
        FROM order_items
        WHERE order_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Order {
        id: row.id,
        order_number: row.order_number,
        member_id: row.member_id,
        total_price: row.total_price,
        created_at: row.created_at,
        items,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::test_support::memory_db;
    use commerce_core::{ErrorKind, Money, OrderDraft, OrderSheetLine, TopOrderedOption};

    fn draft(lines: Vec<OrderSheetLine>) -> OrderDraft {
        let total = lines.iter().filter_map(|l| l.line_total()).sum::<Money>();
        OrderDraft::new(42, total, Utc::now(), lines)
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let db = memory_db().await;
        let draft = draft(vec![
            OrderSheetLine::new(1, 7, 3, 1000),
            OrderSheetLine::new(2, 9, 1, 250),
        ]);

        let saved = db.orders().save(&draft).await.unwrap();
        assert_eq!(saved.total_price, 3250);
        assert_eq!(saved.order_number, draft.order_number);
        assert!(saved.items.iter().all(|item| item.order_id == saved.id));

        let found = db.orders().find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(found.order_number, saved.order_number);
        assert_eq!(found.items, saved.items);
        assert_eq!(found.items[0].product_option_id, 7);
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_order() {
        let db = memory_db().await;
        assert!(db.orders().find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let db = memory_db().await;
        let draft = draft(vec![OrderSheetLine::new(1, 7, 1, 100)]);

        db.orders().save(&draft).await.unwrap();
        assert!(db.orders().save(&draft).await.is_err());
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_top_ordered_options_ranking() {
        let db = memory_db().await;
        db.orders()
            .save(&draft(vec![
                OrderSheetLine::new(3, 9, 2, 100),
                OrderSheetLine::new(2, 8, 5, 100),
            ]))
            .await
            .unwrap();
        db.orders()
            .save(&draft(vec![
                OrderSheetLine::new(1, 7, 4, 100),
                OrderSheetLine::new(3, 9, 2, 100),
            ]))
            .await
            .unwrap();

        let top = db.orders().find_top_ordered_options(3).await.unwrap();
        assert_eq!(
            top,
            vec![
                TopOrderedOption {
                    product_id: 2,
                    product_option_id: 8,
                    total_quantity: 5,
                },
                TopOrderedOption {
                    product_id: 1,
                    product_option_id: 7,
                    total_quantity: 4,
                },
                TopOrderedOption {
                    product_id: 3,
                    product_option_id: 9,
                    total_quantity: 4,
                },
            ]
        );

        let top = db.orders().find_top_ordered_options(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_option_id, 8);
    }

    #[tokio::test]
    async fn test_top_five_is_bounded() {
        let db = memory_db().await;
        let lines = (1..=7).map(|i| OrderSheetLine::new(1, i, i, 10)).collect();
        db.orders().save(&draft(lines)).await.unwrap();

        let top = db.orders().find_top_five().await.unwrap();
        let ids: Vec<i64> = top.iter().map(|t| t.product_option_id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn test_ranking_limit_validated() {
        let db = memory_db().await;
        assert!(db.orders().find_top_five().await.unwrap().is_empty());

        let err = db.orders().find_top_ordered_options(0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = db.orders().find_top_ordered_options(101).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
