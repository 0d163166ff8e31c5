//! # Order Sheet Repository
//!
//! Staged carts waiting to be checked out.
//!
//! ## Sheet Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Sheet Lifecycle                             │
//! │                                                                         │
//! │  1. STAGE                                                              │
//! │     └── stage() / stage_from_catalog() → OrderSheet                    │
//! │         lines written with line_no = position in the cart              │
//! │         unit_price captured here, never re-read at checkout            │
//! │                                                                         │
//! │  2. CHECKOUT (CheckoutEngine)                                          │
//! │     └── find_sheet() inside the checkout transaction, read-only        │
//! │                                                                         │
//! │  A sheet is never consumed: checking it out twice places two orders.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use commerce_core::validation::{validate_quantity, validate_sheet_lines};
use commerce_core::{
    CheckoutError, CheckoutResult, OptionSelection, OrderSheet, OrderSheetLine, Resource,
};

#[derive(Debug, FromRow)]
struct SheetRow {
    id: i64,
    member_id: i64,
    ordered_at: DateTime<Utc>,
}

/// Repository for order sheets.
#[derive(Debug, Clone)]
pub struct OrderSheetRepository {
    pool: SqlitePool,
}

impl OrderSheetRepository {
    /// Creates a new OrderSheetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderSheetRepository { pool }
    }

    /// Gets a sheet with its lines in staging order.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<OrderSheet>> {
        let mut conn = self.pool.acquire().await?;
        find_sheet(&mut conn, id).await
    }

    /// Stages a sheet from lines whose prices are already known.
    pub async fn stage(
        &self,
        member_id: i64,
        lines: &[OrderSheetLine],
    ) -> CheckoutResult<OrderSheet> {
        validate_sheet_lines(lines)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let sheet = insert_sheet(&mut tx, member_id, lines.to_vec()).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(sheet)
    }

    /// Stages a sheet, capturing each option's current catalog price.
    ///
    /// ## Errors
    /// * `NotFound(product option)` - the option does not exist or does not
    ///   belong to the selected product
    pub async fn stage_from_catalog(
        &self,
        member_id: i64,
        selections: &[OptionSelection],
    ) -> CheckoutResult<OrderSheet> {
        for selection in selections {
            validate_quantity(selection.quantity)?;
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let mut lines = Vec::with_capacity(selections.len());
        for selection in selections {
            let price: Option<i64> = sqlx::query_scalar(
                r#"
                SELECT price FROM product_options
                WHERE id = ?1 AND product_id = ?2
                "#,
            )
            .bind(selection.product_option_id)
            .bind(selection.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?;

            let price = price.ok_or_else(|| {
                CheckoutError::not_found(Resource::ProductOption, selection.product_option_id)
            })?;

            lines.push(OrderSheetLine::new(
                selection.product_id,
                selection.product_option_id,
                selection.quantity,
                price,
            ));
        }

        validate_sheet_lines(&lines)?;
        let sheet = insert_sheet(&mut tx, member_id, lines).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(sheet)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Reads a sheet and its lines.
pub async fn find_sheet(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<OrderSheet>> {
    let row: Option<SheetRow> = sqlx::query_as(
        r#"
        SELECT id, member_id, ordered_at
        FROM order_sheets
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let lines: Vec<OrderSheetLine> = sqlx::query_as(
        r#"
        SELECT product_id, product_option_id, quantity, unit_price
        FROM order_sheet_lines
        WHERE order_sheet_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(OrderSheet {
        id: row.id,
        member_id: row.member_id,
        ordered_at: row.ordered_at,
        lines,
    }))
}

async fn insert_sheet(
    conn: &mut SqliteConnection,
    member_id: i64,
    lines: Vec<OrderSheetLine>,
) -> DbResult<OrderSheet> {
    let ordered_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO order_sheets (member_id, ordered_at)
        VALUES (?1, ?2)
        "#,
    )
    .bind(member_id)
    .bind(ordered_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for (line_no, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_sheet_lines (
                order_sheet_id, line_no, product_id, product_option_id,
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
    }

    debug!(order_sheet_id = id, member_id, lines = lines.len(), "Order sheet staged");

    Ok(OrderSheet {
        id,
        member_id,
        ordered_at,
        lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::{memory_db, seed_option};
    use commerce_core::{ErrorKind, OptionSelection, OrderSheetLine};

    #[tokio::test]
    async fn test_stage_and_find_preserves_line_order() {
        let db = memory_db().await;
        let lines = vec![
            OrderSheetLine::new(3, 30, 1, 500),
            OrderSheetLine::new(1, 10, 2, 1000),
            OrderSheetLine::new(2, 20, 3, 0),
        ];

        let staged = db.order_sheets().stage(42, &lines).await.unwrap();
        let found = db.order_sheets().find_by_id(staged.id).await.unwrap().unwrap();

        assert_eq!(found.member_id, 42);
        assert_eq!(found.lines, lines);
    }

    #[tokio::test]
    async fn test_find_missing_sheet() {
        let db = memory_db().await;
        assert!(db.order_sheets().find_by_id(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stage_rejects_empty_and_malformed_sheets() {
        let db = memory_db().await;

        let err = db.order_sheets().stage(42, &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db
            .order_sheets()
            .stage(42, &[OrderSheetLine::new(1, 10, 0, 1000)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_stage_from_catalog_captures_price() {
        let db = memory_db().await;
        let (product_id, option_id) = seed_option(&db, 1250, 10).await;

        let sheet = db
            .order_sheets()
            .stage_from_catalog(
                42,
                &[OptionSelection {
                    product_id,
                    product_option_id: option_id,
                    quantity: 2,
                }],
            )
            .await
            .unwrap();

        assert_eq!(sheet.lines, vec![OrderSheetLine::new(product_id, option_id, 2, 1250)]);
    }

    #[tokio::test]
    async fn test_stage_from_catalog_unknown_option() {
        let db = memory_db().await;
        let (product_id, option_id) = seed_option(&db, 1250, 10).await;

        // Right option, wrong product.
        let err = db
            .order_sheets()
            .stage_from_catalog(
                42,
                &[OptionSelection {
                    product_id: product_id + 100,
                    product_option_id: option_id,
                    quantity: 1,
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
