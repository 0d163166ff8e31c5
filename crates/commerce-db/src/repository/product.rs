//! # Product Repository
//!
//! Catalog reads and writes.
//!
//! ## Product Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   find_product_with_options(1)                          │
//! │                                                                         │
//! │  products              product_options          product_option_stocks   │
//! │  ┌────┬─────────┐      ┌────┬──────┬───────┐    ┌──────────┬─────────┐  │
//! │  │ id │ name    │      │ id │ name │ price │    │ option   │ quantity│  │
//! │  ├────┼─────────┤      ├────┼──────┼───────┤    ├──────────┼─────────┤  │
//! │  │ 1  │ T-Shirt │ ───► │ 7  │ S    │ 1000  │ ─► │ 7        │ 10      │  │
//! │  └────┴─────────┘      │ 8  │ M    │ 1000  │ ─► │ 8        │ 0       │  │
//! │                        └────┴──────┴───────┘    └──────────┴─────────┘  │
//! │                                                                         │
//! │  Product { id: 1, options: [ S (stock 10), M (stock 0) ] }             │
//! │                                                                         │
//! │  Options are joined INNER to their stock record: an option with no     │
//! │  stock row is not sellable and is left out.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use commerce_core::validation::validate_unit_price;
use commerce_core::{
    CheckoutResult, NewProductOption, Product, ProductOption, ProductOptionStock, ValidationError,
};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    id: i64,
    product_id: i64,
    name: String,
    price: i64,
    quantity: i64,
}

impl From<OptionRow> for ProductOption {
    fn from(row: OptionRow) -> Self {
        ProductOption {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            stock: ProductOptionStock {
                product_option_id: row.id,
                available_quantity: row.quantity,
            },
        }
    }
}

/// Repository for catalog products.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().find_product_with_options(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product with its options and their current stock.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found, options ordered by id
    /// * `Ok(None)` - Product not found
    pub async fn find_product_with_options(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_product_with_options(&mut conn, id).await
    }

    /// Creates a product together with its options and opening stock.
    ///
    /// All rows are written in one transaction.
    pub async fn create(&self, name: &str, options: &[NewProductOption]) -> CheckoutResult<Product> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        for option in options {
            validate_unit_price(option.price)?;
            if option.quantity < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product_id = sqlx::query(
            r#"
            INSERT INTO products (name, created_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(name)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?
        .last_insert_rowid();

        let mut created = Vec::with_capacity(options.len());
        for option in options {
            let option_id = sqlx::query(
                r#"
                INSERT INTO product_options (product_id, name, price)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(product_id)
            .bind(&option.name)
            .bind(option.price)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?
            .last_insert_rowid();

            sqlx::query(
                r#"
                INSERT INTO product_option_stocks (product_option_id, quantity, updated_at)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(option_id)
            .bind(option.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            created.push(ProductOption {
                id: option_id,
                product_id,
                name: option.name.clone(),
                price: option.price,
                stock: ProductOptionStock {
                    product_option_id: option_id,
                    available_quantity: option.quantity,
                },
            });
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(product_id, options = created.len(), "Product created");

        Ok(Product {
            id: product_id,
            name: name.to_string(),
            created_at: now,
            options: created,
        })
    }

    /// Counts products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Reads a product and its sellable options.
pub async fn find_product_with_options(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, created_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let options: Vec<OptionRow> = sqlx::query_as(
        r#"
        SELECT o.id, o.product_id, o.name, o.price, s.quantity
        FROM product_options o
        INNER JOIN product_option_stocks s ON s.product_option_id = o.id
        WHERE o.product_id = ?1
        ORDER BY o.id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Product {
        id: row.id,
        name: row.name,
        created_at: row.created_at,
        options: options.into_iter().map(ProductOption::from).collect(),
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use commerce_core::{ErrorKind, NewProductOption};

    fn option(name: &str, price: i64, quantity: i64) -> NewProductOption {
        NewProductOption {
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_with_options() {
        let db = memory_db().await;

        let created = db
            .products()
            .create("T-Shirt", &[option("S", 1000, 10), option("M", 1200, 0)])
            .await
            .unwrap();

        let found = db
            .products()
            .find_product_with_options(created.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.name, "T-Shirt");
        assert_eq!(found.options.len(), 2);
        assert_eq!(found.options[0].name, "S");
        assert_eq!(found.options[0].stock.available_quantity, 10);
        assert_eq!(found.options[1].price, 1200);
        assert_eq!(found.options[1].stock.available_quantity, 0);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_product() {
        let db = memory_db().await;
        assert!(db
            .products()
            .find_product_with_options(1)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_option_without_stock_is_not_listed() {
        let db = memory_db().await;
        let product = db.products().create("Mug", &[option("Red", 800, 3)]).await.unwrap();

        sqlx::query("INSERT INTO product_options (product_id, name, price) VALUES (?1, 'Blue', 800)")
            .bind(product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let found = db
            .products()
            .find_product_with_options(product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.options.len(), 1);
        assert_eq!(found.options[0].name, "Red");
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let db = memory_db().await;

        let err = db.products().create("  ", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db
            .products()
            .create("Mug", &[option("Red", -1, 3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db
            .products()
            .create("Mug", &[option("Red", 100, -3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(db.products().count().await.unwrap(), 0);
    }
}
