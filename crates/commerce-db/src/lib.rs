//! # commerce-db: Storage Layer and Checkout Engine
//!
//! SQLite storage for the checkout system, via sqlx, plus the engine that
//! runs each checkout as one transaction over it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Data Flow                               │
//! │                                                                         │
//! │  checkout-cli  (checkout 17)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   commerce-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │CheckoutEngine │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (checkout.rs) │───►│ StockLedger   │    │  (embedded)  │  │   │
//! │  │   │               │    │ BalanceLedger │    │              │  │   │
//! │  │   │ BEGIN ..      │    │ OrderSheets   │    │ 001_init.sql │  │   │
//! │  │   │ COMMIT        │    │ Products      │    │              │  │   │
//! │  │   └───────┬───────┘    │ Orders        │    └──────────────┘  │   │
//! │  │           │            └───────────────┘                       │   │
//! │  │           ▼ plans with commerce-core::CheckoutPlan             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Ledgers and stores
//! - [`checkout`] - The transactional checkout engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use commerce_db::{CheckoutConfig, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./commerce.db")).await?;
//!
//! let order = db
//!     .checkout_engine(CheckoutConfig::default())
//!     .checkout(order_sheet_id)
//!     .await?;
//!
//! let top = db.orders().find_top_five().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutConfig, CheckoutEngine};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::balance::BalanceLedger;
pub use repository::order::OrderRepository;
pub use repository::order_sheet::OrderSheetRepository;
pub use repository::product::ProductRepository;
pub use repository::stock::StockLedger;

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    use commerce_core::NewProductOption;
    use uuid::Uuid;

    use crate::{Database, DbConfig};

    /// Fresh migrated in-memory database.
    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// A file-backed database in the temp dir, for tests that need more
    /// than one connection. Files are removed on drop.
    pub struct ScratchDb {
        pub db: Database,
        path: PathBuf,
    }

    impl ScratchDb {
        pub async fn new(max_connections: u32) -> Self {
            let path = std::env::temp_dir().join(format!("commerce-test-{}.db", Uuid::new_v4()));
            let db = Database::new(
                DbConfig::new(&path)
                    .max_connections(max_connections)
                    .min_connections(1),
            )
            .await
            .expect("scratch database");

            ScratchDb { db, path }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for ScratchDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    /// Creates a one-option product; returns `(product_id, option_id)`.
    pub async fn seed_option(db: &Database, price: i64, quantity: i64) -> (i64, i64) {
        let product = db
            .products()
            .create(
                "Test Product",
                &[NewProductOption {
                    name: "Default".to_string(),
                    price,
                    quantity,
                }],
            )
            .await
            .expect("seed product");

        (product.id, product.options[0].id)
    }
}
