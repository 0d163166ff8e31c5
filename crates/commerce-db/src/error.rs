//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← constraint / conflict categorization          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutError ← Conflict stays retryable, the rest becomes Storage    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout-cli prints { kind, message } as JSON                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conflicts
//! SQLite reports lost write races as `SQLITE_BUSY` (5), `SQLITE_LOCKED` (6)
//! or one of their extended codes, most notably `SQLITE_BUSY_SNAPSHOT` (517)
//! when a WAL read transaction tries to upgrade to a writer after another
//! connection committed. All of them surface as [`DbError::Conflict`].

use commerce_core::CheckoutError;
use thiserror::Error;

/// Primary and extended SQLite result codes meaning "another writer won":
/// BUSY, LOCKED, BUSY_RECOVERY, LOCKED_SHAREDCACHE, BUSY_SNAPSHOT, BUSY_TIMEOUT.
const CONFLICT_CODES: &[&str] = &["5", "6", "261", "262", "517", "773"];

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and for the checkout engine's retry decision.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate order_number
    /// - Duplicate (order_sheet_id, line_no)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Option created for a product that does not exist
    /// - Order item pointing at a missing order
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - A write would drive stock or balance below zero
    /// - Non-positive quantity on a sheet line
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    /// Another connection holds or invalidated the lock this write needed.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true if the failed operation may succeed when retried.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → busy/locked code? Conflict
///                               else analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let code = db_err.code();

                if is_conflict(code.as_deref()) {
                    DbError::Conflict(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Storage failures seen by the checkout engine.
///
/// Conflicts keep their retryable class. Everything else is an
/// infrastructure failure the caller cannot fix by changing input.
impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => CheckoutError::Conflict(msg),
            other => CheckoutError::Storage(other.to_string()),
        }
    }
}

fn is_conflict(code: Option<&str>) -> bool {
    code.is_some_and(|code| CONFLICT_CODES.contains(&code))
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
