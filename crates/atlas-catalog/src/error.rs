//! # Catalog Error Type
//!
//! The single error type returned by every engine operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Atlas Catalog                          │
//! │                                                                         │
//! │  Engine operation                                                       │
//! │  Result<T, CatalogError>                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Rule violated? ─── CoreError::InvalidOperation ──┐                     │
//! │         │                                         │                     │
//! │         ▼                                         ▼                     │
//! │  Store failed? ─── DbError::UniqueViolation ── CatalogError ──► caller  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────► caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "kind": "INVALID_OPERATION",
//!   "message": "Invalid operation: missing value for axis 'Size' (size)"
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

use atlas_core::{CoreError, ValidationError};
use atlas_db::DbError;

/// Error returned by the catalog engines.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CatalogError {
    /// Machine-readable category.
    pub kind: ErrorKind,

    /// Human-readable message naming the offending field or identifier.
    pub message: String,
}

/// Error categories exposed to the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Product, component, axis or configuration missing
    NotFound,

    /// Duplicate SKU, component/child pair or axis code
    AlreadyExists,

    /// Illegal conversion, nesting, self reference, missing axis value...
    InvalidOperation,

    /// Input failed field validation
    Validation,

    /// The database failed; details are logged, not returned
    Storage,
}

impl CatalogError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CatalogError {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        CatalogError::new(ErrorKind::NotFound, format!("{} not found: {}", entity, id))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::new(
            ErrorKind::InvalidOperation,
            format!("Invalid operation: {}", message.into()),
        )
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Converts store errors. Constraint violations become domain kinds;
/// everything else is logged and reported as a generic storage failure.
impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CatalogError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                // "products.sku" -> "sku"
                let column = field.rsplit('.').next().unwrap_or(&field);
                CatalogError::new(
                    ErrorKind::AlreadyExists,
                    format!("{} '{}' already exists", column, value),
                )
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                CatalogError::invalid("row is still referenced by other catalog rows")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                CatalogError::new(ErrorKind::Storage, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                CatalogError::new(ErrorKind::Storage, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                CatalogError::new(ErrorKind::Storage, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CatalogError::new(ErrorKind::Storage, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                CatalogError::new(ErrorKind::Storage, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CatalogError::new(ErrorKind::Storage, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for CatalogError {
    fn from(err: CoreError) -> Self {
        let kind = match &err {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CoreError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            CoreError::Validation(_) => ErrorKind::Validation,
        };
        CatalogError::new(kind, err.to_string())
    }
}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

/// Transactions surface raw sqlx errors on begin/commit.
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
