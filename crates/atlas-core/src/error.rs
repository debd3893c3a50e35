//! # Error Types
//!
//! Domain-specific error types for atlas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atlas-core errors (this file)                                         │
//! │  ├── CoreError        - Catalog rule violations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  atlas-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  atlas-catalog errors                                                  │
//! │  └── CatalogError     - What callers see (kind + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴→ CatalogError → API layer        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, component id, axis code)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Catalog rule errors.
///
/// Three kinds cover every rule the engines enforce: something is missing,
/// something would be duplicated, or the requested transition is illegal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A product, component, axis or variant configuration is missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate SKU, duplicate component/child pair or duplicate axis code.
    #[error("{entity} '{value}' already exists")]
    AlreadyExists { entity: String, value: String },

    /// The operation is not allowed for the current state of the catalog.
    ///
    /// ## When This Occurs
    /// - Converting a variant, or to the type the product already has
    /// - Converting a CONFIGURABLE product that still owns variants
    /// - Adding a bundle to a bundle, or a product to itself
    /// - Creating a variant without a value for a configured axis
    /// - Deleting an axis that variants still reference
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an AlreadyExists error.
    pub fn already_exists(entity: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::AlreadyExists {
            entity: entity.into(),
            value: value.into(),
        }
    }

    /// Creates an InvalidOperation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidOperation(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before catalog rules run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, illegal SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Product", "abc");
        assert_eq!(err.to_string(), "Product not found: abc");

        let err = CoreError::already_exists("SKU", "KIT-01");
        assert_eq!(err.to_string(), "SKU 'KIT-01' already exists");

        let err = CoreError::invalid("a bundle cannot contain itself");
        assert_eq!(
            err.to_string(),
            "Invalid operation: a bundle cannot contain itself"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
