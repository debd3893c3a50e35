//! # Validation Module
//!
//! Input validation utilities for Atlas.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP / admin UI)                                     │
//! │  └── Deserialization into typed inputs                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: atlas-catalog engines                                        │
//! │  └── THIS MODULE: field rules (SKU, names, quantities, axis codes)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (sku, axis code, composition pairs)                        │
//! │  ├── CHECK (stock >= 0, quantity >= 1)                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atlas_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("KIT-01").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_AXIS_CODE_LEN, MAX_NAME_LEN, MAX_SKU_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only ASCII letters, digits, hyphens, underscores
///
/// ## Example
/// ```rust
/// use atlas_core::validation::validate_sku;
///
/// assert!(validate_sku("SHIRT-RED-M").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: format!(
                "'{}' must contain only letters, numbers, hyphens, and underscores",
                sku
            ),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, MAX_NAME_LEN)
}

/// Validates an axis code.
///
/// Codes are compared lower-cased and may only contain `[a-z0-9_]`, so
/// they can be used verbatim as `{code}` placeholders in SKU patterns.
///
/// ## Returns
/// The normalized (trimmed, lower-cased) code.
///
/// ## Example
/// ```rust
/// use atlas_core::validation::validate_axis_code;
///
/// assert_eq!(validate_axis_code(" Color ").unwrap(), "color");
/// assert!(validate_axis_code("shoe size").is_err());
/// ```
pub fn validate_axis_code(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_lowercase();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_AXIS_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_AXIS_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: format!("'{}' must contain only a-z, 0-9 and underscores", code),
        });
    }

    Ok(code)
}

/// Validates an axis display name.
pub fn validate_axis_name(name: &str) -> ValidationResult<()> {
    validate_text("axis name", name, MAX_NAME_LEN)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested quantity (stock decrement, sale).
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stockQuantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use atlas_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an optional price.
pub fn validate_optional_price(cents: Option<i64>) -> ValidationResult<()> {
    cents.map_or(Ok(()), validate_price_cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("KIT-01").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("shirt_red").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku("SHIRT/RED").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
        assert!(validate_sku(&"A".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Starter Kit").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_axis_code() {
        assert_eq!(validate_axis_code("SIZE").unwrap(), "size");
        assert_eq!(validate_axis_code("shoe_size_eu").unwrap(), "shoe_size_eu");

        assert!(validate_axis_code("").is_err());
        assert!(validate_axis_code("shoe-size").is_err());
        assert!(validate_axis_code(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(5000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_stock_and_price() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());

        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-100).is_err());
        assert!(validate_optional_price(None).is_ok());
        assert!(validate_optional_price(Some(-1)).is_err());
    }
}
