//! # Stock Math
//!
//! Availability checks and decrement planning for every product kind.
//!
//! ## Rules by Kind
//! ```text
//! ┌──────────────┬────────────────────────────────┬─────────────────────────┐
//! │ Kind         │ valid when                     │ available               │
//! ├──────────────┼────────────────────────────────┼─────────────────────────┤
//! │ VIRTUAL      │ always                         │ unbounded               │
//! │ BUNDLE       │ ∀ c: c.stock ≥ c.qty × n       │ min ⌊c.stock / c.qty⌋   │
//! │              │ (never with zero components)   │                         │
//! │ GROUPED      │ always (children are checked)  │ unknown                 │
//! │ SIMPLE, etc. │ stock ≥ n                      │ stock                   │
//! └──────────────┴────────────────────────────────┴─────────────────────────┘
//! ```
//!
//! Checks here are computed from a snapshot and are advisory. The decrement
//! in atlas-catalog re-validates and applies compare-and-swap updates, so a
//! plan built from a stale snapshot fails instead of driving stock negative.

use serde::{Deserialize, Serialize};

use crate::kind::{CatalogProduct, ProductKind};
use crate::types::Product;

// =============================================================================
// Availability
// =============================================================================

/// How many units of a product can be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    /// VIRTUAL products are never out of stock.
    Unbounded,
    /// GROUPED products defer to their children.
    Unknown,
    /// A concrete number of units (or producible bundles).
    Limited(i64),
}

impl Availability {
    /// The concrete quantity, if there is one.
    pub fn quantity(&self) -> Option<i64> {
        match self {
            Availability::Limited(qty) => Some(*qty),
            Availability::Unbounded | Availability::Unknown => None,
        }
    }
}

/// Result of a stock validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheck {
    pub valid: bool,
    pub message: String,
    pub available: Availability,
}

impl StockCheck {
    fn ok(message: impl Into<String>, available: Availability) -> Self {
        StockCheck {
            valid: true,
            message: message.into(),
            available,
        }
    }

    fn insufficient(message: impl Into<String>, available: Availability) -> Self {
        StockCheck {
            valid: false,
            message: message.into(),
            available,
        }
    }

    /// Shorthand for `available.quantity()`.
    pub fn available_qty(&self) -> Option<i64> {
        self.available.quantity()
    }
}

/// One row's stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub before: i64,
    pub after: i64,
}

impl StockMovement {
    fn take(product: &Product, quantity: i64) -> Self {
        StockMovement {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            quantity,
            before: product.stock_quantity,
            after: product.stock_quantity - quantity,
        }
    }
}

/// Outcome of a stock decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDecrement {
    pub success: bool,
    pub message: String,
    pub decrements: Vec<StockMovement>,
}

impl StockDecrement {
    pub fn rejected(message: impl Into<String>) -> Self {
        StockDecrement {
            success: false,
            message: message.into(),
            decrements: Vec::new(),
        }
    }

    pub fn applied(message: impl Into<String>, decrements: Vec<StockMovement>) -> Self {
        StockDecrement {
            success: true,
            message: message.into(),
            decrements,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Checks whether `requested` units of `cp` can be supplied.
///
/// ## Example
/// ```text
/// KIT-01 = A × 2 (stock 5) + B × 1 (stock 3)
///
/// validate_stock(KIT-01, 2) → valid,   available = min(5/2, 3/1) = 2
/// validate_stock(KIT-01, 3) → invalid, "A: needs 6, has 5"
/// ```
pub fn validate_stock(cp: &CatalogProduct, requested: i64) -> StockCheck {
    match &cp.kind {
        ProductKind::Virtual => StockCheck::ok(
            "virtual product, stock is not tracked",
            Availability::Unbounded,
        ),
        ProductKind::Grouped(_) => StockCheck::ok(
            "grouped product, check each child item",
            Availability::Unknown,
        ),
        ProductKind::Bundle(lines) => {
            if lines.is_empty() {
                return StockCheck::insufficient(
                    format!("bundle {} has no components", cp.product.sku),
                    Availability::Limited(0),
                );
            }

            let producible = lines
                .iter()
                .map(|l| l.product.stock_quantity / l.component.quantity.max(1))
                .min()
                .unwrap_or(0);

            let shortages: Vec<String> = lines
                .iter()
                .filter_map(|l| match l.component.quantity.checked_mul(requested) {
                    Some(needed) if l.product.stock_quantity >= needed => None,
                    Some(needed) => Some(format!(
                        "{}: needs {}, has {}",
                        l.product.sku, needed, l.product.stock_quantity
                    )),
                    None => Some(format!(
                        "{}: needs {} × {}, more than can be stocked",
                        l.product.sku, l.component.quantity, requested
                    )),
                })
                .collect();

            if shortages.is_empty() {
                StockCheck::ok("all components in stock", Availability::Limited(producible))
            } else {
                StockCheck::insufficient(
                    format!("Insufficient component stock: {}", shortages.join("; ")),
                    Availability::Limited(producible),
                )
            }
        }
        ProductKind::Simple | ProductKind::Configurable { .. } => {
            let stock = cp.product.stock_quantity;
            let available = Availability::Limited(stock);
            if stock >= requested {
                StockCheck::ok("in stock", available)
            } else {
                StockCheck::insufficient(
                    format!("{}: needs {}, has {}", cp.product.sku, requested, stock),
                    available,
                )
            }
        }
    }
}

// =============================================================================
// Decrement Planning
// =============================================================================

/// The rows a decrement of `qty` units must touch.
///
/// Call only after [`validate_stock`] reported the request valid. VIRTUAL
/// and GROUPED products yield no movements. Component quantities saturate
/// at `i64::MAX`, which no guarded update can satisfy.
pub fn plan_decrement(cp: &CatalogProduct, qty: i64) -> Vec<StockMovement> {
    match &cp.kind {
        ProductKind::Virtual | ProductKind::Grouped(_) => Vec::new(),
        ProductKind::Bundle(lines) => lines
            .iter()
            .map(|l| StockMovement::take(&l.product, l.component.quantity.saturating_mul(qty)))
            .collect(),
        ProductKind::Simple | ProductKind::Configurable { .. } => {
            vec![StockMovement::take(&cp.product, qty)]
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
