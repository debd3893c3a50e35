//! # atlas-core: Pure Catalog Logic for Atlas
//!
//! This crate holds the rules of product type management and composition
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Atlas Catalog Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Catalog API (HTTP / admin tools)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        atlas-catalog: Conversion / Composition / Variant        │   │
//! │  │        engines, one transaction per operation                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atlas-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌──────────────┐    │   │
//! │  │   │  types   │ │ conversion │ │  stock   │ │   variant    │    │   │
//! │  │   │  kind    │ │ composition│ │  money   │ │   matrix     │    │   │
//! │  │   └──────────┘ └────────────┘ └──────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    atlas-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Flat records (Product, BundleComponent, VariantAxis, ...)
//! - [`kind`] - `ProductKind` tagged union and the loaded `CatalogProduct`
//! - [`conversion`] - Type transition rules and cleanup planning
//! - [`composition`] - What may be placed in a bundle or grouped product
//! - [`stock`] - Availability and decrement planning
//! - [`variant`] - Axis value resolution, SKU and name generation
//! - [`matrix`] - Lazy Cartesian product of axis values
//! - [`money`] - Integer money (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use atlas_core::matrix::Combinations;
//!
//! let domains = vec![
//!     vec!["Red".to_string(), "Blue".to_string()],
//!     vec!["S".to_string(), "M".to_string()],
//! ];
//! let first = Combinations::new(&domains).next().unwrap();
//! assert_eq!(first, vec!["Red", "S"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod composition;
pub mod conversion;
pub mod error;
pub mod kind;
pub mod matrix;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;
pub mod variant;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use kind::{CatalogProduct, ComponentLine, GroupedLine, ProductKind};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum SKU length.
pub const MAX_SKU_LEN: usize = 50;

/// Maximum product and axis name length.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum axis code length.
pub const MAX_AXIS_CODE_LEN: usize = 50;

/// Axis values are truncated to this many characters inside generated SKUs.
pub const DEFAULT_SKU_SEGMENT_LEN: usize = 10;

/// Upper bound on the size of a variant matrix.
///
/// Matrix size is the product of per-axis cardinalities and grows quickly;
/// deployments can raise or lower it through configuration.
pub const DEFAULT_MAX_MATRIX_COMBINATIONS: usize = 10_000;
