//! # Domain Types
//!
//! Flat catalog records shared by every layer of Atlas.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ BundleComponent │   │  GroupedItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  bundle_id      │   │  parent_id      │──►    │
//! │  │  sku (business) │◄──│  component_id   │   │  child_id       │──►    │
//! │  │  product_type   │   │  quantity ≥ 1   │   │  default/min/max│       │
//! │  │  parent_id ─────┼─┐ │  special_price  │   │  position       │       │
//! │  └─────────────────┘ │ └─────────────────┘   └─────────────────┘       │
//! │          ▲           │                                                  │
//! │          └───────────┘ variant → configurable (plain id, never owning)  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  VariantAxis    │   │  VariantConfig  │   │VariantAttributeValue│   │
//! │  │  code (unique)  │◄──│  axis_ids (ord) │   │  (variant, axis)    │   │
//! │  │  name, position │   │  sku_pattern    │   │  value, label, ...  │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `sku`: human-readable business key, unique and immutable once assigned

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// The five product types a catalog item can have.
///
/// ```text
///   SIMPLE ─────── stocked on its own row
///   VIRTUAL ────── no stock, no shipping (gift cards, services)
///   BUNDLE ─────── stock derived from components, sale decrements them
///   GROUPED ────── presents independently stocked children
///   CONFIGURABLE ─ owns SIMPLE variants distinguished by axis values
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Simple,
    Virtual,
    Bundle,
    Grouped,
    Configurable,
}

impl ProductType {
    /// Every type, in declaration order.
    pub const ALL: [ProductType; 5] = [
        ProductType::Simple,
        ProductType::Virtual,
        ProductType::Bundle,
        ProductType::Grouped,
        ProductType::Configurable,
    ];

    /// Upper-case storage/wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "SIMPLE",
            ProductType::Virtual => "VIRTUAL",
            ProductType::Bundle => "BUNDLE",
            ProductType::Grouped => "GROUPED",
            ProductType::Configurable => "CONFIGURABLE",
        }
    }
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Simple
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parsing: `"bundle"`, `"Bundle"` and `"BUNDLE"` are equal.
impl FromStr for ProductType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProductType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: ProductType::ALL.iter().map(|t| t.to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product row.
///
/// The `parent_id` back-reference is only ever set on variants of a
/// CONFIGURABLE product; such rows are always SIMPLE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    pub product_type: ProductType,

    /// Price in cents, when the product has one.
    pub price_cents: Option<i64>,

    /// Units on hand, never negative.
    pub stock_quantity: i64,

    /// Derived: `stock_quantity > 0`, or always true for VIRTUAL.
    pub is_in_stock: bool,

    pub requires_shipping: bool,

    /// Owning configurable product (variants only).
    pub parent_id: Option<String>,

    pub weight_grams: Option<i64>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,

    /// Category ids, loaded from `product_categories`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub category_ids: Vec<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money, if set.
    #[inline]
    pub fn price(&self) -> Option<Money> {
        self.price_cents.map(Money::from_cents)
    }

    /// True for variants of a configurable product.
    #[inline]
    pub fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Sets the stock level and recomputes `is_in_stock`.
    ///
    /// VIRTUAL products ignore the requested level: they hold no stock
    /// and are always available.
    pub fn set_stock(&mut self, quantity: i64) {
        if self.product_type == ProductType::Virtual {
            self.stock_quantity = 0;
            self.is_in_stock = true;
        } else {
            self.stock_quantity = quantity;
            self.is_in_stock = quantity > 0;
        }
    }
}

// =============================================================================
// Composition Rows
// =============================================================================

/// One component line of a BUNDLE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    pub id: String,
    pub bundle_id: String,
    pub component_id: String,
    /// Units of the component consumed per bundle (≥ 1).
    pub quantity: i64,
    pub position: i64,
    /// Overrides the component's own price inside this bundle.
    pub special_price_cents: Option<i64>,
}

/// One child line of a GROUPED product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GroupedItem {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    pub default_quantity: i64,
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    pub position: i64,
}

// =============================================================================
// Variant Rows
// =============================================================================

/// A dimension a configurable product varies along (Color, Size, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VariantAxis {
    pub id: String,
    /// Stable identifier used as `{code}` in SKU patterns.
    pub code: String,
    pub name: String,
    /// Optional link to an attribute definition managed elsewhere.
    pub attribute_id: Option<String>,
    pub position: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Per-product variant configuration.
///
/// `axis_ids` is ordered; that order drives SKU segments, default names
/// and matrix iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VariantConfig {
    pub product_id: String,
    pub axis_ids: Vec<String>,
    pub auto_generate_sku: bool,
    /// Template with `{parent_sku}` and `{axisCode}` placeholders.
    pub sku_pattern: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The value a variant takes on one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VariantAttributeValue {
    pub variant_id: String,
    pub axis_id: String,
    pub value: String,
    pub label: Option<String>,
    pub color_code: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Data for creating a root product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub product_type: ProductType,
    pub price_cents: Option<i64>,
    pub stock_quantity: i64,
    /// Defaults to `true` except for VIRTUAL products.
    pub requires_shipping: Option<bool>,
    pub weight_grams: Option<i64>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub category_ids: Vec<String>,
}

impl NewProduct {
    /// Minimal input: SKU, name and type.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, product_type: ProductType) -> Self {
        NewProduct {
            sku: sku.into(),
            name: name.into(),
            product_type,
            ..Default::default()
        }
    }

    pub fn with_price(mut self, cents: i64) -> Self {
        self.price_cents = Some(cents);
        self
    }

    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }
}

/// Partial update of a product. `None` leaves a field untouched; the SKU
/// cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub requires_shipping: Option<bool>,
    pub weight_grams: Option<i64>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub category_ids: Option<Vec<String>>,
}

/// A component to place in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
    pub component_id: String,
    /// Clamped to at least 1.
    pub quantity: i64,
    /// Defaults to the index in the submitted list (or the end of the bundle).
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub special_price_cents: Option<i64>,
}

impl ComponentInput {
    pub fn new(component_id: impl Into<String>, quantity: i64) -> Self {
        ComponentInput {
            component_id: component_id.into(),
            quantity,
            position: None,
            special_price_cents: None,
        }
    }
}

/// A child to place in a grouped product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedItemInput {
    pub child_id: String,
    #[serde(default = "default_grouped_quantity")]
    pub default_quantity: i64,
    #[serde(default)]
    pub min_quantity: i64,
    #[serde(default)]
    pub max_quantity: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
}

fn default_grouped_quantity() -> i64 {
    1
}

impl GroupedItemInput {
    pub fn new(child_id: impl Into<String>) -> Self {
        GroupedItemInput {
            child_id: child_id.into(),
            default_quantity: default_grouped_quantity(),
            min_quantity: 0,
            max_quantity: None,
            position: None,
        }
    }
}

/// Data for creating a variant axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub attribute_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl AxisInput {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        AxisInput {
            code: code.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update of an axis. The code is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisPatch {
    pub name: Option<String>,
    pub attribute_id: Option<String>,
    pub position: Option<i64>,
    pub is_active: Option<bool>,
}

/// Presentation extras for one axis value of a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisPresentation {
    pub label: Option<String>,
    pub color_code: Option<String>,
    pub image_url: Option<String>,
}

/// Axis values keyed by axis code, e.g. `{"color": "Red", "size": "M"}`.
pub type AxisValues = BTreeMap<String, String>;

/// Optional overrides when creating a variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantOverrides {
    pub sku: Option<String>,
    pub name: Option<String>,
    /// Defaults to the parent's price.
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    /// Keyed by axis code.
    pub presentation: BTreeMap<String, AxisPresentation>,
}

/// Partial update of a variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantPatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    /// Upserted per axis code.
    pub axis_values: AxisValues,
    pub presentation: BTreeMap<String, AxisPresentation>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(product_type: ProductType) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Thing".to_string(),
            product_type,
            price_cents: Some(500),
            stock_quantity: 3,
            is_in_stock: true,
            requires_shipping: true,
            parent_id: None,
            weight_grams: None,
            brand: None,
            manufacturer: None,
            category_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_type_parses_case_insensitively() {
        assert_eq!("bundle".parse::<ProductType>().unwrap(), ProductType::Bundle);
        assert_eq!("BUNDLE".parse::<ProductType>().unwrap(), ProductType::Bundle);
        assert_eq!(
            " Configurable ".parse::<ProductType>().unwrap(),
            ProductType::Configurable
        );
        assert!("kit".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_product_type_display_and_serde() {
        assert_eq!(ProductType::Grouped.to_string(), "GROUPED");
        assert_eq!(
            serde_json::to_string(&ProductType::Virtual).unwrap(),
            "\"VIRTUAL\""
        );
    }

    #[test]
    fn test_set_stock_recomputes_flag() {
        let mut p = product(ProductType::Simple);
        p.set_stock(0);
        assert!(!p.is_in_stock);
        p.set_stock(4);
        assert!(p.is_in_stock);
        assert_eq!(p.stock_quantity, 4);
    }

    #[test]
    fn test_set_stock_on_virtual_is_ignored() {
        let mut p = product(ProductType::Virtual);
        p.set_stock(10);
        assert_eq!(p.stock_quantity, 0);
        assert!(p.is_in_stock);
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product(ProductType::Simple)).unwrap();
        assert_eq!(json["productType"], "SIMPLE");
        assert_eq!(json["stockQuantity"], 3);
        assert!(json.get("parentId").is_some());
    }
}
