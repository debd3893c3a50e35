//! # Product Kinds
//!
//! The loaded view of a product: its row plus whatever its type owns.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  CatalogProduct { product, kind }                                   │
//! │                                                                      │
//! │  kind ─┬─ Simple                                                    │
//! │        ├─ Virtual                                                   │
//! │        ├─ Bundle(Vec<ComponentLine>)        row + component product │
//! │        ├─ Grouped(Vec<GroupedLine>)         row + child product     │
//! │        └─ Configurable { config, variants }                         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discriminant of `kind` always matches `product.product_type`;
//! [`CatalogProduct::new`] refuses a mismatched pair, so code holding a
//! `CatalogProduct` can match on the kind without re-checking the type field.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BundleComponent, GroupedItem, Product, ProductType, VariantConfig};

/// A bundle component row joined with the component product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLine {
    pub component: BundleComponent,
    pub product: Product,
}

impl ComponentLine {
    /// `special_price ?? component.price ?? 0`
    pub fn unit_price(&self) -> Money {
        self.component
            .special_price_cents
            .map(Money::from_cents)
            .or_else(|| self.product.price())
            .unwrap_or_default()
    }

    /// Unit price times the per-bundle quantity.
    pub fn line_price(&self) -> Money {
        self.unit_price() * self.component.quantity
    }
}

/// A grouped item row joined with the child product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedLine {
    pub item: GroupedItem,
    pub product: Product,
}

/// What a product owns, by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Simple,
    Virtual,
    Bundle(Vec<ComponentLine>),
    Grouped(Vec<GroupedLine>),
    Configurable {
        config: Option<VariantConfig>,
        variants: Vec<Product>,
    },
}

impl ProductKind {
    pub fn product_type(&self) -> ProductType {
        match self {
            ProductKind::Simple => ProductType::Simple,
            ProductKind::Virtual => ProductType::Virtual,
            ProductKind::Bundle(_) => ProductType::Bundle,
            ProductKind::Grouped(_) => ProductType::Grouped,
            ProductKind::Configurable { .. } => ProductType::Configurable,
        }
    }
}

/// A product together with its type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub product: Product,
    pub kind: ProductKind,
}

impl CatalogProduct {
    /// Pairs a product with its kind.
    ///
    /// ## Errors
    /// `InvalidOperation` when the kind does not match the product type, or
    /// when a variant is given anything but a SIMPLE kind.
    pub fn new(product: Product, kind: ProductKind) -> CoreResult<Self> {
        if kind.product_type() != product.product_type {
            return Err(CoreError::invalid(format!(
                "product {} is {} but was loaded as {}",
                product.sku,
                product.product_type,
                kind.product_type()
            )));
        }
        if product.is_variant() && !matches!(kind, ProductKind::Simple) {
            return Err(CoreError::invalid(format!(
                "variant {} must be SIMPLE",
                product.sku
            )));
        }
        Ok(CatalogProduct { product, kind })
    }

    pub fn id(&self) -> &str {
        &self.product.id
    }

    pub fn product_type(&self) -> ProductType {
        self.product.product_type
    }

    /// Number of variants; zero for anything but CONFIGURABLE.
    pub fn variant_count(&self) -> usize {
        match &self.kind {
            ProductKind::Configurable { variants, .. } => variants.len(),
            _ => 0,
        }
    }

    /// Bundle price: Σ `(special ?? price ?? 0) × quantity` over components.
    ///
    /// ## Errors
    /// `InvalidOperation` if the product is not a BUNDLE.
    pub fn bundle_price(&self) -> CoreResult<Money> {
        match &self.kind {
            ProductKind::Bundle(lines) => Ok(lines.iter().map(ComponentLine::line_price).sum()),
            _ => Err(CoreError::invalid(format!(
                "product {} is {}, not BUNDLE",
                self.product.sku, self.product.product_type
            ))),
        }
    }
}
