//! # Type Conversion Rules
//!
//! Decides whether a product may change type, and what has to happen
//! when it does. The engine in atlas-catalog executes the plan inside a
//! single transaction.
//!
//! ## Transition Effects
//! ```text
//! ┌───────────────────────┬──────────────────────────────────────────────┐
//! │ Leaving (old type)    │ Cleanup                                      │
//! ├───────────────────────┼──────────────────────────────────────────────┤
//! │ BUNDLE                │ delete owned bundle_components               │
//! │ GROUPED               │ delete owned grouped_items                   │
//! │ CONFIGURABLE          │ detach variants (parent = NULL, SIMPLE)      │
//! ├───────────────────────┼──────────────────────────────────────────────┤
//! │ Entering (new type)   │ Defaults                                     │
//! ├───────────────────────┼──────────────────────────────────────────────┤
//! │ VIRTUAL               │ no shipping, stock 0, always in stock        │
//! │ SIMPLE                │ requires shipping                            │
//! └───────────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - A variant never changes type
//! - The target must differ from the current type
//! - A CONFIGURABLE product with variants cannot leave CONFIGURABLE
//! - A bundle component cannot become BUNDLE, a grouped child cannot
//!   become GROUPED

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, ProductType};

/// Auxiliary data removed when a product leaves its current type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cleanup {
    None,
    DeleteBundleComponents,
    DeleteGroupedItems,
    DetachVariants,
}

impl Cleanup {
    fn leaving(from: ProductType) -> Self {
        match from {
            ProductType::Bundle => Cleanup::DeleteBundleComponents,
            ProductType::Grouped => Cleanup::DeleteGroupedItems,
            ProductType::Configurable => Cleanup::DetachVariants,
            ProductType::Simple | ProductType::Virtual => Cleanup::None,
        }
    }
}

/// A validated type change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionPlan {
    pub from: ProductType,
    pub to: ProductType,
    pub cleanup: Cleanup,
}

impl ConversionPlan {
    /// Sets the new type on `product` along with the type's defaults.
    pub fn apply(&self, product: &mut Product) {
        product.product_type = self.to;
        match self.to {
            ProductType::Virtual => {
                product.requires_shipping = false;
                product.set_stock(0);
            }
            ProductType::Simple => {
                product.requires_shipping = true;
                product.is_in_stock = product.stock_quantity > 0;
            }
            ProductType::Bundle | ProductType::Grouped | ProductType::Configurable => {}
        }
    }
}

/// What is attached to a product when it changes type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    /// Variants whose `parent_id` is the product.
    pub variant_count: usize,
    /// Ids of bundles listing the product as a component.
    pub bundles: Vec<String>,
    /// Ids of grouped products listing the product as a child.
    pub groups: Vec<String>,
}

impl Attachments {
    /// Owners that forbid becoming `target`, if any.
    fn blocking_owners(&self, target: ProductType) -> &[String] {
        match target {
            ProductType::Bundle => self.bundles.as_slice(),
            ProductType::Grouped => self.groups.as_slice(),
            _ => &[],
        }
    }
}

/// Validates a conversion of `product` to `target`.
///
/// ## Errors
/// `InvalidOperation` for a variant, a no-op conversion, a CONFIGURABLE
/// product that still owns variants, or a target that would nest a
/// composite inside a composite of the same kind.
pub fn plan_conversion(
    product: &Product,
    attachments: &Attachments,
    target: ProductType,
) -> CoreResult<ConversionPlan> {
    if product.is_variant() {
        return Err(CoreError::invalid(format!(
            "{} is a variant and cannot change type",
            product.sku
        )));
    }

    if product.product_type == target {
        return Err(CoreError::invalid(format!(
            "{} is already {}",
            product.sku, target
        )));
    }

    if product.product_type == ProductType::Configurable && attachments.variant_count > 0 {
        return Err(CoreError::invalid(format!(
            "{} has {} variant(s); remove them before converting to {}",
            product.sku, attachments.variant_count, target
        )));
    }

    let owners = attachments.blocking_owners(target);
    if !owners.is_empty() {
        return Err(CoreError::invalid(format!(
            "{} is a member of {} {} and cannot become {} itself",
            product.sku,
            target,
            owners.join(", "),
            target
        )));
    }

    Ok(ConversionPlan {
        from: product.product_type,
        to: target,
        cleanup: Cleanup::leaving(product.product_type),
    })
}

/// Types `product` may be converted to.
///
/// Empty for variants and for CONFIGURABLE products with variants;
/// otherwise every type except the current one and those its owners
/// rule out.
pub fn convertible_types(product: &Product, attachments: &Attachments) -> Vec<ProductType> {
    if product.is_variant() {
        return Vec::new();
    }
    if product.product_type == ProductType::Configurable && attachments.variant_count > 0 {
        return Vec::new();
    }
    ProductType::ALL
        .into_iter()
        .filter(|t| *t != product.product_type)
        .filter(|t| attachments.blocking_owners(*t).is_empty())
        .collect()
}
