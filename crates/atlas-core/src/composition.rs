//! # Composition Rules
//!
//! Which products may be placed inside a BUNDLE or GROUPED product.
//!
//! ```text
//!  owner (BUNDLE)            member
//!  ┌────────────┐   ✗ same id             (self reference)
//!  │  KIT-01    │── ✗ member is BUNDLE    (no nested bundles)
//!  │            │── ✗ member is a variant (parent_id set)
//!  └────────────┘── ✓ anything else, once per owner
//! ```
//!
//! GROUPED owners follow the same rules with GROUPED in place of BUNDLE.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{GroupedItemInput, Product, ProductType};

/// Which kind of composite is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    Bundle,
    Grouped,
}

impl Composite {
    pub fn product_type(&self) -> ProductType {
        match self {
            Composite::Bundle => ProductType::Bundle,
            Composite::Grouped => ProductType::Grouped,
        }
    }

    /// Entity name used in error messages.
    pub fn member_label(&self) -> &'static str {
        match self {
            Composite::Bundle => "Bundle component",
            Composite::Grouped => "Grouped item",
        }
    }
}

/// Checks that `owner` is the kind of composite being edited.
pub fn check_owner(composite: Composite, owner: &Product) -> CoreResult<()> {
    let owner_type = composite.product_type();
    if owner.product_type != owner_type {
        return Err(CoreError::invalid(format!(
            "{} is {}, not {}",
            owner.sku, owner.product_type, owner_type
        )));
    }
    Ok(())
}

/// Checks that `owner` can hold `member`.
///
/// ## Errors
/// `InvalidOperation` when the owner has the wrong type, the member is the
/// owner itself, the member is a composite of the same kind, or the member
/// is a variant.
pub fn check_member(composite: Composite, owner: &Product, member: &Product) -> CoreResult<()> {
    check_owner(composite, owner)?;
    let owner_type = composite.product_type();

    if owner.id == member.id {
        return Err(CoreError::invalid(format!(
            "{} cannot contain itself",
            owner.sku
        )));
    }

    if member.product_type == owner_type {
        return Err(CoreError::invalid(format!(
            "{} is a {} and cannot be nested in {} {}",
            member.sku, owner_type, owner_type, owner.sku
        )));
    }

    if member.is_variant() {
        return Err(CoreError::invalid(format!(
            "{} is a variant and cannot be added to {}",
            member.sku, owner.sku
        )));
    }

    Ok(())
}

/// Bundle quantities are clamped to at least one unit.
#[inline]
pub fn clamp_quantity(quantity: i64) -> i64 {
    quantity.max(1)
}

/// Normalized grouped-item quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedQuantities {
    pub default_quantity: i64,
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
}

/// Clamps the default quantity and validates min/max bounds.
pub fn grouped_quantities(input: &GroupedItemInput) -> CoreResult<GroupedQuantities> {
    if input.min_quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "minQuantity".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    if let Some(max) = input.max_quantity {
        if max < input.min_quantity {
            return Err(ValidationError::OutOfRange {
                field: "maxQuantity".to_string(),
                min: input.min_quantity,
                max: i64::MAX,
            }
            .into());
        }
    }

    Ok(GroupedQuantities {
        default_quantity: clamp_quantity(input.default_quantity),
        min_quantity: input.min_quantity,
        max_quantity: input.max_quantity,
    })
}

/// Rejects a replacement list that names the same member twice.
pub fn check_distinct<'a>(
    composite: Composite,
    member_ids: impl IntoIterator<Item = &'a str>,
) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for id in member_ids {
        if !seen.insert(id) {
            return Err(CoreError::already_exists(composite.member_label(), id));
        }
    }
    Ok(())
}
