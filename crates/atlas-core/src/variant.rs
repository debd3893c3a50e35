//! # Variant Rules
//!
//! Resolving axis values against a configuration, and deriving variant
//! SKUs and names from them.
//!
//! ## SKU Generation
//! ```text
//! parent SKU: SHIRT        axes: color, size        values: "Navy Blue", "m"
//!
//! pattern "{parent_sku}-{color}-{size}"  → SHIRT-NAVY_BLUE-M
//! no pattern                             → SHIRT-NAVY_BLUE-M   (axis order)
//!
//! each value: UPPER-CASED, spaces → '_', truncated to N chars (default 10)
//! ```
//!
//! ## Default Name
//! ```text
//! "T-Shirt - Color: Navy Blue, Size: M"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{AxisValues, Product, VariantAttributeValue, VariantAxis};

/// One axis with the value a variant takes on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue<'a> {
    pub axis: &'a VariantAxis,
    pub value: String,
}

/// Matches supplied values (keyed by axis code) to the configured axes.
///
/// The result follows the order of `axes`.
///
/// ## Errors
/// `InvalidOperation` naming the axis when a configured axis has no
/// (or an empty) value, or when a value is given for an axis that is not
/// part of the configuration.
pub fn resolve_axis_values<'a>(
    axes: &'a [VariantAxis],
    supplied: &AxisValues,
) -> CoreResult<Vec<ResolvedValue<'a>>> {
    if let Some(unknown) = supplied
        .keys()
        .find(|code| !axes.iter().any(|a| a.code == code.as_str()))
    {
        return Err(CoreError::invalid(format!(
            "axis '{}' is not configured for this product",
            unknown
        )));
    }

    axes.iter()
        .map(|axis| {
            let value = supplied
                .get(&axis.code)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    CoreError::invalid(format!(
                        "missing value for axis '{}' ({})",
                        axis.name, axis.code
                    ))
                })?;
            Ok(ResolvedValue {
                axis,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Normalizes a value for use inside a SKU.
///
/// ## Example
/// ```rust
/// use atlas_core::variant::sku_segment;
///
/// assert_eq!(sku_segment("navy blue", 10), "NAVY_BLUE");
/// assert_eq!(sku_segment("extra large", 10), "EXTRA_LARG");
/// ```
pub fn sku_segment(value: &str, max_len: usize) -> String {
    value
        .trim()
        .to_uppercase()
        .replace(' ', "_")
        .chars()
        .take(max_len)
        .collect()
}

/// Builds a variant SKU.
///
/// With a pattern, `{parent_sku}` is replaced by the parent SKU and each
/// `{code}` by the normalized value of that axis; unknown placeholders are
/// left untouched. Without one the SKU is the parent SKU followed by each
/// normalized value in axis order, separated by `-`.
pub fn generate_sku(
    parent_sku: &str,
    pattern: Option<&str>,
    values: &[ResolvedValue<'_>],
    segment_max_len: usize,
) -> String {
    match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pattern) => values.iter().fold(
            pattern.replace("{parent_sku}", parent_sku),
            |sku, rv| {
                sku.replace(
                    &format!("{{{}}}", rv.axis.code),
                    &sku_segment(&rv.value, segment_max_len),
                )
            },
        ),
        None => std::iter::once(parent_sku.to_string())
            .chain(values.iter().map(|rv| sku_segment(&rv.value, segment_max_len)))
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// `"<parent name> - <Axis1>: <value1>, <Axis2>: <value2>"`
pub fn generate_name(parent_name: &str, values: &[ResolvedValue<'_>]) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|rv| format!("{}: {}", rv.axis.name, rv.value))
        .collect();
    format!("{} - {}", parent_name, parts.join(", "))
}

// =============================================================================
// Variant Views
// =============================================================================

/// An axis value joined with its axis, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisValueView {
    pub axis_id: String,
    pub axis_code: String,
    pub axis_name: String,
    pub value: String,
    pub label: Option<String>,
    pub color_code: Option<String>,
    pub image_url: Option<String>,
}

/// A variant with its axis values in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDetail {
    pub product: Product,
    pub values: Vec<AxisValueView>,
}

impl VariantDetail {
    /// Joins `values` with `axes`, keeping the order of `axes`. Values for
    /// axes that are no longer configured are dropped.
    pub fn assemble(product: Product, axes: &[VariantAxis], values: &[VariantAttributeValue]) -> Self {
        let values = axes
            .iter()
            .filter_map(|axis| {
                values.iter().find(|v| v.axis_id == axis.id).map(|v| AxisValueView {
                    axis_id: axis.id.clone(),
                    axis_code: axis.code.clone(),
                    axis_name: axis.name.clone(),
                    value: v.value.clone(),
                    label: v.label.clone(),
                    color_code: v.color_code.clone(),
                    image_url: v.image_url.clone(),
                })
            })
            .collect();
        VariantDetail { product, values }
    }

    /// Value on the axis with `code`, if any.
    pub fn value_of(&self, code: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.axis_code == code)
            .map(|v| v.value.as_str())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::types::VariantAxis;

    pub fn axis(id: &str, code: &str, name: &str) -> VariantAxis {
        let now = Utc::now();
        VariantAxis {
            id: id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            attribute_id: None,
            position: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
