//! # Variant Matrix
//!
//! The Cartesian product of the values observed on each configured axis,
//! annotated with which combinations already exist as variants.
//!
//! ## Iteration Order
//! ```text
//! axes:   color = [Red, Blue]     size = [S, M]
//!
//! cursor  [0,0] → (Red,  S)
//!         [0,1] → (Red,  M)       last axis turns fastest,
//!         [1,0] → (Blue, S)       like nested loops in axis order
//!         [1,1] → (Blue, M)
//! ```
//!
//! [`Combinations`] yields lazily, so a caller that only needs a prefix of a
//! large matrix never materializes the rest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{VariantAttributeValue, VariantAxis};

// =============================================================================
// Combinations
// =============================================================================

/// Lazy odometer over per-axis value domains.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    domains: &'a [Vec<String>],
    cursor: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    /// Empty when there are no domains or any domain is empty.
    pub fn new(domains: &'a [Vec<String>]) -> Self {
        Combinations {
            domains,
            cursor: vec![0; domains.len()],
            done: domains.is_empty() || domains.iter().any(Vec::is_empty),
        }
    }
}

impl<'a> Iterator for Combinations<'a> {
    type Item = Vec<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self
            .cursor
            .iter()
            .zip(self.domains)
            .map(|(&i, domain)| domain[i].as_str())
            .collect();

        // advance, carrying from the last axis towards the first
        let mut axis = self.domains.len();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.cursor[axis] += 1;
            if self.cursor[axis] < self.domains[axis].len() {
                break;
            }
            self.cursor[axis] = 0;
        }

        Some(current)
    }
}

/// Product of the domain sizes, `None` on overflow. Zero when any domain is
/// empty or there are no domains.
pub fn combination_count(domains: &[Vec<String>]) -> Option<usize> {
    if domains.is_empty() {
        return Some(0);
    }
    domains
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(d.len()))
}

// =============================================================================
// Matrix Entries
// =============================================================================

/// One `(axis code, value)` coordinate of a matrix entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisValuePair {
    pub axis_code: String,
    pub value: String,
}

/// One combination of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixEntry {
    /// Coordinates in configuration order.
    pub values: Vec<AxisValuePair>,
    pub exists: bool,
    pub variant_id: Option<String>,
}

impl MatrixEntry {
    /// Value on the axis with `code`, if present.
    pub fn value_of(&self, code: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|p| p.axis_code == code)
            .map(|p| p.value.as_str())
    }
}

/// Index of existing variants by their value tuple over the configured axes.
///
/// A variant is indexed only when it has a value on every configured axis;
/// values on axes outside the configuration are ignored.
#[derive(Debug, Default)]
pub struct VariantIndex {
    by_values: HashMap<Vec<String>, String>,
}

impl VariantIndex {
    pub fn build<'v>(
        axes: &[VariantAxis],
        variants: impl IntoIterator<Item = (&'v str, &'v [VariantAttributeValue])>,
    ) -> Self {
        let mut by_values = HashMap::new();
        for (variant_id, values) in variants {
            let key: Option<Vec<String>> = axes
                .iter()
                .map(|axis| {
                    values
                        .iter()
                        .find(|v| v.axis_id == axis.id)
                        .map(|v| v.value.clone())
                })
                .collect();
            if let Some(key) = key {
                by_values.entry(key).or_insert_with(|| variant_id.to_string());
            }
        }
        VariantIndex { by_values }
    }

    /// Variant whose values match `combination` exactly.
    pub fn find(&self, combination: &[&str]) -> Option<&str> {
        let key: Vec<String> = combination.iter().map(|s| s.to_string()).collect();
        self.by_values.get(&key).map(String::as_str)
    }
}

/// Annotates each combination with the variant that realizes it.
pub fn matrix_entries<'a>(
    axes: &'a [VariantAxis],
    combinations: Combinations<'a>,
    index: &'a VariantIndex,
) -> impl Iterator<Item = MatrixEntry> + 'a {
    combinations.map(move |combo| {
        let variant_id = index.find(&combo).map(str::to_string);
        MatrixEntry {
            values: axes
                .iter()
                .zip(&combo)
                .map(|(axis, value)| AxisValuePair {
                    axis_code: axis.code.clone(),
                    value: value.to_string(),
                })
                .collect(),
            exists: variant_id.is_some(),
            variant_id,
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
