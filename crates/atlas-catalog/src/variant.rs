//! # Variant Engine
//!
//! Axes, per-product variant configuration, variant CRUD and the variant
//! matrix.
//!
//! ## Matrix
//! ```text
//!  SHIRT configured with [color, size]
//!
//!  observed values      color: Red, Blue      size: S, M
//!                               │                  │
//!  combinations                 └──── odometer ────┘
//!                       (Red,S) (Red,M) (Blue,S) (Blue,M)
//!                          ✓       ✗       ✗        ✓     ← exists?
//! ```
//! Domains are the values already used by the parent's variants, in the
//! order they first appeared, so two calls over unchanged data agree.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use atlas_core::matrix::{combination_count, matrix_entries, Combinations, MatrixEntry, VariantIndex};
use atlas_core::validation::{
    validate_axis_code, validate_axis_name, validate_optional_price, validate_product_name,
    validate_sku, validate_stock_quantity,
};
use atlas_core::variant::{generate_name, generate_sku, resolve_axis_values, VariantDetail};
use atlas_core::{
    AxisInput, AxisPatch, AxisValues, CoreError, Product, ProductType, VariantAttributeValue,
    VariantAxis, VariantConfig, VariantOverrides, VariantPatch,
};
use atlas_db::{Database, ProductRepository, VariantRepository};

use crate::config::VariantSettings;
use crate::conversion::convert_in;
use crate::error::{CatalogError, CatalogResult};

/// Arguments of [`VariantEngine::configure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSetup {
    /// Axes in the order variants should use them.
    pub axis_ids: Vec<String>,
    #[serde(default)]
    pub sku_pattern: Option<String>,
    #[serde(default = "default_auto_generate")]
    pub auto_generate_sku: bool,
}

fn default_auto_generate() -> bool {
    true
}

impl VariantSetup {
    pub fn new(axis_ids: Vec<String>) -> Self {
        VariantSetup {
            axis_ids,
            sku_pattern: None,
            auto_generate_sku: true,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.sku_pattern = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct VariantEngine {
    db: Database,
    settings: VariantSettings,
}

impl VariantEngine {
    pub fn new(db: Database, settings: VariantSettings) -> Self {
        VariantEngine { db, settings }
    }

    // =========================================================================
    // Axes
    // =========================================================================

    /// Creates an axis. The code is lower-cased and must be unique.
    pub async fn create_axis(&self, input: AxisInput) -> CatalogResult<VariantAxis> {
        let code = validate_axis_code(&input.code)?;
        validate_axis_name(&input.name)?;

        let mut tx = self.db.begin().await?;

        if VariantRepository::get_axis_by_code(&mut tx, &code).await?.is_some() {
            return Err(CoreError::already_exists("Variant axis", code).into());
        }

        let now = Utc::now();
        let axis = VariantAxis {
            id: Uuid::new_v4().to_string(),
            code,
            name: input.name.trim().to_string(),
            attribute_id: input.attribute_id,
            position: input.position.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        VariantRepository::insert_axis(&mut tx, &axis).await?;
        tx.commit().await?;

        info!(id = %axis.id, code = %axis.code, "Variant axis created");
        Ok(axis)
    }

    pub async fn get_axis(&self, id: &str) -> CatalogResult<VariantAxis> {
        let mut conn = self.db.acquire().await?;
        require_axis(&mut conn, id).await
    }

    /// Axes ordered by position, then code.
    pub async fn list_axes(&self, active_only: bool) -> CatalogResult<Vec<VariantAxis>> {
        let mut conn = self.db.acquire().await?;
        Ok(VariantRepository::list_axes(&mut conn, active_only).await?)
    }

    /// Patches name, attribute link, position or active flag. The code is
    /// immutable.
    pub async fn update_axis(&self, id: &str, patch: AxisPatch) -> CatalogResult<VariantAxis> {
        let mut tx = self.db.begin().await?;
        let mut axis = require_axis(&mut tx, id).await?;

        if let Some(name) = patch.name {
            validate_axis_name(&name)?;
            axis.name = name.trim().to_string();
        }
        if patch.attribute_id.is_some() {
            axis.attribute_id = patch.attribute_id;
        }
        if let Some(position) = patch.position {
            axis.position = position;
        }
        if let Some(is_active) = patch.is_active {
            axis.is_active = is_active;
        }
        axis.updated_at = Utc::now();

        VariantRepository::update_axis(&mut tx, &axis).await?;
        tx.commit().await?;

        info!(id = %axis.id, code = %axis.code, "Variant axis updated");
        Ok(axis)
    }

    /// Deletes an axis no variant uses.
    pub async fn delete_axis(&self, id: &str) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        let axis = require_axis(&mut tx, id).await?;

        let in_use = VariantRepository::count_values_by_axis(&mut tx, id).await?;
        if in_use > 0 {
            return Err(CatalogError::invalid(format!(
                "axis '{}' is used by {} variant value(s)",
                axis.code, in_use
            )));
        }

        VariantRepository::delete_axis(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, code = %axis.code, "Variant axis deleted");
        Ok(())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Sets the axes a product varies along, promoting it to CONFIGURABLE
    /// when needed.
    ///
    /// Unknown axis ids are dropped, duplicates keep their first position.
    ///
    /// ## Errors
    /// `InvalidOperation` when the product is a variant or none of the
    /// axes exist.
    pub async fn configure(&self, product_id: &str, setup: VariantSetup) -> CatalogResult<VariantConfig> {
        let mut tx = self.db.begin().await?;
        let mut product = ProductRepository::require(&mut tx, product_id).await?;

        if product.is_variant() {
            return Err(CatalogError::invalid(format!(
                "{} is a variant and cannot have variants",
                product.sku
            )));
        }

        let mut requested: Vec<String> = Vec::with_capacity(setup.axis_ids.len());
        for id in setup.axis_ids {
            if !requested.contains(&id) {
                requested.push(id);
            }
        }
        let axes = VariantRepository::get_axes(&mut tx, &requested).await?;
        if axes.is_empty() {
            return Err(CatalogError::invalid(format!(
                "none of the given axes exist for {}",
                product.sku
            )));
        }

        if product.product_type != ProductType::Configurable {
            let (converted, plan) = convert_in(&mut tx, product, ProductType::Configurable).await?;
            info!(sku = %converted.sku, from = %plan.from, "Promoted to CONFIGURABLE");
            product = converted;
        }

        let now = Utc::now();
        let created_at = VariantRepository::get_config(&mut tx, product_id)
            .await?
            .map(|c| c.created_at)
            .unwrap_or(now);

        let config = VariantConfig {
            product_id: product.id.clone(),
            axis_ids: axes.into_iter().map(|a| a.id).collect(),
            auto_generate_sku: setup.auto_generate_sku,
            sku_pattern: setup
                .sku_pattern
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            created_at,
            updated_at: now,
        };
        VariantRepository::upsert_config(&mut tx, &config).await?;
        tx.commit().await?;

        info!(sku = %product.sku, axes = config.axis_ids.len(), "Variants configured");
        Ok(config)
    }

    pub async fn get_config(&self, product_id: &str) -> CatalogResult<VariantConfig> {
        let mut conn = self.db.acquire().await?;
        require_config(&mut conn, product_id).await
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Creates one variant of a configurable product.
    ///
    /// `values` must hold a non-empty value for every configured axis and
    /// nothing else. The SKU is the override, or generated from the
    /// configured pattern; the name defaults to
    /// `"<parent> - <Axis>: <value>, ..."`. Price, weight, brand,
    /// manufacturer and categories come from the parent unless overridden.
    pub async fn create_variant(
        &self,
        parent_id: &str,
        values: &AxisValues,
        overrides: VariantOverrides,
    ) -> CatalogResult<VariantDetail> {
        let mut tx = self.db.begin().await?;

        let parent = ProductRepository::require(&mut tx, parent_id).await?;
        if parent.product_type != ProductType::Configurable {
            return Err(CatalogError::invalid(format!(
                "{} is {}, not CONFIGURABLE",
                parent.sku, parent.product_type
            )));
        }
        let config = require_config(&mut tx, parent_id).await?;
        let axes = VariantRepository::get_axes(&mut tx, &config.axis_ids).await?;
        let resolved = resolve_axis_values(&axes, values)?;

        let sku = match overrides.sku.as_deref().map(str::trim) {
            Some(sku) => sku.to_string(),
            None if config.auto_generate_sku => generate_sku(
                &parent.sku,
                config.sku_pattern.as_deref(),
                &resolved,
                self.settings.sku_segment_max_len,
            ),
            None => {
                return Err(CatalogError::invalid(format!(
                    "SKU generation is disabled for {}; supply a SKU",
                    parent.sku
                )))
            }
        };
        validate_sku(&sku)?;
        if ProductRepository::exists_by_sku(&mut tx, &sku).await? {
            return Err(CoreError::already_exists("SKU", sku).into());
        }

        let name = match overrides.name {
            Some(name) => name.trim().to_string(),
            None => generate_name(&parent.name, &resolved),
        };
        validate_product_name(&name)?;

        let price_cents = overrides.price_cents.or(parent.price_cents);
        validate_optional_price(price_cents)?;
        let stock = overrides.stock_quantity.unwrap_or(0);
        validate_stock_quantity(stock)?;

        let now = Utc::now();
        let mut variant = Product {
            id: Uuid::new_v4().to_string(),
            sku,
            name,
            product_type: ProductType::Simple,
            price_cents,
            stock_quantity: 0,
            is_in_stock: false,
            requires_shipping: true,
            parent_id: Some(parent.id.clone()),
            weight_grams: parent.weight_grams,
            brand: parent.brand.clone(),
            manufacturer: parent.manufacturer.clone(),
            category_ids: parent.category_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        variant.set_stock(stock);
        ProductRepository::insert(&mut tx, &variant).await?;

        let mut rows = Vec::with_capacity(resolved.len());
        for rv in &resolved {
            let presentation = overrides.presentation.get(&rv.axis.code).cloned().unwrap_or_default();
            let row = VariantAttributeValue {
                variant_id: variant.id.clone(),
                axis_id: rv.axis.id.clone(),
                value: rv.value.clone(),
                label: presentation.label,
                color_code: presentation.color_code,
                image_url: presentation.image_url,
            };
            VariantRepository::upsert_value(&mut tx, &row).await?;
            rows.push(row);
        }

        tx.commit().await?;

        info!(parent = %parent.sku, sku = %variant.sku, "Variant created");
        Ok(VariantDetail::assemble(variant, &axes, &rows))
    }

    /// Patches name, price, stock and axis values of a variant.
    pub async fn update_variant(&self, variant_id: &str, patch: VariantPatch) -> CatalogResult<VariantDetail> {
        let mut tx = self.db.begin().await?;
        let mut variant = require_variant(&mut tx, variant_id).await?;

        if let Some(name) = patch.name {
            validate_product_name(&name)?;
            variant.name = name.trim().to_string();
        }
        if let Some(cents) = patch.price_cents {
            validate_optional_price(Some(cents))?;
            variant.price_cents = Some(cents);
        }
        if let Some(quantity) = patch.stock_quantity {
            validate_stock_quantity(quantity)?;
            variant.set_stock(quantity);
        }
        variant.updated_at = Utc::now();
        ProductRepository::update(&mut tx, &variant).await?;

        let axes = configured_axes(&mut tx, variant.parent_id.as_deref().unwrap_or_default()).await?;
        let current = VariantRepository::list_values_by_variant(&mut tx, variant_id).await?;

        let mut codes: Vec<&String> = patch.axis_values.keys().collect();
        codes.extend(patch.presentation.keys().filter(|c| !patch.axis_values.contains_key(*c)));

        for code in codes {
            let axis = axes.iter().find(|a| &a.code == code).ok_or_else(|| {
                CatalogError::invalid(format!("axis '{}' is not configured for this product", code))
            })?;
            let existing = current.iter().find(|v| v.axis_id == axis.id);

            let value = match patch.axis_values.get(code).map(|v| v.trim()) {
                Some("") => {
                    return Err(CatalogError::invalid(format!(
                        "missing value for axis '{}' ({})",
                        axis.name, axis.code
                    )))
                }
                Some(v) => v.to_string(),
                None => match existing {
                    Some(row) => row.value.clone(),
                    None => {
                        return Err(CatalogError::invalid(format!(
                            "missing value for axis '{}' ({})",
                            axis.name, axis.code
                        )))
                    }
                },
            };

            let row = match patch.presentation.get(code) {
                Some(p) => VariantAttributeValue {
                    variant_id: variant.id.clone(),
                    axis_id: axis.id.clone(),
                    value,
                    label: p.label.clone(),
                    color_code: p.color_code.clone(),
                    image_url: p.image_url.clone(),
                },
                None => VariantAttributeValue {
                    variant_id: variant.id.clone(),
                    axis_id: axis.id.clone(),
                    value,
                    label: existing.and_then(|r| r.label.clone()),
                    color_code: existing.and_then(|r| r.color_code.clone()),
                    image_url: existing.and_then(|r| r.image_url.clone()),
                },
            };
            VariantRepository::upsert_value(&mut tx, &row).await?;
        }

        let values = VariantRepository::list_values_by_variant(&mut tx, variant_id).await?;
        tx.commit().await?;

        info!(id = %variant.id, sku = %variant.sku, "Variant updated");
        Ok(VariantDetail::assemble(variant, &axes, &values))
    }

    /// Removes a variant and its axis values.
    pub async fn delete_variant(&self, variant_id: &str) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        let variant = require_variant(&mut tx, variant_id).await?;

        let removed = VariantRepository::delete_values_by_variant(&mut tx, variant_id).await?;
        ProductRepository::delete(&mut tx, variant_id).await?;
        tx.commit().await?;

        info!(id = %variant_id, sku = %variant.sku, values = removed, "Variant deleted");
        Ok(())
    }

    /// Variants of `parent_id` with their values in configuration order.
    pub async fn list_variants(&self, parent_id: &str) -> CatalogResult<Vec<VariantDetail>> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::require(&mut conn, parent_id).await?;

        let axes = configured_axes(&mut conn, parent_id).await?;
        let variants = ProductRepository::list_by_parent(&mut conn, parent_id).await?;
        let mut values = group_values(VariantRepository::list_values_by_parent(&mut conn, parent_id).await?);

        Ok(variants
            .into_iter()
            .map(|v| {
                let rows = values.remove(&v.id).unwrap_or_default();
                VariantDetail::assemble(v, &axes, &rows)
            })
            .collect())
    }

    // =========================================================================
    // Matrix
    // =========================================================================

    /// Every combination of the values observed on each configured axis,
    /// flagged with the variant that realizes it.
    ///
    /// ## Errors
    /// - `InvalidOperation` for a product that is not CONFIGURABLE, or
    ///   when the combination count exceeds `max_matrix_combinations`
    /// - `NotFound` when the product has no configuration
    pub async fn matrix(&self, parent_id: &str) -> CatalogResult<Vec<MatrixEntry>> {
        let mut conn = self.db.acquire().await?;

        let parent = ProductRepository::require(&mut conn, parent_id).await?;
        if parent.product_type != ProductType::Configurable {
            return Err(CatalogError::invalid(format!(
                "{} is {}, not CONFIGURABLE",
                parent.sku, parent.product_type
            )));
        }
        let config = require_config(&mut conn, parent_id).await?;
        let axes = VariantRepository::get_axes(&mut conn, &config.axis_ids).await?;

        let mut domains = Vec::with_capacity(axes.len());
        for axis in &axes {
            domains.push(
                VariantRepository::list_distinct_values_by_parent_and_axis(&mut conn, parent_id, &axis.id)
                    .await?,
            );
        }

        let count = combination_count(&domains).unwrap_or(usize::MAX);
        if count > self.settings.max_matrix_combinations {
            return Err(CatalogError::invalid(format!(
                "matrix of {} has {} combinations, limit is {}",
                parent.sku, count, self.settings.max_matrix_combinations
            )));
        }

        let values = group_values(VariantRepository::list_values_by_parent(&mut conn, parent_id).await?);
        let index = VariantIndex::build(
            &axes,
            values.iter().map(|(id, rows)| (id.as_str(), rows.as_slice())),
        );

        let entries: Vec<MatrixEntry> =
            matrix_entries(&axes, Combinations::new(&domains), &index).collect();

        debug!(sku = %parent.sku, combinations = entries.len(), "Variant matrix generated");
        Ok(entries)
    }

    /// Creates one variant per combination, skipping the ones that fail.
    ///
    /// Skipped combinations are only logged; the result holds the
    /// variants that were created, in input order.
    pub async fn bulk_create(
        &self,
        parent_id: &str,
        combinations: Vec<AxisValues>,
    ) -> CatalogResult<Vec<VariantDetail>> {
        let requested = combinations.len();
        let mut created = Vec::with_capacity(requested);

        for values in combinations {
            match self.create_variant(parent_id, &values, VariantOverrides::default()).await {
                Ok(detail) => created.push(detail),
                Err(e) => {
                    warn!(parent_id = %parent_id, values = ?values, error = %e, "Skipping variant combination");
                }
            }
        }

        info!(parent_id = %parent_id, requested, created = created.len(), "Bulk variant creation finished");
        Ok(created)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn require_axis(conn: &mut SqliteConnection, id: &str) -> CatalogResult<VariantAxis> {
    VariantRepository::get_axis(conn, id)
        .await?
        .ok_or_else(|| CatalogError::not_found("Variant axis", id))
}

async fn require_config(conn: &mut SqliteConnection, product_id: &str) -> CatalogResult<VariantConfig> {
    VariantRepository::get_config(conn, product_id)
        .await?
        .ok_or_else(|| CatalogError::not_found("Variant config", product_id))
}

async fn require_variant(conn: &mut SqliteConnection, id: &str) -> CatalogResult<Product> {
    let product = ProductRepository::require(conn, id).await?;
    if !product.is_variant() {
        return Err(CatalogError::invalid(format!("{} is not a variant", product.sku)));
    }
    Ok(product)
}

/// Configured axes of a product, empty when it has no configuration.
async fn configured_axes(conn: &mut SqliteConnection, product_id: &str) -> CatalogResult<Vec<VariantAxis>> {
    match VariantRepository::get_config(conn, product_id).await? {
        Some(config) => Ok(VariantRepository::get_axes(conn, &config.axis_ids).await?),
        None => Ok(Vec::new()),
    }
}

fn group_values(rows: Vec<VariantAttributeValue>) -> HashMap<String, Vec<VariantAttributeValue>> {
    let mut grouped: HashMap<String, Vec<VariantAttributeValue>> = HashMap::new();
    for row in rows {
        grouped.entry(row.variant_id.clone()).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{catalog, configurable, shirt_with_axes, simple, values};
    use atlas_core::AxisPresentation;

    #[tokio::test]
    async fn test_axis_crud() {
        let catalog = catalog().await;
        let engine = catalog.variants();

        let color = engine.create_axis(AxisInput::new("Color", "Color")).await.unwrap();
        assert_eq!(color.code, "color");

        let err = engine.create_axis(AxisInput::new("color", "Colour")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = engine.create_axis(AxisInput::new("co lor", "Color")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut size = AxisInput::new("size", "Size");
        size.position = Some(-1);
        let size = engine.create_axis(size).await.unwrap();

        let axes = engine.list_axes(false).await.unwrap();
        assert_eq!(axes[0].id, size.id);

        let updated = engine
            .update_axis(
                &color.id,
                AxisPatch {
                    is_active: Some(false),
                    name: Some("Colour".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.code, "color");
        assert_eq!(updated.name, "Colour");
        assert_eq!(engine.list_axes(true).await.unwrap().len(), 1);

        engine.delete_axis(&color.id).await.unwrap();
        let err = engine.get_axis(&color.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_axis_in_use_fails() {
        let catalog = catalog().await;
        let (shirt, color, _) = shirt_with_axes(&catalog).await;
        catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "Red"), ("size", "M")]), VariantOverrides::default())
            .await
            .unwrap();

        let err = catalog.variants().delete_axis(&color.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.message.contains("color"));
    }

    #[tokio::test]
    async fn test_configure_promotes_and_filters_axes() {
        let catalog = catalog().await;
        let tee = simple(&catalog, "TEE", 0).await;
        let color = catalog
            .variants()
            .create_axis(AxisInput::new("color", "Color"))
            .await
            .unwrap();

        let config = catalog
            .variants()
            .configure(
                &tee.id,
                VariantSetup::new(vec![
                    "missing".to_string(),
                    color.id.clone(),
                    color.id.clone(),
                ])
                .with_pattern("{parent_sku}/{color}"),
            )
            .await
            .unwrap();
        assert_eq!(config.axis_ids, vec![color.id.clone()]);
        assert_eq!(config.sku_pattern.as_deref(), Some("{parent_sku}/{color}"));

        let tee = catalog.products().get(&tee.id).await.unwrap();
        assert_eq!(tee.product_type, ProductType::Configurable);

        let err = catalog
            .variants()
            .configure(&tee.id, VariantSetup::new(vec!["missing".to_string()]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_missing_axis_value_names_the_axis() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;

        let err = catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "Red")]), VariantOverrides::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.message.contains("Size"));

        let err = catalog
            .variants()
            .create_variant(
                &shirt.id,
                &values(&[("color", "Red"), ("size", "M"), ("fit", "Slim")]),
                VariantOverrides::default(),
            )
            .await
            .unwrap_err();
        assert!(err.message.contains("fit"));
    }

    #[tokio::test]
    async fn test_create_variant_generates_sku_and_name() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;

        let red = catalog
            .variants()
            .create_variant(
                &shirt.id,
                &values(&[("color", "navy blue"), ("size", "M")]),
                VariantOverrides::default(),
            )
            .await
            .unwrap();

        assert_eq!(red.product.sku, "SHIRT-NAVY_BLUE-M");
        assert_eq!(red.product.name, "Shirt - Color: navy blue, Size: M");
        assert_eq!(red.product.product_type, ProductType::Simple);
        assert_eq!(red.product.parent_id.as_deref(), Some(shirt.id.as_str()));
        assert_eq!(red.product.price_cents, shirt.price_cents);
        assert_eq!(red.product.brand.as_deref(), Some("Acme"));
        assert_eq!(red.value_of("size"), Some("M"));

        // same combination generates the same SKU
        let err = catalog
            .variants()
            .create_variant(
                &shirt.id,
                &values(&[("color", "navy blue"), ("size", "M")]),
                VariantOverrides::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_sku_pattern_and_overrides() {
        let catalog = catalog().await;
        let (shirt, color, size) = shirt_with_axes(&catalog).await;
        catalog
            .variants()
            .configure(
                &shirt.id,
                VariantSetup::new(vec![color.id.clone(), size.id.clone()])
                    .with_pattern("{parent_sku}_{size}_{color}"),
            )
            .await
            .unwrap();

        let v = catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "Red"), ("size", "xl")]), VariantOverrides::default())
            .await
            .unwrap();
        assert_eq!(v.product.sku, "SHIRT_XL_RED");

        let mut overrides = VariantOverrides {
            sku: Some("SHIRT-CUSTOM".into()),
            name: Some("Custom Shirt".into()),
            price_cents: Some(2500),
            stock_quantity: Some(4),
            ..Default::default()
        };
        overrides.presentation.insert(
            "color".into(),
            AxisPresentation {
                color_code: Some("#0000FF".into()),
                ..Default::default()
            },
        );
        let v = catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "Blue"), ("size", "S")]), overrides)
            .await
            .unwrap();
        assert_eq!(v.product.sku, "SHIRT-CUSTOM");
        assert_eq!(v.product.price_cents, Some(2500));
        assert!(v.product.is_in_stock);
        assert_eq!(v.values[0].color_code.as_deref(), Some("#0000FF"));

        let err = catalog
            .variants()
            .create_variant(
                &shirt.id,
                &values(&[("color", "Green"), ("size", "S")]),
                VariantOverrides {
                    sku: Some("SHIRT-CUSTOM".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_auto_sku_disabled_requires_sku() {
        let catalog = catalog().await;
        let (shirt, color, size) = shirt_with_axes(&catalog).await;
        let mut setup = VariantSetup::new(vec![color.id, size.id]);
        setup.auto_generate_sku = false;
        catalog.variants().configure(&shirt.id, setup).await.unwrap();

        let err = catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "Red"), ("size", "M")]), VariantOverrides::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_create_variant_requires_configurable_parent() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 1).await;
        let err = catalog
            .variants()
            .create_variant(&mug.id, &values(&[("color", "Red")]), VariantOverrides::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let bare = configurable(&catalog, "BARE").await;
        let err = catalog
            .variants()
            .create_variant(&bare.id, &values(&[("color", "Red")]), VariantOverrides::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_matrix_two_by_two() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;
        let engine = catalog.variants();

        let red_s = engine
            .create_variant(&shirt.id, &values(&[("color", "red"), ("size", "S")]), VariantOverrides::default())
            .await
            .unwrap();
        engine
            .create_variant(&shirt.id, &values(&[("color", "blue"), ("size", "M")]), VariantOverrides::default())
            .await
            .unwrap();

        let matrix = engine.matrix(&shirt.id).await.unwrap();
        assert_eq!(matrix.len(), 4);

        let pairs: Vec<(&str, &str, bool)> = matrix
            .iter()
            .map(|e| (e.value_of("color").unwrap(), e.value_of("size").unwrap(), e.exists))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("red", "S", true),
                ("red", "M", false),
                ("blue", "S", false),
                ("blue", "M", true),
            ]
        );
        assert_eq!(matrix[0].variant_id.as_deref(), Some(red_s.product.id.as_str()));

        // deterministic
        assert_eq!(engine.matrix(&shirt.id).await.unwrap(), matrix);
    }

    #[tokio::test]
    async fn test_matrix_round_trip_with_create_and_delete() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;
        let engine = catalog.variants();

        engine
            .create_variant(&shirt.id, &values(&[("color", "red"), ("size", "S")]), VariantOverrides::default())
            .await
            .unwrap();
        engine
            .create_variant(&shirt.id, &values(&[("color", "blue"), ("size", "M")]), VariantOverrides::default())
            .await
            .unwrap();

        let is_present = |matrix: &[MatrixEntry]| {
            matrix
                .iter()
                .find(|e| e.value_of("color") == Some("red") && e.value_of("size") == Some("M"))
                .map(|e| e.exists)
        };
        assert_eq!(is_present(&engine.matrix(&shirt.id).await.unwrap()), Some(false));

        let red_m = engine
            .create_variant(&shirt.id, &values(&[("color", "red"), ("size", "M")]), VariantOverrides::default())
            .await
            .unwrap();
        assert_eq!(is_present(&engine.matrix(&shirt.id).await.unwrap()), Some(true));

        engine.delete_variant(&red_m.product.id).await.unwrap();
        assert_eq!(is_present(&engine.matrix(&shirt.id).await.unwrap()), Some(false));
    }

    #[tokio::test]
    async fn test_matrix_guards() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;

        // no variants yet: no observed values
        assert!(catalog.variants().matrix(&shirt.id).await.unwrap().is_empty());

        let mug = simple(&catalog, "MUG", 1).await;
        let err = catalog.variants().matrix(&mug.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let tight = VariantEngine::new(
            catalog.database().clone(),
            VariantSettings {
                max_matrix_combinations: 3,
                ..Default::default()
            },
        );
        tight
            .bulk_create(
                &shirt.id,
                vec![
                    values(&[("color", "red"), ("size", "S")]),
                    values(&[("color", "blue"), ("size", "M")]),
                ],
            )
            .await
            .unwrap();
        let err = tight.matrix(&shirt.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_bulk_create_skips_failures() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;

        let created = catalog
            .variants()
            .bulk_create(
                &shirt.id,
                vec![
                    values(&[("color", "red"), ("size", "S")]),
                    values(&[("color", "red")]),
                    values(&[("color", "red"), ("size", "S")]),
                    values(&[("color", "blue"), ("size", "S")]),
                ],
            )
            .await
            .unwrap();

        let skus: Vec<&str> = created.iter().map(|v| v.product.sku.as_str()).collect();
        assert_eq!(skus, vec!["SHIRT-RED-S", "SHIRT-BLUE-S"]);
        assert_eq!(catalog.variants().list_variants(&shirt.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_require_variant() {
        let catalog = catalog().await;
        let (shirt, _, _) = shirt_with_axes(&catalog).await;
        let v = catalog
            .variants()
            .create_variant(&shirt.id, &values(&[("color", "red"), ("size", "S")]), VariantOverrides::default())
            .await
            .unwrap();

        let mut patch = VariantPatch {
            stock_quantity: Some(7),
            ..Default::default()
        };
        patch.axis_values.insert("size".into(), "L".into());
        let updated = catalog.variants().update_variant(&v.product.id, patch).await.unwrap();
        assert_eq!(updated.product.stock_quantity, 7);
        assert_eq!(updated.value_of("size"), Some("L"));
        assert_eq!(updated.value_of("color"), Some("red"));

        let listed = catalog.variants().list_variants(&shirt.id).await.unwrap();
        assert_eq!(listed[0].value_of("size"), Some("L"));
        assert_eq!(listed[0].values[0].axis_code, "color");

        let err = catalog
            .variants()
            .update_variant(&shirt.id, VariantPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = catalog.variants().delete_variant(&shirt.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        // a variant is not deletable through the product service
        let err = catalog.products().delete(&v.product.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        catalog.variants().delete_variant(&v.product.id).await.unwrap();
        assert!(catalog.variants().list_variants(&shirt.id).await.unwrap().is_empty());
    }
}
