//! # Type Conversion Engine
//!
//! Changes a product's type inside one transaction.
//!
//! ```text
//!  convert(KIT-01, SIMPLE)
//!     │
//!     ├─ attachments          variants, owning bundles and groups
//!     ├─ plan_conversion      (atlas-core: variant? same type? variants left?
//!     │                        would it nest inside its owner?)
//!     ├─ cleanup by OLD type  BUNDLE → delete components
//!     │                       GROUPED → delete items
//!     │                       CONFIGURABLE → detach variants
//!     ├─ defaults by NEW type VIRTUAL → no shipping, stock 0
//!     │                       SIMPLE → shipping
//!     └─ update + commit      (nothing is visible before this point)
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use atlas_core::conversion::{
    convertible_types, plan_conversion, Attachments, Cleanup, ConversionPlan,
};
use atlas_core::{Product, ProductType};
use atlas_db::{CompositionRepository, Database, ProductRepository};

use crate::error::CatalogResult;

#[derive(Debug, Clone)]
pub struct TypeConversionEngine {
    db: Database,
}

impl TypeConversionEngine {
    pub fn new(db: Database) -> Self {
        TypeConversionEngine { db }
    }

    /// Converts a product to `target` and returns the stored result.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidOperation` for a variant, a conversion to the current
    ///   type, a CONFIGURABLE product that still has variants, or a
    ///   bundle component (grouped child) converted to BUNDLE (GROUPED)
    pub async fn convert(&self, product_id: &str, target: ProductType) -> CatalogResult<Product> {
        let mut tx = self.db.begin().await?;

        let product = ProductRepository::require(&mut tx, product_id).await?;
        let (product, plan) = convert_in(&mut tx, product, target).await?;

        tx.commit().await?;

        info!(
            id = %product.id,
            sku = %product.sku,
            from = %plan.from,
            to = %plan.to,
            "Product type converted"
        );
        Ok(product)
    }

    /// Types the product may be converted to right now.
    pub async fn convertible_types(&self, product_id: &str) -> CatalogResult<Vec<ProductType>> {
        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::require(&mut conn, product_id).await?;
        let attachments = attachments(&mut conn, product_id).await?;
        Ok(convertible_types(&product, &attachments))
    }
}

async fn attachments(conn: &mut SqliteConnection, product_id: &str) -> CatalogResult<Attachments> {
    let variants = ProductRepository::count_by_parent(conn, product_id).await?;
    let owners = CompositionRepository::find_owners_containing(conn, product_id).await?;
    Ok(Attachments {
        variant_count: variants as usize,
        bundles: owners.bundles,
        groups: owners.groups,
    })
}

/// Plans, cleans up and persists a conversion on `conn`. The caller owns
/// the transaction.
pub(crate) async fn convert_in(
    conn: &mut SqliteConnection,
    mut product: Product,
    target: ProductType,
) -> CatalogResult<(Product, ConversionPlan)> {
    let attachments = attachments(conn, &product.id).await?;
    let plan = plan_conversion(&product, &attachments, target)?;

    match plan.cleanup {
        Cleanup::DeleteBundleComponents => {
            CompositionRepository::delete_components_by_owner(conn, &product.id).await?;
        }
        Cleanup::DeleteGroupedItems => {
            CompositionRepository::delete_items_by_owner(conn, &product.id).await?;
        }
        Cleanup::DetachVariants => {
            ProductRepository::detach_variants(conn, &product.id).await?;
        }
        Cleanup::None => {}
    }

    plan.apply(&mut product);
    product.updated_at = Utc::now();
    ProductRepository::update(conn, &product).await?;

    Ok((product, plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{bundle, catalog, configurable, grouped, kit_01, simple};
    use atlas_core::{AxisInput, AxisValues, ComponentInput, GroupedItemInput, VariantOverrides};

    #[tokio::test]
    async fn test_bundle_to_simple_removes_components() {
        let catalog = catalog().await;
        let a = simple(&catalog, "A", 5).await;
        let b = simple(&catalog, "B", 3).await;
        let kit = bundle(&catalog, "KIT-01").await;
        catalog
            .composition()
            .set_components(
                &kit.id,
                vec![ComponentInput::new(&a.id, 2), ComponentInput::new(&b.id, 1)],
            )
            .await
            .unwrap();

        let converted = catalog
            .conversion()
            .convert(&kit.id, ProductType::Simple)
            .await
            .unwrap();
        assert_eq!(converted.product_type, ProductType::Simple);
        assert!(converted.requires_shipping);

        let rows = catalog.composition().list_components(&kit.id).await.unwrap();
        assert!(rows.is_empty());

        let usages = catalog.composition().find_usages(&a.id).await.unwrap();
        assert!(usages.bundles.is_empty());
    }

    #[tokio::test]
    async fn test_to_virtual_forces_defaults() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 12).await;

        let converted = catalog
            .conversion()
            .convert(&mug.id, ProductType::Virtual)
            .await
            .unwrap();
        assert_eq!(converted.stock_quantity, 0);
        assert!(converted.is_in_stock);
        assert!(!converted.requires_shipping);

        let stored = catalog.products().get(&mug.id).await.unwrap();
        assert_eq!(stored.product_type, ProductType::Virtual);
        assert_eq!(stored.stock_quantity, 0);
        assert!(!stored.requires_shipping);
    }

    #[tokio::test]
    async fn test_same_type_and_variant_are_rejected() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 1).await;

        let err = catalog
            .conversion()
            .convert(&mug.id, ProductType::Simple)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let shirt = configurable(&catalog, "SHIRT").await;
        let color = catalog
            .variants()
            .create_axis(AxisInput::new("color", "Color"))
            .await
            .unwrap();
        catalog
            .variants()
            .configure(&shirt.id, crate::variant::VariantSetup::new(vec![color.id.clone()]))
            .await
            .unwrap();
        let values: AxisValues = [("color".to_string(), "Red".to_string())].into();
        let red = catalog
            .variants()
            .create_variant(&shirt.id, &values, VariantOverrides::default())
            .await
            .unwrap();

        let err = catalog
            .conversion()
            .convert(&red.product.id, ProductType::Virtual)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(catalog
            .conversion()
            .convertible_types(&red.product.id)
            .await
            .unwrap()
            .is_empty());

        // parent with a variant is locked too
        let err = catalog
            .conversion()
            .convert(&shirt.id, ProductType::Simple)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(catalog
            .conversion()
            .convertible_types(&shirt.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_configurable_without_variants_leaves_config() {
        let catalog = catalog().await;
        let shirt = configurable(&catalog, "SHIRT").await;
        let color = catalog
            .variants()
            .create_axis(AxisInput::new("color", "Color"))
            .await
            .unwrap();
        catalog
            .variants()
            .configure(&shirt.id, crate::variant::VariantSetup::new(vec![color.id]))
            .await
            .unwrap();

        catalog
            .conversion()
            .convert(&shirt.id, ProductType::Simple)
            .await
            .unwrap();

        // the orphaned config is still readable
        let config = catalog.variants().get_config(&shirt.id).await.unwrap();
        assert_eq!(config.axis_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_convertible_types_excludes_current() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 1).await;

        let types = catalog.conversion().convertible_types(&mug.id).await.unwrap();
        assert_eq!(types.len(), 4);
        assert!(!types.contains(&ProductType::Simple));
    }

    #[tokio::test]
    async fn test_member_cannot_take_its_owners_type() {
        let catalog = catalog().await;
        let (kit, a, _) = kit_01(&catalog).await;
        let mug = simple(&catalog, "MUG", 4).await;
        let set = grouped(&catalog, "SET").await;
        catalog
            .composition()
            .add_grouped_item(&set.id, GroupedItemInput::new(&mug.id))
            .await
            .unwrap();

        let err = catalog
            .conversion()
            .convert(&a.id, ProductType::Bundle)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.to_string().contains(&kit.id));

        let err = catalog
            .conversion()
            .convert(&mug.id, ProductType::Grouped)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        // nothing changed, the kit still checks real component stock
        let stored = catalog.products().get(&a.id).await.unwrap();
        assert_eq!(stored.product_type, ProductType::Simple);
        let check = catalog.composition().validate_stock(&kit.id, 3).await.unwrap();
        assert!(!check.valid);

        let types = catalog.conversion().convertible_types(&a.id).await.unwrap();
        assert!(!types.contains(&ProductType::Bundle));
        assert!(types.contains(&ProductType::Grouped));

        let types = catalog.conversion().convertible_types(&mug.id).await.unwrap();
        assert!(types.contains(&ProductType::Bundle));
        assert!(!types.contains(&ProductType::Grouped));
    }
}
