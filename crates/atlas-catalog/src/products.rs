//! # Product Service
//!
//! Root product lifecycle: create, read, patch, delete.
//!
//! Variants are created and removed only through
//! [`VariantEngine`](crate::variant::VariantEngine); this service refuses to
//! create a product with a parent or to delete a variant.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use atlas_core::validation::{
    validate_optional_price, validate_product_name, validate_sku, validate_stock_quantity,
};
use atlas_core::{
    CatalogProduct, ComponentLine, CoreError, GroupedLine, NewProduct, Product, ProductKind,
    ProductPatch, ProductType,
};
use atlas_db::{CompositionRepository, Database, ProductRepository, VariantRepository};

use crate::error::{CatalogError, CatalogResult};

/// Thin front over the product store.
#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    /// Creates a root product.
    ///
    /// VIRTUAL products are created without shipping and with zero stock.
    ///
    /// ## Errors
    /// - `Validation` for a malformed SKU/name or a negative price/stock
    /// - `AlreadyExists` when the SKU is taken
    pub async fn create(&self, input: NewProduct) -> CatalogResult<Product> {
        let sku = input.sku.trim().to_string();
        validate_sku(&sku)?;
        validate_product_name(&input.name)?;
        validate_optional_price(input.price_cents)?;
        validate_stock_quantity(input.stock_quantity)?;

        let mut tx = self.db.begin().await?;

        if ProductRepository::exists_by_sku(&mut tx, &sku).await? {
            return Err(CoreError::already_exists("SKU", sku).into());
        }

        let now = Utc::now();
        let is_virtual = input.product_type == ProductType::Virtual;
        let mut product = Product {
            id: Uuid::new_v4().to_string(),
            sku,
            name: input.name.trim().to_string(),
            product_type: input.product_type,
            price_cents: input.price_cents,
            stock_quantity: 0,
            is_in_stock: false,
            requires_shipping: !is_virtual && input.requires_shipping.unwrap_or(true),
            parent_id: None,
            weight_grams: input.weight_grams,
            brand: input.brand,
            manufacturer: input.manufacturer,
            category_ids: input.category_ids,
            created_at: now,
            updated_at: now,
        };
        product.set_stock(input.stock_quantity);

        ProductRepository::insert(&mut tx, &product).await?;
        tx.commit().await?;

        info!(id = %product.id, sku = %product.sku, product_type = %product.product_type, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> CatalogResult<Product> {
        let mut conn = self.db.acquire().await?;
        Ok(ProductRepository::require(&mut conn, id).await?)
    }

    /// Loads a product together with its composition.
    pub async fn load(&self, id: &str) -> CatalogResult<CatalogProduct> {
        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::require(&mut conn, id).await?;
        load_catalog_product(&mut conn, product).await
    }

    /// Applies `patch`. Stock changes recompute `is_in_stock`; VIRTUAL
    /// products stay at zero stock without shipping.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> CatalogResult<Product> {
        let mut tx = self.db.begin().await?;
        let mut product = ProductRepository::require(&mut tx, id).await?;

        if let Some(name) = patch.name {
            validate_product_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(cents) = patch.price_cents {
            validate_optional_price(Some(cents))?;
            product.price_cents = Some(cents);
        }
        if let Some(quantity) = patch.stock_quantity {
            validate_stock_quantity(quantity)?;
            product.set_stock(quantity);
        }
        if let Some(requires_shipping) = patch.requires_shipping {
            product.requires_shipping =
                requires_shipping && product.product_type != ProductType::Virtual;
        }
        if patch.weight_grams.is_some() {
            product.weight_grams = patch.weight_grams;
        }
        if patch.brand.is_some() {
            product.brand = patch.brand;
        }
        if patch.manufacturer.is_some() {
            product.manufacturer = patch.manufacturer;
        }
        if let Some(category_ids) = patch.category_ids {
            product.category_ids = category_ids;
        }
        product.updated_at = Utc::now();

        ProductRepository::update(&mut tx, &product).await?;
        tx.commit().await?;

        info!(id = %product.id, sku = %product.sku, "Product updated");
        Ok(product)
    }

    /// Deletes a root product and everything it owns.
    ///
    /// ## Errors
    /// `InvalidOperation` when the product is a variant, is still used by a
    /// bundle or grouped product, or still has variants.
    pub async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        let product = ProductRepository::require(&mut tx, id).await?;

        if product.is_variant() {
            return Err(CatalogError::invalid(format!(
                "{} is a variant; delete it through the variant engine",
                product.sku
            )));
        }

        let owners = CompositionRepository::find_owners_containing(&mut tx, id).await?;
        if !owners.is_empty() {
            return Err(CatalogError::invalid(format!(
                "{} is still used by bundles {:?} and grouped products {:?}",
                product.sku, owners.bundles, owners.groups
            )));
        }

        let variants = ProductRepository::count_by_parent(&mut tx, id).await?;
        if variants > 0 {
            return Err(CatalogError::invalid(format!(
                "{} has {} variant(s); delete them first",
                product.sku, variants
            )));
        }

        ProductRepository::delete(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, sku = %product.sku, "Product deleted");
        Ok(())
    }

    /// Variants of a configurable product, in creation order.
    pub async fn list_variants(&self, parent_id: &str) -> CatalogResult<Vec<Product>> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::require(&mut conn, parent_id).await?;
        Ok(ProductRepository::list_by_parent(&mut conn, parent_id).await?)
    }
}

/// Builds the [`CatalogProduct`] aggregate for `product` on `conn`.
pub(crate) async fn load_catalog_product(
    conn: &mut SqliteConnection,
    product: Product,
) -> CatalogResult<CatalogProduct> {
    let kind = match product.product_type {
        ProductType::Simple => ProductKind::Simple,
        ProductType::Virtual => ProductKind::Virtual,
        ProductType::Bundle => {
            let rows = CompositionRepository::list_by_bundle(conn, &product.id).await?;
            let ids: Vec<String> = rows.iter().map(|r| r.component_id.clone()).collect();
            let members = load_members(conn, &ids).await?;
            ProductKind::Bundle(
                rows.into_iter()
                    .zip(members)
                    .map(|(component, product)| ComponentLine { component, product })
                    .collect(),
            )
        }
        ProductType::Grouped => {
            let rows = CompositionRepository::list_by_parent(conn, &product.id).await?;
            let ids: Vec<String> = rows.iter().map(|r| r.child_id.clone()).collect();
            let members = load_members(conn, &ids).await?;
            ProductKind::Grouped(
                rows.into_iter()
                    .zip(members)
                    .map(|(item, product)| GroupedLine { item, product })
                    .collect(),
            )
        }
        ProductType::Configurable => ProductKind::Configurable {
            config: VariantRepository::get_config(conn, &product.id).await?,
            variants: ProductRepository::list_by_parent(conn, &product.id).await?,
        },
    };

    debug!(id = %product.id, product_type = %product.product_type, "Loaded catalog product");
    Ok(CatalogProduct::new(product, kind)?)
}

/// Products for `ids`, in order; every id must resolve.
async fn load_members(conn: &mut SqliteConnection, ids: &[String]) -> CatalogResult<Vec<Product>> {
    let members = ProductRepository::get_many(conn, ids).await?;
    if members.len() != ids.len() {
        let missing = ids
            .iter()
            .find(|id| !members.iter().any(|m| &m.id == *id))
            .map(String::as_str)
            .unwrap_or("?");
        return Err(CatalogError::not_found("Product", missing));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{catalog, simple};

    #[tokio::test]
    async fn test_create_applies_type_defaults() {
        let catalog = catalog().await;

        let card = catalog
            .products()
            .create(NewProduct::new("GIFT-25", "Gift Card", ProductType::Virtual).with_stock(40))
            .await
            .unwrap();
        assert_eq!(card.stock_quantity, 0);
        assert!(card.is_in_stock);
        assert!(!card.requires_shipping);

        let mug = catalog
            .products()
            .create(NewProduct::new("MUG", "Mug", ProductType::Simple).with_stock(3))
            .await
            .unwrap();
        assert!(mug.is_in_stock);
        assert!(mug.requires_shipping);
        assert!(mug.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let catalog = catalog().await;
        simple(&catalog, "MUG", 1).await;

        let dup = catalog
            .products()
            .create(NewProduct::new("MUG", "Other", ProductType::Simple))
            .await
            .unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::AlreadyExists);
        assert!(dup.message.contains("MUG"));

        let bad_sku = catalog
            .products()
            .create(NewProduct::new("MUG 2", "Mug", ProductType::Simple))
            .await
            .unwrap_err();
        assert_eq!(bad_sku.kind(), ErrorKind::Validation);

        let negative = catalog
            .products()
            .create(NewProduct::new("CUP", "Cup", ProductType::Simple).with_stock(-1))
            .await
            .unwrap_err();
        assert_eq!(negative.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_update_recomputes_stock_flag() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 2).await;

        let updated = catalog
            .products()
            .update(
                &mug.id,
                ProductPatch {
                    stock_quantity: Some(0),
                    brand: Some("Acme".into()),
                    category_ids: Some(vec!["kitchen".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_in_stock);

        let stored = catalog.products().get(&mug.id).await.unwrap();
        assert_eq!(stored.stock_quantity, 0);
        assert_eq!(stored.brand.as_deref(), Some("Acme"));
        assert_eq!(stored.category_ids, vec!["kitchen".to_string()]);
        assert_eq!(stored.sku, "MUG");
    }

    #[tokio::test]
    async fn test_delete_refuses_used_component() {
        let catalog = catalog().await;
        let a = simple(&catalog, "A", 5).await;
        let kit = catalog
            .products()
            .create(NewProduct::new("KIT-01", "Kit", ProductType::Bundle))
            .await
            .unwrap();
        catalog
            .composition()
            .add_component(&kit.id, atlas_core::ComponentInput::new(&a.id, 2))
            .await
            .unwrap();

        let err = catalog.products().delete(&a.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.message.contains(&kit.id));

        // deleting the owner takes its component rows with it
        catalog.products().delete(&kit.id).await.unwrap();
        catalog.products().delete(&a.id).await.unwrap();

        let err = catalog.products().get(&a.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_load_builds_bundle_kind() {
        let catalog = catalog().await;
        let a = simple(&catalog, "A", 5).await;
        let kit = catalog
            .products()
            .create(NewProduct::new("KIT-01", "Kit", ProductType::Bundle))
            .await
            .unwrap();
        catalog
            .composition()
            .add_component(&kit.id, atlas_core::ComponentInput::new(&a.id, 2))
            .await
            .unwrap();

        let loaded = catalog.products().load(&kit.id).await.unwrap();
        match loaded.kind {
            ProductKind::Bundle(lines) => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].product.sku, "A");
                assert_eq!(lines[0].component.quantity, 2);
            }
            other => panic!("expected bundle, got {:?}", other),
        }
    }
}
