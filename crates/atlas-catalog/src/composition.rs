//! # Composition Engine
//!
//! Bundle components, grouped items, stock and bundle pricing.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decrement_stock(KIT-01, 2)                                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    load KIT-01 + components                                             │
//! │    validate_stock ──── invalid ──► ROLLBACK, success = false            │
//! │    for each movement (A -4, B -2):                                      │
//! │      UPDATE ... WHERE stock_quantity >= n                               │
//! │        0 rows ─────────────────► ROLLBACK, success = false              │
//! │  COMMIT ──────────────────────► success = true, movements               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The validation read only decides the message; the guarded UPDATE is
//! what keeps stock from going negative when two decrements race.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use atlas_core::composition::{
    check_distinct, check_member, check_owner, clamp_quantity, grouped_quantities, Composite,
};
use atlas_core::stock::{plan_decrement, validate_stock, StockCheck, StockDecrement};
use atlas_core::validation::validate_optional_price;
use atlas_core::{
    BundleComponent, ComponentInput, GroupedItem, GroupedItemInput, Money, Product, ProductKind,
    ValidationError,
};
use atlas_db::{CompositionRepository, Database, Owners, ProductRepository};

use crate::error::{CatalogError, CatalogResult};
use crate::products::load_catalog_product;

/// Bundles and grouped products that reference a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usages {
    pub bundles: Vec<String>,
    pub groups: Vec<String>,
}

impl Usages {
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty() && self.groups.is_empty()
    }
}

impl From<Owners> for Usages {
    fn from(owners: Owners) -> Self {
        Usages {
            bundles: owners.bundles,
            groups: owners.groups,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositionEngine {
    db: Database,
}

impl CompositionEngine {
    pub fn new(db: Database) -> Self {
        CompositionEngine { db }
    }

    // =========================================================================
    // Bundle Components
    // =========================================================================

    /// Adds one component to a bundle. The quantity is clamped to at least 1.
    ///
    /// ## Errors
    /// - `InvalidOperation`: self reference, owner not BUNDLE, nested
    ///   bundle, component is a variant
    /// - `AlreadyExists`: the component is already in the bundle
    pub async fn add_component(
        &self,
        bundle_id: &str,
        input: ComponentInput,
    ) -> CatalogResult<BundleComponent> {
        if input.component_id == bundle_id {
            return Err(self_reference(bundle_id));
        }
        validate_optional_price(input.special_price_cents)?;

        let mut tx = self.db.begin().await?;

        let bundle = ProductRepository::require(&mut tx, bundle_id).await?;
        let component = ProductRepository::require(&mut tx, &input.component_id).await?;
        check_member(Composite::Bundle, &bundle, &component)?;

        if CompositionRepository::component_exists(&mut tx, bundle_id, &component.id).await? {
            return Err(atlas_core::CoreError::already_exists(
                Composite::Bundle.member_label(),
                &component.sku,
            )
            .into());
        }

        let position = match input.position {
            Some(position) => position,
            None => CompositionRepository::next_component_position(&mut tx, bundle_id).await?,
        };

        let row = BundleComponent {
            id: Uuid::new_v4().to_string(),
            bundle_id: bundle_id.to_string(),
            component_id: component.id.clone(),
            quantity: clamp_quantity(input.quantity),
            position,
            special_price_cents: input.special_price_cents,
        };
        CompositionRepository::upsert_component(&mut tx, &row).await?;
        tx.commit().await?;

        info!(bundle = %bundle.sku, component = %component.sku, quantity = row.quantity, "Bundle component added");
        Ok(row)
    }

    pub async fn remove_component(&self, bundle_id: &str, component_id: &str) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        CompositionRepository::delete_component(&mut tx, bundle_id, component_id).await?;
        tx.commit().await?;

        info!(bundle_id = %bundle_id, component_id = %component_id, "Bundle component removed");
        Ok(())
    }

    /// Replaces every component of a bundle.
    ///
    /// All entries are validated before anything is deleted. Positions
    /// default to the index in `inputs`.
    pub async fn set_components(
        &self,
        bundle_id: &str,
        inputs: Vec<ComponentInput>,
    ) -> CatalogResult<Vec<BundleComponent>> {
        if inputs.iter().any(|i| i.component_id == bundle_id) {
            return Err(self_reference(bundle_id));
        }
        check_distinct(Composite::Bundle, inputs.iter().map(|i| i.component_id.as_str()))?;
        for input in &inputs {
            validate_optional_price(input.special_price_cents)?;
        }

        let mut tx = self.db.begin().await?;

        let bundle = ProductRepository::require(&mut tx, bundle_id).await?;
        check_owner(Composite::Bundle, &bundle)?;
        let ids: Vec<String> = inputs.iter().map(|i| i.component_id.clone()).collect();
        let members = ProductRepository::get_many(&mut tx, &ids).await?;

        let mut rows = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let component = find_member(&members, &input.component_id)?;
            check_member(Composite::Bundle, &bundle, component)?;
            rows.push(BundleComponent {
                id: Uuid::new_v4().to_string(),
                bundle_id: bundle_id.to_string(),
                component_id: input.component_id,
                quantity: clamp_quantity(input.quantity),
                position: input.position.unwrap_or(index as i64),
                special_price_cents: input.special_price_cents,
            });
        }

        let removed = CompositionRepository::delete_components_by_owner(&mut tx, bundle_id).await?;
        for row in &rows {
            CompositionRepository::upsert_component(&mut tx, row).await?;
        }
        tx.commit().await?;

        info!(bundle = %bundle.sku, removed, added = rows.len(), "Bundle components replaced");
        rows.sort_by_key(|r| r.position);
        Ok(rows)
    }

    /// Component rows of a bundle, ordered by position.
    pub async fn list_components(&self, bundle_id: &str) -> CatalogResult<Vec<BundleComponent>> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::require(&mut conn, bundle_id).await?;
        Ok(CompositionRepository::list_by_bundle(&mut conn, bundle_id).await?)
    }

    // =========================================================================
    // Grouped Items
    // =========================================================================

    /// Adds one child to a grouped product.
    ///
    /// `default_quantity` is clamped to at least 1; `min_quantity` must be
    /// non-negative and `max_quantity`, when set, at least `min_quantity`.
    pub async fn add_grouped_item(
        &self,
        parent_id: &str,
        input: GroupedItemInput,
    ) -> CatalogResult<GroupedItem> {
        if input.child_id == parent_id {
            return Err(self_reference(parent_id));
        }
        let quantities = grouped_quantities(&input)?;

        let mut tx = self.db.begin().await?;

        let parent = ProductRepository::require(&mut tx, parent_id).await?;
        let child = ProductRepository::require(&mut tx, &input.child_id).await?;
        check_member(Composite::Grouped, &parent, &child)?;

        if CompositionRepository::item_exists(&mut tx, parent_id, &child.id).await? {
            return Err(atlas_core::CoreError::already_exists(
                Composite::Grouped.member_label(),
                &child.sku,
            )
            .into());
        }

        let position = match input.position {
            Some(position) => position,
            None => CompositionRepository::next_item_position(&mut tx, parent_id).await?,
        };

        let row = GroupedItem {
            id: Uuid::new_v4().to_string(),
            parent_id: parent_id.to_string(),
            child_id: child.id.clone(),
            default_quantity: quantities.default_quantity,
            min_quantity: quantities.min_quantity,
            max_quantity: quantities.max_quantity,
            position,
        };
        CompositionRepository::upsert_item(&mut tx, &row).await?;
        tx.commit().await?;

        info!(parent = %parent.sku, child = %child.sku, "Grouped item added");
        Ok(row)
    }

    pub async fn remove_grouped_item(&self, parent_id: &str, child_id: &str) -> CatalogResult<()> {
        let mut tx = self.db.begin().await?;
        CompositionRepository::delete_item(&mut tx, parent_id, child_id).await?;
        tx.commit().await?;

        info!(parent_id = %parent_id, child_id = %child_id, "Grouped item removed");
        Ok(())
    }

    /// Replaces every child of a grouped product, validating first.
    pub async fn set_grouped_items(
        &self,
        parent_id: &str,
        inputs: Vec<GroupedItemInput>,
    ) -> CatalogResult<Vec<GroupedItem>> {
        if inputs.iter().any(|i| i.child_id == parent_id) {
            return Err(self_reference(parent_id));
        }
        check_distinct(Composite::Grouped, inputs.iter().map(|i| i.child_id.as_str()))?;
        let quantities = inputs
            .iter()
            .map(grouped_quantities)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.db.begin().await?;

        let parent = ProductRepository::require(&mut tx, parent_id).await?;
        check_owner(Composite::Grouped, &parent)?;
        let ids: Vec<String> = inputs.iter().map(|i| i.child_id.clone()).collect();
        let members = ProductRepository::get_many(&mut tx, &ids).await?;

        let mut rows = Vec::with_capacity(inputs.len());
        for (index, (input, q)) in inputs.into_iter().zip(quantities).enumerate() {
            let child = find_member(&members, &input.child_id)?;
            check_member(Composite::Grouped, &parent, child)?;
            rows.push(GroupedItem {
                id: Uuid::new_v4().to_string(),
                parent_id: parent_id.to_string(),
                child_id: input.child_id,
                default_quantity: q.default_quantity,
                min_quantity: q.min_quantity,
                max_quantity: q.max_quantity,
                position: input.position.unwrap_or(index as i64),
            });
        }

        let removed = CompositionRepository::delete_items_by_owner(&mut tx, parent_id).await?;
        for row in &rows {
            CompositionRepository::upsert_item(&mut tx, row).await?;
        }
        tx.commit().await?;

        info!(parent = %parent.sku, removed, added = rows.len(), "Grouped items replaced");
        rows.sort_by_key(|r| r.position);
        Ok(rows)
    }

    /// Child rows of a grouped product, ordered by position.
    pub async fn list_grouped_items(&self, parent_id: &str) -> CatalogResult<Vec<GroupedItem>> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::require(&mut conn, parent_id).await?;
        Ok(CompositionRepository::list_by_parent(&mut conn, parent_id).await?)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Advisory stock check; [`decrement_stock`](Self::decrement_stock)
    /// re-checks on its own.
    pub async fn validate_stock(&self, product_id: &str, requested: i64) -> CatalogResult<StockCheck> {
        if requested < 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::require(&mut conn, product_id).await?;
        let cp = load_catalog_product(&mut conn, product).await?;

        let check = validate_stock(&cp, requested);
        debug!(sku = %cp.product.sku, requested, valid = check.valid, "Stock validated");
        Ok(check)
    }

    /// Takes `qty` units of a product out of stock, all or nothing.
    ///
    /// BUNDLE decrements each component by `component.quantity × qty`;
    /// SIMPLE and variants decrement themselves; VIRTUAL and GROUPED touch
    /// nothing. A failed check comes back as `success = false` with no
    /// movements, not as an error.
    pub async fn decrement_stock(&self, product_id: &str, qty: i64) -> CatalogResult<StockDecrement> {
        if qty <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let mut tx = self.db.begin().await?;

        let product = ProductRepository::require(&mut tx, product_id).await?;
        let cp = load_catalog_product(&mut tx, product).await?;

        let check = validate_stock(&cp, qty);
        if !check.valid {
            tx.rollback().await?;
            warn!(sku = %cp.product.sku, qty, reason = %check.message, "Stock decrement rejected");
            return Ok(StockDecrement::rejected(check.message));
        }

        let movements = plan_decrement(&cp, qty);
        for movement in &movements {
            let applied =
                ProductRepository::decrement_stock(&mut tx, &movement.product_id, movement.quantity)
                    .await?;
            if !applied {
                tx.rollback().await?;
                warn!(sku = %movement.sku, quantity = movement.quantity, "Stock changed during decrement");
                return Ok(StockDecrement::rejected(format!(
                    "{}: stock changed during decrement",
                    movement.sku
                )));
            }
        }

        tx.commit().await?;

        let message = match &cp.kind {
            ProductKind::Virtual => "virtual product, nothing to decrement".to_string(),
            ProductKind::Grouped(_) => "grouped product, decrement each child item".to_string(),
            _ => format!("decremented {} row(s)", movements.len()),
        };
        info!(sku = %cp.product.sku, qty, rows = movements.len(), "Stock decremented");
        Ok(StockDecrement::applied(message, movements))
    }

    // =========================================================================
    // Pricing & Usage
    // =========================================================================

    /// Sum of `(special price ?? component price ?? 0) × quantity`.
    pub async fn bundle_price(&self, bundle_id: &str) -> CatalogResult<Money> {
        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::require(&mut conn, bundle_id).await?;
        let cp = load_catalog_product(&mut conn, product).await?;
        Ok(cp.bundle_price()?)
    }

    /// Every bundle and grouped product that contains `product_id`.
    pub async fn find_usages(&self, product_id: &str) -> CatalogResult<Usages> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::require(&mut conn, product_id).await?;
        let owners = CompositionRepository::find_owners_containing(&mut conn, product_id).await?;
        Ok(owners.into())
    }
}

fn self_reference(id: &str) -> CatalogError {
    CatalogError::invalid(format!("product {} cannot contain itself", id))
}

fn find_member<'a>(members: &'a [Product], id: &str) -> CatalogResult<&'a Product> {
    members
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| CatalogError::not_found("Product", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{bundle, catalog, grouped, kit_01, simple};
    use atlas_core::stock::Availability;
    use atlas_core::{NewProduct, ProductType};

    #[tokio::test]
    async fn test_kit_01_stock_scenario() {
        let catalog = catalog().await;
        let (kit, _, _) = kit_01(&catalog).await;

        let check = catalog.composition().validate_stock(&kit.id, 2).await.unwrap();
        assert!(check.valid);
        assert_eq!(check.available_qty(), Some(2));

        let check = catalog.composition().validate_stock(&kit.id, 3).await.unwrap();
        assert!(!check.valid);
        assert!(check.message.contains("A: needs 6, has 5"));
        assert!(!check.message.contains("B:"));
    }

    #[tokio::test]
    async fn test_bundle_decrement_moves_every_component() {
        let catalog = catalog().await;
        let (kit, a, b) = kit_01(&catalog).await;

        let result = catalog.composition().decrement_stock(&kit.id, 2).await.unwrap();
        assert!(result.success);
        assert_eq!(result.decrements.len(), 2);
        assert_eq!(result.decrements[0].before, 5);
        assert_eq!(result.decrements[0].after, 1);

        assert_eq!(catalog.products().get(&a.id).await.unwrap().stock_quantity, 1);
        let b = catalog.products().get(&b.id).await.unwrap();
        assert_eq!(b.stock_quantity, 1);
        assert!(b.is_in_stock);

        // A has 1 left, needs 2: rejected and nothing moves
        let result = catalog.composition().decrement_stock(&kit.id, 1).await.unwrap();
        assert!(!result.success);
        assert!(result.decrements.is_empty());
        assert_eq!(catalog.products().get(&b.id).await.unwrap().stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_decrement_to_zero_clears_in_stock() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 2).await;

        let result = catalog.composition().decrement_stock(&mug.id, 2).await.unwrap();
        assert!(result.success);
        assert_eq!(result.decrements[0].after, 0);

        let mug = catalog.products().get(&mug.id).await.unwrap();
        assert_eq!(mug.stock_quantity, 0);
        assert!(!mug.is_in_stock);

        let err = catalog.composition().decrement_stock(&mug.id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_huge_bundle_request_is_rejected_without_moving_stock() {
        let catalog = catalog().await;
        let (kit, a, b) = kit_01(&catalog).await;
        let huge = i64::MAX / 2 + 1;

        let check = catalog.composition().validate_stock(&kit.id, huge).await.unwrap();
        assert!(!check.valid);

        let result = catalog.composition().decrement_stock(&kit.id, huge).await.unwrap();
        assert!(!result.success);
        assert!(result.decrements.is_empty());
        assert_eq!(catalog.products().get(&a.id).await.unwrap().stock_quantity, 5);
        assert_eq!(catalog.products().get(&b.id).await.unwrap().stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_virtual_and_grouped_never_decrement() {
        let catalog = catalog().await;
        let card = catalog
            .products()
            .create(NewProduct::new("GIFT", "Gift Card", ProductType::Virtual))
            .await
            .unwrap();

        let check = catalog.composition().validate_stock(&card.id, 1_000).await.unwrap();
        assert!(check.valid);
        assert_eq!(check.available, Availability::Unbounded);

        let result = catalog.composition().decrement_stock(&card.id, 5).await.unwrap();
        assert!(result.success);
        assert!(result.decrements.is_empty());

        let set = grouped(&catalog, "SET").await;
        let check = catalog.composition().validate_stock(&set.id, 3).await.unwrap();
        assert!(check.valid);
        assert_eq!(check.available_qty(), None);
    }

    #[tokio::test]
    async fn test_empty_bundle_is_never_valid() {
        let catalog = catalog().await;
        let kit = bundle(&catalog, "EMPTY").await;

        let check = catalog.composition().validate_stock(&kit.id, 1).await.unwrap();
        assert!(!check.valid);

        let result = catalog.composition().decrement_stock(&kit.id, 1).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_add_component_rules() {
        let catalog = catalog().await;
        let kit = bundle(&catalog, "KIT-01").await;
        let other = bundle(&catalog, "KIT-02").await;
        let a = simple(&catalog, "A", 5).await;

        let err = catalog
            .composition()
            .add_component(&kit.id, ComponentInput::new(&kit.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = catalog
            .composition()
            .add_component(&kit.id, ComponentInput::new(&other.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let row = catalog
            .composition()
            .add_component(&kit.id, ComponentInput::new(&a.id, 0))
            .await
            .unwrap();
        assert_eq!(row.quantity, 1);

        let err = catalog
            .composition()
            .add_component(&kit.id, ComponentInput::new(&a.id, 2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        // owner must be a bundle
        let err = catalog
            .composition()
            .add_component(&a.id, ComponentInput::new(&other.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_self_reference_fails_even_for_unknown_id() {
        let catalog = catalog().await;
        let err = catalog
            .composition()
            .add_component("nope", ComponentInput::new("nope", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_set_components_is_all_or_nothing() {
        let catalog = catalog().await;
        let (kit, a, b) = kit_01(&catalog).await;
        let nested = bundle(&catalog, "KIT-02").await;

        let err = catalog
            .composition()
            .set_components(
                &kit.id,
                vec![ComponentInput::new(&a.id, 1), ComponentInput::new(&nested.id, 1)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = catalog
            .composition()
            .set_components(
                &kit.id,
                vec![ComponentInput::new(&a.id, 1), ComponentInput::new(&a.id, 2)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        // original rows untouched
        let rows = catalog.composition().list_components(&kit.id).await.unwrap();
        assert_eq!(rows.len(), 2);

        let rows = catalog
            .composition()
            .set_components(
                &kit.id,
                vec![ComponentInput::new(&b.id, 3), ComponentInput::new(&a.id, 1)],
            )
            .await
            .unwrap();
        assert_eq!(rows[0].component_id, b.id);
        assert_eq!(rows[0].position, 0);

        let stored = catalog.composition().list_components(&kit.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].component_id, b.id);
        assert_eq!(stored[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_set_with_empty_list_still_checks_owner_type() {
        let catalog = catalog().await;
        let mug = simple(&catalog, "MUG", 4).await;
        let set = grouped(&catalog, "SET").await;
        let (kit, _, _) = kit_01(&catalog).await;

        let err = catalog
            .composition()
            .set_components(&mug.id, vec![])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = catalog
            .composition()
            .set_components(&set.id, vec![])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = catalog
            .composition()
            .set_grouped_items(&kit.id, vec![])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert_eq!(catalog.composition().list_components(&kit.id).await.unwrap().len(), 2);

        // the right owner type may be emptied
        assert!(catalog
            .composition()
            .set_components(&kit.id, vec![])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_component() {
        let catalog = catalog().await;
        let (kit, a, _) = kit_01(&catalog).await;

        catalog.composition().remove_component(&kit.id, &a.id).await.unwrap();
        let err = catalog
            .composition()
            .remove_component(&kit.id, &a.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(catalog.composition().list_components(&kit.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bundle_price_prefers_special_price() {
        let catalog = catalog().await;
        let a = simple(&catalog, "A", 5).await; // 10.00 each
        let b = simple(&catalog, "B", 5).await;
        let kit = bundle(&catalog, "KIT").await;

        let mut special = ComponentInput::new(&a.id, 2);
        special.special_price_cents = Some(750);
        catalog
            .composition()
            .set_components(&kit.id, vec![special, ComponentInput::new(&b.id, 1)])
            .await
            .unwrap();

        let price = catalog.composition().bundle_price(&kit.id).await.unwrap();
        assert_eq!(price, Money::from_cents(750 * 2 + 1000));

        let err = catalog.composition().bundle_price(&a.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_grouped_items_and_usages() {
        let catalog = catalog().await;
        let set = grouped(&catalog, "SET").await;
        let (kit, a, _) = kit_01(&catalog).await;

        let mut input = GroupedItemInput::new(&a.id);
        input.min_quantity = 2;
        input.max_quantity = Some(1);
        let err = catalog
            .composition()
            .add_grouped_item(&set.id, input)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let row = catalog
            .composition()
            .add_grouped_item(&set.id, GroupedItemInput::new(&a.id))
            .await
            .unwrap();
        assert_eq!(row.default_quantity, 1);

        // bundles may sit inside grouped products
        catalog
            .composition()
            .add_grouped_item(&set.id, GroupedItemInput::new(&kit.id))
            .await
            .unwrap();

        let err = catalog
            .composition()
            .add_grouped_item(&set.id, GroupedItemInput::new(&set.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let usages = catalog.composition().find_usages(&a.id).await.unwrap();
        assert_eq!(usages.bundles, vec![kit.id.clone()]);
        assert_eq!(usages.groups, vec![set.id.clone()]);

        let items = catalog
            .composition()
            .set_grouped_items(&set.id, vec![GroupedItemInput::new(&kit.id)])
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        catalog.composition().remove_grouped_item(&set.id, &kit.id).await.unwrap();
        assert!(catalog
            .composition()
            .list_grouped_items(&set.id)
            .await
            .unwrap()
            .is_empty());
        assert!(catalog.composition().find_usages(&kit.id).await.unwrap().is_empty());
    }
}
