//! # atlas-catalog: Catalog Engines for Atlas
//!
//! Type conversion, composition (bundles, grouped products, stock) and
//! variants, on top of the atlas-db repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atlas Catalog Layers                             │
//! │                                                                         │
//! │   HTTP / CLI layer (not part of this workspace)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  atlas-catalog (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   Catalog ──► products()    ProductService                      │   │
//! │  │           ──► conversion()  TypeConversionEngine                │   │
//! │  │           ──► composition() CompositionEngine                   │   │
//! │  │           ──► variants()    VariantEngine                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │ rules                          │ rows, transactions            │
//! │       ▼                                ▼                                │
//! │  atlas-core                        atlas-db                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use atlas_catalog::{Catalog, CatalogConfig};
//! use atlas_core::ProductType;
//!
//! let config = CatalogConfig::load(None)?;
//! let catalog = Catalog::open(&config).await?;
//!
//! let check = catalog.composition().validate_stock(&kit_id, 2).await?;
//! catalog.conversion().convert(&kit_id, ProductType::Simple).await?;
//! ```

pub mod composition;
pub mod config;
pub mod conversion;
pub mod error;
pub mod products;
pub mod telemetry;
pub mod variant;

pub use composition::{CompositionEngine, Usages};
pub use config::{CatalogConfig, ConfigError, VariantSettings};
pub use conversion::TypeConversionEngine;
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use products::ProductService;
pub use variant::{VariantEngine, VariantSetup};

use atlas_db::Database;

/// Entry point bundling the engines over one database.
///
/// Cheap to clone; all engines share the pool.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
    products: ProductService,
    conversion: TypeConversionEngine,
    composition: CompositionEngine,
    variants: VariantEngine,
}

impl Catalog {
    pub fn new(db: Database, settings: VariantSettings) -> Self {
        Catalog {
            products: ProductService::new(db.clone()),
            conversion: TypeConversionEngine::new(db.clone()),
            composition: CompositionEngine::new(db.clone()),
            variants: VariantEngine::new(db.clone(), settings),
            db,
        }
    }

    /// Connects (running migrations) with the configured database.
    pub async fn open(config: &CatalogConfig) -> CatalogResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Catalog::new(db, config.variants.clone()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn products(&self) -> &ProductService {
        &self.products
    }

    pub fn conversion(&self) -> &TypeConversionEngine {
        &self.conversion
    }

    pub fn composition(&self) -> &CompositionEngine {
        &self.composition
    }

    pub fn variants(&self) -> &VariantEngine {
        &self.variants
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Catalog fixtures over a fresh in-memory database.

    use atlas_core::{AxisInput, AxisValues, ComponentInput, NewProduct, Product, ProductType, VariantAxis};
    use atlas_db::DbConfig;

    use super::*;

    pub async fn catalog() -> Catalog {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Catalog::new(db, VariantSettings::default())
    }

    async fn create(catalog: &Catalog, input: NewProduct) -> Product {
        catalog.products().create(input).await.unwrap()
    }

    /// SIMPLE product priced 10.00.
    pub async fn simple(catalog: &Catalog, sku: &str, stock: i64) -> Product {
        create(
            catalog,
            NewProduct::new(sku, sku, ProductType::Simple)
                .with_price(1000)
                .with_stock(stock),
        )
        .await
    }

    pub async fn bundle(catalog: &Catalog, sku: &str) -> Product {
        create(catalog, NewProduct::new(sku, sku, ProductType::Bundle)).await
    }

    pub async fn grouped(catalog: &Catalog, sku: &str) -> Product {
        create(catalog, NewProduct::new(sku, sku, ProductType::Grouped)).await
    }

    pub async fn configurable(catalog: &Catalog, sku: &str) -> Product {
        create(catalog, NewProduct::new(sku, sku, ProductType::Configurable)).await
    }

    /// KIT-01 = A × 2 (stock 5) + B × 1 (stock 3). Returns (kit, a, b).
    pub async fn kit_01(catalog: &Catalog) -> (Product, Product, Product) {
        let a = simple(catalog, "A", 5).await;
        let b = simple(catalog, "B", 3).await;
        let kit = bundle(catalog, "KIT-01").await;
        catalog
            .composition()
            .set_components(
                &kit.id,
                vec![ComponentInput::new(&a.id, 2), ComponentInput::new(&b.id, 1)],
            )
            .await
            .unwrap();
        (kit, a, b)
    }

    /// "Shirt" (SHIRT, 19.99, brand Acme) configured with [color, size].
    pub async fn shirt_with_axes(catalog: &Catalog) -> (Product, VariantAxis, VariantAxis) {
        let mut input = NewProduct::new("SHIRT", "Shirt", ProductType::Configurable).with_price(1999);
        input.brand = Some("Acme".to_string());
        let shirt = create(catalog, input).await;

        let color = catalog
            .variants()
            .create_axis(AxisInput::new("color", "Color"))
            .await
            .unwrap();
        let size = catalog
            .variants()
            .create_axis(AxisInput::new("size", "Size"))
            .await
            .unwrap();
        catalog
            .variants()
            .configure(&shirt.id, VariantSetup::new(vec![color.id.clone(), size.id.clone()]))
            .await
            .unwrap();

        (shirt, color, size)
    }

    pub fn values(pairs: &[(&str, &str)]) -> AxisValues {
        pairs
            .iter()
            .map(|(code, value)| (code.to_string(), value.to_string()))
            .collect()
    }
}
