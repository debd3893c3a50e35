//! # Repository Module
//!
//! Database repository implementations for the catalog.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Engine operation (atlas-catalog)                                      │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  ProductRepository::require(&mut tx, id)                       │
//! │       │  CompositionRepository::delete_components_by_owner(&mut tx, id)│
//! │       │  tx.commit().await?;                                           │
//! │       ▼                                                                 │
//! │  Repositories: stateless, every function takes the connection          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  • SQL is isolated in one place                                        │
//! │  • Any mix of calls can share one transaction                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product rows, SKU lookup, stock CAS
//! - [`CompositionRepository`](composition::CompositionRepository) - Bundle components and grouped items
//! - [`VariantRepository`](variant::VariantRepository) - Axes, configurations, axis values

pub mod composition;
pub mod product;
pub mod variant;

#[cfg(test)]
pub(crate) mod test_rows {
    //! Shared helpers for repository tests.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};
    use atlas_core::{Product, ProductType};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product_row(sku: &str, product_type: ProductType, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: sku.to_string(),
            product_type,
            price_cents: Some(1000),
            stock_quantity: stock,
            is_in_stock: stock > 0,
            requires_shipping: true,
            parent_id: None,
            weight_grams: None,
            brand: None,
            manufacturer: None,
            category_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
