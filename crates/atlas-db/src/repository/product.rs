//! # Product Repository
//!
//! The catalog store: products keyed by id with a unique SKU.
//!
//! ## Key Operations
//! - CRUD by id, lookup by SKU
//! - Variant listing and detaching by parent
//! - Compare-and-swap stock decrement
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET stock_quantity = stock_quantity - :n,                           │
//! │         is_in_stock    = (stock_quantity - :n) > 0                      │
//! │   WHERE id = :id AND stock_quantity >= :n                               │
//! │                                                                         │
//! │  1 row  → applied                                                       │
//! │  0 rows → stock moved since it was read; caller rolls back              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The guard lives in the statement itself, so two concurrent decrements
//! can never both succeed against the same units.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use atlas_core::Product;

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, sku, name, product_type, price_cents, stock_quantity,
        is_in_stock, requires_shipping, parent_id, weight_grams,
        brand, manufacturer, created_at, updated_at
    FROM products
"#;

/// Repository for product rows.
///
/// Every function takes the connection to run on, so calls can be grouped
/// inside one transaction by the caller.
///
/// ## Usage
/// ```rust,ignore
/// let mut tx = db.begin().await?;
/// let product = ProductRepository::require(&mut tx, &id).await?;
/// ProductRepository::update(&mut tx, &product).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRepository;

impl ProductRepository {
    /// Gets a product by its ID, with its category ids.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?1", SELECT_PRODUCT);
        let product: Option<Product> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match product {
            Some(mut product) => {
                product.category_ids = Self::categories(conn, &product.id).await?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    /// Gets a product by ID or fails with `NotFound`.
    pub async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets several products at once, in the order of `ids`.
    ///
    /// Unknown ids are skipped.
    pub async fn get_many(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{} WHERE id IN ({})", SELECT_PRODUCT, placeholders);

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let mut rows = query.fetch_all(&mut *conn).await?;

        for product in rows.iter_mut() {
            product.category_ids = Self::categories(conn, &product.id).await?;
        }

        let mut ordered = Vec::with_capacity(rows.len());
        for id in ids {
            if let Some(idx) = rows.iter().position(|p| &p.id == id) {
                ordered.push(rows.swap_remove(idx));
            }
        }

        debug!(requested = ids.len(), found = ordered.len(), "Loaded products");
        Ok(ordered)
    }

    /// Gets a product by SKU.
    pub async fn get_by_sku(conn: &mut SqliteConnection, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE sku = ?1", SELECT_PRODUCT);
        let product: Option<Product> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&mut *conn)
            .await?;

        match product {
            Some(mut product) => {
                product.category_ids = Self::categories(conn, &product.id).await?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    /// Checks whether a SKU is taken.
    pub async fn exists_by_sku(conn: &mut SqliteConnection, sku: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    /// Inserts a new product and its categories.
    ///
    /// ## Errors
    /// `UniqueViolation` carrying the SKU when it is already taken.
    pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, product_type = %product.product_type, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, product_type, price_cents, stock_quantity,
                is_in_stock, requires_shipping, parent_id, weight_grams,
                brand, manufacturer, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.product_type.as_str())
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_in_stock)
        .bind(product.requires_shipping)
        .bind(&product.parent_id)
        .bind(product.weight_grams)
        .bind(&product.brand)
        .bind(&product.manufacturer)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::from(e).with_value(&product.sku))?;

        Self::replace_categories(conn, &product.id, &product.category_ids).await
    }

    /// Writes every mutable column of `product` back, plus its categories.
    ///
    /// `id`, `sku` and `created_at` are never written.
    pub async fn update(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                product_type = ?3,
                price_cents = ?4,
                stock_quantity = ?5,
                is_in_stock = ?6,
                requires_shipping = ?7,
                parent_id = ?8,
                weight_grams = ?9,
                brand = ?10,
                manufacturer = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.product_type.as_str())
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_in_stock)
        .bind(product.requires_shipping)
        .bind(&product.parent_id)
        .bind(product.weight_grams)
        .bind(&product.brand)
        .bind(&product.manufacturer)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Self::replace_categories(conn, &product.id, &product.category_ids).await
    }

    /// Deletes a product row. Owned composition, config and value rows
    /// go with it through `ON DELETE CASCADE`.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Lists the variants of a configurable product in creation order.
    pub async fn list_by_parent(
        conn: &mut SqliteConnection,
        parent_id: &str,
    ) -> DbResult<Vec<Product>> {
        let sql = format!("{} WHERE parent_id = ?1 ORDER BY rowid", SELECT_PRODUCT);
        let mut variants: Vec<Product> = sqlx::query_as(&sql)
            .bind(parent_id)
            .fetch_all(&mut *conn)
            .await?;

        for variant in variants.iter_mut() {
            variant.category_ids = Self::categories(conn, &variant.id).await?;
        }
        Ok(variants)
    }

    /// Counts the variants of a configurable product.
    pub async fn count_by_parent(conn: &mut SqliteConnection, parent_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE parent_id = ?1")
            .bind(parent_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Clears `parent_id` on every variant of `parent_id` and forces them
    /// to SIMPLE. Returns the number of rows detached.
    pub async fn detach_variants(conn: &mut SqliteConnection, parent_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products
               SET parent_id = NULL, product_type = 'SIMPLE', updated_at = ?2
             WHERE parent_id = ?1
            "#,
        )
        .bind(parent_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        debug!(parent_id = %parent_id, detached = result.rows_affected(), "Detached variants");
        Ok(result.rows_affected())
    }

    /// Atomically takes `quantity` units from a product.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock was at least `quantity` and has been reduced
    /// * `Ok(false)` - not enough stock (or no such product); nothing changed
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
               SET stock_quantity = stock_quantity - ?2,
                   is_in_stock = (stock_quantity - ?2) > 0,
                   updated_at = ?3
             WHERE id = ?1 AND stock_quantity >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        let applied = result.rows_affected() == 1;
        debug!(id = %id, quantity, applied, "Stock decrement");
        Ok(applied)
    }

    /// Category ids of a product, in stored order.
    pub async fn categories(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT category_id FROM product_categories WHERE product_id = ?1 ORDER BY position",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    async fn replace_categories(
        conn: &mut SqliteConnection,
        product_id: &str,
        category_ids: &[String],
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM product_categories WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        for (position, category_id) in category_ids.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO product_categories (product_id, category_id, position) VALUES (?1, ?2, ?3)",
            )
            .bind(product_id)
            .bind(category_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
