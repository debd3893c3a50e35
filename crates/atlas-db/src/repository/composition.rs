//! # Composition Repository
//!
//! Bundle component and grouped item rows, keyed by (owner, member) and
//! ordered by position.
//!
//! ```text
//!  bundle_components            grouped_items
//!  ┌────────────┬───────────┐   ┌────────────┬───────────┐
//!  │ bundle_id  │ component │   │ parent_id  │ child_id  │
//!  ├────────────┼───────────┤   ├────────────┼───────────┤
//!  │ KIT-01     │ A  ×2  #0 │   │ SET        │ MUG   #0  │
//!  │ KIT-01     │ B  ×1  #1 │   │ SET        │ PLATE #1  │
//!  └────────────┴───────────┘   └────────────┴───────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use atlas_core::{BundleComponent, GroupedItem};

/// Reverse lookup result: owners referencing a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owners {
    pub bundles: Vec<String>,
    pub groups: Vec<String>,
}

impl Owners {
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty() && self.groups.is_empty()
    }
}

/// Repository for composition rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionRepository;

impl CompositionRepository {
    // =========================================================================
    // Bundle Components
    // =========================================================================

    /// Components of a bundle, ordered by position.
    pub async fn list_by_bundle(
        conn: &mut SqliteConnection,
        bundle_id: &str,
    ) -> DbResult<Vec<BundleComponent>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, bundle_id, component_id, quantity, position, special_price_cents
              FROM bundle_components
             WHERE bundle_id = ?1
             ORDER BY position, rowid
            "#,
        )
        .bind(bundle_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Inserts a component row, or updates quantity/position/price when the
    /// (bundle, component) pair is already present.
    pub async fn upsert_component(
        conn: &mut SqliteConnection,
        row: &BundleComponent,
    ) -> DbResult<()> {
        debug!(bundle_id = %row.bundle_id, component_id = %row.component_id, quantity = row.quantity, "Upserting bundle component");

        sqlx::query(
            r#"
            INSERT INTO bundle_components
                (id, bundle_id, component_id, quantity, position, special_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (bundle_id, component_id) DO UPDATE SET
                quantity = excluded.quantity,
                position = excluded.position,
                special_price_cents = excluded.special_price_cents
            "#,
        )
        .bind(&row.id)
        .bind(&row.bundle_id)
        .bind(&row.component_id)
        .bind(row.quantity)
        .bind(row.position)
        .bind(row.special_price_cents)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Removes one component from a bundle.
    pub async fn delete_component(
        conn: &mut SqliteConnection,
        bundle_id: &str,
        component_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM bundle_components WHERE bundle_id = ?1 AND component_id = ?2",
        )
        .bind(bundle_id)
        .bind(component_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Bundle component",
                format!("{}/{}", bundle_id, component_id),
            ));
        }
        Ok(())
    }

    /// Removes every component of a bundle. Returns the number removed.
    pub async fn delete_components_by_owner(
        conn: &mut SqliteConnection,
        bundle_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM bundle_components WHERE bundle_id = ?1")
            .bind(bundle_id)
            .execute(&mut *conn)
            .await?;
        debug!(bundle_id = %bundle_id, removed = result.rows_affected(), "Cleared bundle components");
        Ok(result.rows_affected())
    }

    /// Whether `component_id` is already in `bundle_id`.
    pub async fn component_exists(
        conn: &mut SqliteConnection,
        bundle_id: &str,
        component_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bundle_components WHERE bundle_id = ?1 AND component_id = ?2",
        )
        .bind(bundle_id)
        .bind(component_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    /// Position after the last component of a bundle.
    pub async fn next_component_position(
        conn: &mut SqliteConnection,
        bundle_id: &str,
    ) -> DbResult<i64> {
        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM bundle_components WHERE bundle_id = ?1",
        )
        .bind(bundle_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(next)
    }

    // =========================================================================
    // Grouped Items
    // =========================================================================

    /// Children of a grouped product, ordered by position.
    pub async fn list_by_parent(
        conn: &mut SqliteConnection,
        parent_id: &str,
    ) -> DbResult<Vec<GroupedItem>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, parent_id, child_id, default_quantity, min_quantity, max_quantity, position
              FROM grouped_items
             WHERE parent_id = ?1
             ORDER BY position, rowid
            "#,
        )
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Inserts a grouped item, or updates it when the pair exists.
    pub async fn upsert_item(conn: &mut SqliteConnection, row: &GroupedItem) -> DbResult<()> {
        debug!(parent_id = %row.parent_id, child_id = %row.child_id, "Upserting grouped item");

        sqlx::query(
            r#"
            INSERT INTO grouped_items
                (id, parent_id, child_id, default_quantity, min_quantity, max_quantity, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (parent_id, child_id) DO UPDATE SET
                default_quantity = excluded.default_quantity,
                min_quantity = excluded.min_quantity,
                max_quantity = excluded.max_quantity,
                position = excluded.position
            "#,
        )
        .bind(&row.id)
        .bind(&row.parent_id)
        .bind(&row.child_id)
        .bind(row.default_quantity)
        .bind(row.min_quantity)
        .bind(row.max_quantity)
        .bind(row.position)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Removes one child from a grouped product.
    pub async fn delete_item(
        conn: &mut SqliteConnection,
        parent_id: &str,
        child_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM grouped_items WHERE parent_id = ?1 AND child_id = ?2")
            .bind(parent_id)
            .bind(child_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Grouped item",
                format!("{}/{}", parent_id, child_id),
            ));
        }
        Ok(())
    }

    /// Removes every child of a grouped product. Returns the number removed.
    pub async fn delete_items_by_owner(
        conn: &mut SqliteConnection,
        parent_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM grouped_items WHERE parent_id = ?1")
            .bind(parent_id)
            .execute(&mut *conn)
            .await?;
        debug!(parent_id = %parent_id, removed = result.rows_affected(), "Cleared grouped items");
        Ok(result.rows_affected())
    }

    /// Whether `child_id` is already in `parent_id`.
    pub async fn item_exists(
        conn: &mut SqliteConnection,
        parent_id: &str,
        child_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM grouped_items WHERE parent_id = ?1 AND child_id = ?2",
        )
        .bind(parent_id)
        .bind(child_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count > 0)
    }

    /// Position after the last child of a grouped product.
    pub async fn next_item_position(conn: &mut SqliteConnection, parent_id: &str) -> DbResult<i64> {
        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM grouped_items WHERE parent_id = ?1",
        )
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(next)
    }

    // =========================================================================
    // Reverse Lookup
    // =========================================================================

    /// Bundles and grouped products that contain `product_id`.
    pub async fn find_owners_containing(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Owners> {
        let bundles: Vec<String> = sqlx::query_scalar(
            "SELECT bundle_id FROM bundle_components WHERE component_id = ?1 ORDER BY rowid",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        let groups: Vec<String> = sqlx::query_scalar(
            "SELECT parent_id FROM grouped_items WHERE child_id = ?1 ORDER BY rowid",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Owners { bundles, groups })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
