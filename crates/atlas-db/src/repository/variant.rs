//! # Variant Repository
//!
//! Variant axes, per-product variant configuration and per-variant axis
//! values.
//!
//! ```text
//!  variant_axes          variant_configs + variant_config_axes
//!  ┌────────┬───────┐    ┌──────────┬─────────────────────────┐
//!  │ color  │ Color │◄───│ SHIRT    │ [color #0, size #1]      │
//!  │ size   │ Size  │◄───│          │ pattern, auto sku        │
//!  └────────┴───────┘    └──────────┴─────────────────────────┘
//!        ▲
//!        │   variant_attribute_values
//!        │   ┌────────────┬────────┬───────┐
//!        └───│ SHIRT-RED-M│ color  │ Red   │
//!            │ SHIRT-RED-M│ size   │ M     │
//!            └────────────┴────────┴───────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use atlas_core::{VariantAttributeValue, VariantAxis, VariantConfig};

const SELECT_AXIS: &str = r#"
    SELECT id, code, name, attribute_id, position, is_active, created_at, updated_at
      FROM variant_axes
"#;

#[derive(Debug, sqlx::FromRow)]
struct ConfigRow {
    product_id: String,
    auto_generate_sku: bool,
    sku_pattern: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for axes, configurations and axis values.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantRepository;

impl VariantRepository {
    // =========================================================================
    // Axes
    // =========================================================================

    /// Inserts an axis.
    ///
    /// ## Errors
    /// `UniqueViolation` carrying the code when it is already taken.
    pub async fn insert_axis(conn: &mut SqliteConnection, axis: &VariantAxis) -> DbResult<()> {
        debug!(id = %axis.id, code = %axis.code, "Inserting variant axis");

        sqlx::query(
            r#"
            INSERT INTO variant_axes
                (id, code, name, attribute_id, position, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&axis.id)
        .bind(&axis.code)
        .bind(&axis.name)
        .bind(&axis.attribute_id)
        .bind(axis.position)
        .bind(axis.is_active)
        .bind(axis.created_at)
        .bind(axis.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::from(e).with_value(&axis.code))?;
        Ok(())
    }

    pub async fn get_axis(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<VariantAxis>> {
        let sql = format!("{} WHERE id = ?1", SELECT_AXIS);
        let axis = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(axis)
    }

    pub async fn get_axis_by_code(
        conn: &mut SqliteConnection,
        code: &str,
    ) -> DbResult<Option<VariantAxis>> {
        let sql = format!("{} WHERE code = ?1", SELECT_AXIS);
        let axis = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(axis)
    }

    /// Axes with the given ids, in the order of `ids`. Unknown ids are skipped.
    pub async fn get_axes(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<Vec<VariantAxis>> {
        let mut axes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(axis) = Self::get_axis(conn, id).await? {
                axes.push(axis);
            }
        }
        Ok(axes)
    }

    /// All axes ordered by position then code.
    pub async fn list_axes(
        conn: &mut SqliteConnection,
        active_only: bool,
    ) -> DbResult<Vec<VariantAxis>> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let sql = format!("{} {} ORDER BY position, code", SELECT_AXIS, filter);
        let axes = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
        Ok(axes)
    }

    /// Writes name, attribute link, position and active flag. The code is
    /// never written.
    pub async fn update_axis(conn: &mut SqliteConnection, axis: &VariantAxis) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE variant_axes
               SET name = ?2, attribute_id = ?3, position = ?4, is_active = ?5, updated_at = ?6
             WHERE id = ?1
            "#,
        )
        .bind(&axis.id)
        .bind(&axis.name)
        .bind(&axis.attribute_id)
        .bind(axis.position)
        .bind(axis.is_active)
        .bind(axis.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant axis", &axis.id));
        }
        Ok(())
    }

    pub async fn delete_axis(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM variant_axes WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant axis", id));
        }
        Ok(())
    }

    /// Number of variant values that reference an axis.
    pub async fn count_values_by_axis(conn: &mut SqliteConnection, axis_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM variant_attribute_values WHERE axis_id = ?1")
                .bind(axis_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(count)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Variant configuration of a product, with its axis ids in order.
    pub async fn get_config(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Option<VariantConfig>> {
        let row: Option<ConfigRow> = sqlx::query_as(
            r#"
            SELECT product_id, auto_generate_sku, sku_pattern, created_at, updated_at
              FROM variant_configs
             WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let axis_ids: Vec<String> = sqlx::query_scalar(
            "SELECT axis_id FROM variant_config_axes WHERE product_id = ?1 ORDER BY position",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(VariantConfig {
            product_id: row.product_id,
            axis_ids,
            auto_generate_sku: row.auto_generate_sku,
            sku_pattern: row.sku_pattern,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Inserts or replaces a configuration, including its axis list.
    pub async fn upsert_config(conn: &mut SqliteConnection, config: &VariantConfig) -> DbResult<()> {
        debug!(product_id = %config.product_id, axes = config.axis_ids.len(), "Upserting variant config");

        sqlx::query(
            r#"
            INSERT INTO variant_configs
                (product_id, auto_generate_sku, sku_pattern, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (product_id) DO UPDATE SET
                auto_generate_sku = excluded.auto_generate_sku,
                sku_pattern = excluded.sku_pattern,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&config.product_id)
        .bind(config.auto_generate_sku)
        .bind(&config.sku_pattern)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM variant_config_axes WHERE product_id = ?1")
            .bind(&config.product_id)
            .execute(&mut *conn)
            .await?;

        for (position, axis_id) in config.axis_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO variant_config_axes (product_id, axis_id, position) VALUES (?1, ?2, ?3)",
            )
            .bind(&config.product_id)
            .bind(axis_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Axis Values
    // =========================================================================

    /// Inserts or replaces the value of one variant on one axis.
    pub async fn upsert_value(
        conn: &mut SqliteConnection,
        value: &VariantAttributeValue,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO variant_attribute_values
                (variant_id, axis_id, value, label, color_code, image_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (variant_id, axis_id) DO UPDATE SET
                value = excluded.value,
                label = excluded.label,
                color_code = excluded.color_code,
                image_url = excluded.image_url
            "#,
        )
        .bind(&value.variant_id)
        .bind(&value.axis_id)
        .bind(&value.value)
        .bind(&value.label)
        .bind(&value.color_code)
        .bind(&value.image_url)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn list_values_by_variant(
        conn: &mut SqliteConnection,
        variant_id: &str,
    ) -> DbResult<Vec<VariantAttributeValue>> {
        let values = sqlx::query_as(
            r#"
            SELECT variant_id, axis_id, value, label, color_code, image_url
              FROM variant_attribute_values
             WHERE variant_id = ?1
             ORDER BY rowid
            "#,
        )
        .bind(variant_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(values)
    }

    /// Every axis value of every variant under `parent_id`.
    pub async fn list_values_by_parent(
        conn: &mut SqliteConnection,
        parent_id: &str,
    ) -> DbResult<Vec<VariantAttributeValue>> {
        let values = sqlx::query_as(
            r#"
            SELECT v.variant_id, v.axis_id, v.value, v.label, v.color_code, v.image_url
              FROM variant_attribute_values v
              JOIN products p ON p.id = v.variant_id
             WHERE p.parent_id = ?1
             ORDER BY v.rowid
            "#,
        )
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(values)
    }

    /// Distinct values observed on `axis_id` among the variants of
    /// `parent_id`, ordered by first appearance.
    pub async fn list_distinct_values_by_parent_and_axis(
        conn: &mut SqliteConnection,
        parent_id: &str,
        axis_id: &str,
    ) -> DbResult<Vec<String>> {
        let values: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT v.value
              FROM variant_attribute_values v
              JOIN products p ON p.id = v.variant_id
             WHERE p.parent_id = ?1 AND v.axis_id = ?2
             GROUP BY v.value
             ORDER BY MIN(v.rowid)
            "#,
        )
        .bind(parent_id)
        .bind(axis_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(values)
    }

    /// Removes every axis value of a variant. Returns the number removed.
    pub async fn delete_values_by_variant(
        conn: &mut SqliteConnection,
        variant_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM variant_attribute_values WHERE variant_id = ?1")
            .bind(variant_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
