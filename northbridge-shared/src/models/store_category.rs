/// Store categories
///
/// Category names are unique and stored lowercase. Stores and categories are
/// linked many-to-many through `store_category_links`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE store_categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE store_category_links (
///     store_id UUID NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
///     category_id UUID NOT NULL REFERENCES store_categories(id) ON DELETE CASCADE,
///     PRIMARY KEY (store_id, category_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category row joined with the store it is linked to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkedStoreCategory {
    pub store_id: Uuid,
    #[sqlx(flatten)]
    pub category: StoreCategory,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStoreCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StoreCategory {
    /// Inserts a category. The name is lowercased before it is stored.
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`store_categories_name_key`) on duplicates
    pub async fn create(
        executor: impl PgExecutor<'_>,
        name: &str,
        description: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, StoreCategory>(
            "INSERT INTO store_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name.to_lowercase())
        .bind(description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StoreCategory>("SELECT * FROM store_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StoreCategory>("SELECT * FROM store_categories WHERE name = $1")
            .bind(name.to_lowercase())
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StoreCategory>("SELECT * FROM store_categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Categories linked to any of `store_ids`
    pub async fn list_for_stores(
        pool: &PgPool,
        store_ids: &[Uuid],
    ) -> Result<Vec<LinkedStoreCategory>, sqlx::Error> {
        sqlx::query_as::<_, LinkedStoreCategory>(
            r#"
            SELECT l.store_id, c.*
            FROM store_category_links l
            JOIN store_categories c ON c.id = l.category_id
            WHERE l.store_id = ANY($1)
            ORDER BY c.name
            "#,
        )
        .bind(store_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateStoreCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query =
            QueryBuilder::<Postgres>::new("UPDATE store_categories SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name.to_lowercase());
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<StoreCategory>().fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM store_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links categories to a store; existing links are kept
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if a category id does not exist
    pub async fn link(
        executor: impl PgExecutor<'_>,
        store_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if category_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO store_category_links (store_id, category_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(store_id)
        .bind(category_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Removes a category link; returns false if it did not exist
    pub async fn unlink(pool: &PgPool, store_id: Uuid, category_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM store_category_links WHERE store_id = $1 AND category_id = $2",
        )
        .bind(store_id)
        .bind(category_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
