/// Product categories
///
/// Unique lowercase names, linked to products through `product_category_links`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category row joined with the product it is linked to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkedProductCategory {
    pub product_id: Uuid,
    #[sqlx(flatten)]
    pub category: ProductCategory,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProductCategory {
    /// Inserts a category with a lowercased name
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`product_categories_name_key`) on duplicates
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProductCategory>(
            "INSERT INTO product_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name.to_lowercase())
        .bind(description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductCategory>("SELECT * FROM product_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductCategory>("SELECT * FROM product_categories WHERE name = $1")
            .bind(name.to_lowercase())
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductCategory>("SELECT * FROM product_categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_products(
        pool: &PgPool,
        product_ids: &[Uuid],
    ) -> Result<Vec<LinkedProductCategory>, sqlx::Error> {
        sqlx::query_as::<_, LinkedProductCategory>(
            r#"
            SELECT l.product_id, c.*
            FROM product_category_links l
            JOIN product_categories c ON c.id = l.category_id
            WHERE l.product_id = ANY($1)
            ORDER BY c.name
            "#,
        )
        .bind(product_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProductCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query =
            QueryBuilder::<Postgres>::new("UPDATE product_categories SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name.to_lowercase());
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<ProductCategory>().fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links categories to a product; existing links are kept
    pub async fn link(
        executor: impl PgExecutor<'_>,
        product_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if category_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO product_category_links (product_id, category_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(category_ids)
        .execute(executor)
        .await?;

        Ok(())
    }
}
