/// Vendor stores
///
/// A store belongs to exactly one vendor (cascade on vendor delete), holds
/// products and is tagged with store categories through
/// `store_category_links`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE stores (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     about TEXT NOT NULL,
///     phone VARCHAR(32) NOT NULL,
///     address VARCHAR(512) NOT NULL,
///     location VARCHAR(512) NOT NULL,
///     vendor_id UUID NOT NULL REFERENCES vendors(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::product::Product;
use super::store_category::StoreCategory;
use crate::auth::policy::{AsResource, Field, Resource, Subject};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub about: String,
    pub phone: String,
    pub address: String,
    pub location: String,
    pub vendor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A store with its products and categories
#[derive(Debug, Clone, Serialize)]
pub struct StoreDetail {
    #[serde(flatten)]
    pub store: Store,
    pub products: Vec<Product>,
    pub categories: Vec<StoreCategory>,
}

#[derive(Debug, Clone)]
pub struct CreateStore {
    pub name: String,
    pub about: String,
    pub phone: String,
    pub address: String,
    pub location: String,
    pub vendor_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStore {
    pub name: Option<String>,
    pub about: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
}

impl Store {
    /// Inserts a store
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if `vendor_id` does not exist
    pub async fn create(executor: impl PgExecutor<'_>, data: CreateStore) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (name, about, phone, address, location, vendor_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.about)
        .bind(data.phone)
        .bind(data.address)
        .bind(data.location)
        .bind(data.vendor_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<StoreDetail>, sqlx::Error> {
        let Some(store) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        Ok(Self::with_details(pool, vec![store]).await?.pop())
    }

    /// Lists every store with products and categories, newest first
    pub async fn list_details(pool: &PgPool) -> Result<Vec<StoreDetail>, sqlx::Error> {
        let stores = sqlx::query_as::<_, Store>("SELECT * FROM stores ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        Self::with_details(pool, stores).await
    }

    /// Stores owned by any of `vendor_ids`, with products and categories
    pub async fn list_details_for_vendors(
        pool: &PgPool,
        vendor_ids: &[Uuid],
    ) -> Result<Vec<StoreDetail>, sqlx::Error> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT * FROM stores WHERE vendor_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(vendor_ids)
        .fetch_all(pool)
        .await?;

        Self::with_details(pool, stores).await
    }

    async fn with_details(pool: &PgPool, stores: Vec<Store>) -> Result<Vec<StoreDetail>, sqlx::Error> {
        let ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();

        let mut products: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for product in Product::list_for_stores(pool, &ids).await? {
            if let Some(store_id) = product.store_id {
                products.entry(store_id).or_default().push(product);
            }
        }

        let mut categories: HashMap<Uuid, Vec<StoreCategory>> = HashMap::new();
        for link in StoreCategory::list_for_stores(pool, &ids).await? {
            categories.entry(link.store_id).or_default().push(link.category);
        }

        Ok(stores
            .into_iter()
            .map(|store| StoreDetail {
                products: products.remove(&store.id).unwrap_or_default(),
                categories: categories.remove(&store.id).unwrap_or_default(),
                store,
            })
            .collect())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateStore,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE stores SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(about) = data.about {
            query.push(", about = ").push_bind(about);
        }
        if let Some(phone) = data.phone {
            query.push(", phone = ").push_bind(phone);
        }
        if let Some(address) = data.address {
            query.push(", address = ").push_bind(address);
        }
        if let Some(location) = data.location {
            query.push(", location = ").push_bind(location);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<Store>().fetch_optional(pool).await
    }

    /// Deletes a store; its products cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AsResource for Store {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Store).with(Field::VendorId, Some(self.vendor_id))
    }
}

impl AsResource for StoreDetail {
    fn as_resource(&self) -> Resource {
        self.store.as_resource()
    }
}
