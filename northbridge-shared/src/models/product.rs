/// Products
///
/// A product optionally belongs to a store (cascade on store delete), is
/// tagged with product categories and carries uploaded images.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE product_status AS ENUM ('DRAFT', 'ACTIVE', 'DELETED');
///
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     price JSONB NOT NULL,
///     quantity INTEGER NOT NULL DEFAULT 1,
///     rating DOUBLE PRECISION NOT NULL DEFAULT 1.0,
///     status product_status NOT NULL DEFAULT 'ACTIVE',
///     store_id UUID REFERENCES stores(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::models::product::{CreateProduct, Price, Product};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, store_id: Uuid) -> Result<(), sqlx::Error> {
/// let product = Product::create(&pool, CreateProduct {
///     name: "Mug".to_string(),
///     description: "Stoneware mug".to_string(),
///     price: Price { amount: "12.50".to_string(), currency: "USD".to_string() },
///     quantity: 10,
///     rating: None,
///     status: None,
///     store_id: Some(store_id),
/// })
/// .await?;
///
/// let detail = Product::find_detail(&pool, product.id).await?;
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::file::File;
use super::product_category::ProductCategory;
use super::store::Store;
use crate::auth::policy::{AsResource, Field, Resource, Subject};

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    Draft,
    #[default]
    Active,
    Deleted,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Deleted => "DELETED",
        }
    }

    /// Parses a status name, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(ProductStatus::Draft),
            "ACTIVE" => Some(ProductStatus::Active),
            "DELETED" => Some(ProductStatus::Deleted),
            _ => None,
        }
    }
}

/// Price as sent by clients: a decimal string and a currency code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Json<Price>,
    pub quantity: i32,
    pub rating: f64,
    pub status: ProductStatus,
    pub store_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product with its categories, store and images
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<ProductCategory>,
    pub store: Option<Store>,
    pub images: Vec<File>,
}

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    /// Defaults to 1.0
    pub rating: Option<f64>,
    /// Defaults to ACTIVE
    pub status: Option<ProductStatus>,
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub quantity: Option<i32>,
    pub rating: Option<f64>,
    pub status: Option<ProductStatus>,
    pub store_id: Option<Uuid>,
}

impl Product {
    pub async fn create(executor: impl PgExecutor<'_>, data: CreateProduct) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, quantity, rating, status, store_id)
            VALUES ($1, $2, $3, $4, COALESCE($5, 1.0), COALESCE($6, 'ACTIVE'::product_status), $7)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(Json(data.price))
        .bind(data.quantity)
        .bind(data.rating)
        .bind(data.status)
        .bind(data.store_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<ProductDetail>, sqlx::Error> {
        let Some(product) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        Ok(Self::with_details(pool, vec![product]).await?.pop())
    }

    /// Lists every product with categories, store and images, newest first
    pub async fn list_details(pool: &PgPool) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        Self::with_details(pool, products).await
    }

    pub async fn list_for_stores(pool: &PgPool, store_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE store_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(store_ids)
        .fetch_all(pool)
        .await
    }

    async fn with_details(
        pool: &PgPool,
        products: Vec<Product>,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let mut store_ids: Vec<Uuid> = products.iter().filter_map(|p| p.store_id).collect();
        store_ids.sort_unstable();
        store_ids.dedup();

        let mut categories: HashMap<Uuid, Vec<ProductCategory>> = HashMap::new();
        for link in ProductCategory::list_for_products(pool, &ids).await? {
            categories.entry(link.product_id).or_default().push(link.category);
        }

        let mut images: HashMap<Uuid, Vec<File>> = HashMap::new();
        for file in File::list_for_products(pool, &ids).await? {
            if let Some(product_id) = file.product_id {
                images.entry(product_id).or_default().push(file);
            }
        }

        let stores: HashMap<Uuid, Store> = Store::find_by_ids(pool, &store_ids)
            .await?
            .into_iter()
            .map(|store| (store.id, store))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| ProductDetail {
                categories: categories.remove(&product.id).unwrap_or_default(),
                images: images.remove(&product.id).unwrap_or_default(),
                store: product.store_id.and_then(|id| stores.get(&id).cloned()),
                product,
            })
            .collect())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(price) = data.price {
            query.push(", price = ").push_bind(Json(price));
        }
        if let Some(quantity) = data.quantity {
            query.push(", quantity = ").push_bind(quantity);
        }
        if let Some(rating) = data.rating {
            query.push(", rating = ").push_bind(rating);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(store_id) = data.store_id {
            query.push(", store_id = ").push_bind(store_id);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<Product>().fetch_optional(pool).await
    }

    /// Moves a product into a store, or detaches it with `None`
    pub async fn set_store(
        pool: &PgPool,
        id: Uuid,
        store_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET store_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a product; file records and category links cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AsResource for ProductDetail {
    /// Ownership runs through the store: `store.vendor_id`
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Product)
            .with(Field::Id, Some(self.product.id))
            .with(Field::StoreVendorId, self.store.as_ref().map(|s| s.vendor_id))
    }
}
