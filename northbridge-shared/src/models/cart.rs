/// Cart lines
///
/// One row per product a user intends to buy. `price` is the unit price the
/// client quoted when the line was added.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE carts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
///     quantity INTEGER NOT NULL,
///     price DOUBLE PRECISION NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::policy::{AsResource, Field, Resource, Subject};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCart {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCart {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
}

impl Cart {
    /// Adds a cart line
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation for an unknown user or product
    pub async fn create(pool: &PgPool, data: CreateCart) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.product_id)
        .bind(data.quantity)
        .bind(data.price)
        .fetch_one(pool)
        .await
    }

    /// Finds a cart line that belongs to `user_id`
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_users(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cart>(
            "SELECT * FROM carts WHERE user_id = ANY($1) ORDER BY created_at",
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCart,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE carts SET updated_at = NOW()");

        if let Some(product_id) = data.product_id {
            query.push(", product_id = ").push_bind(product_id);
        }
        if let Some(quantity) = data.quantity {
            query.push(", quantity = ").push_bind(quantity);
        }
        if let Some(price) = data.price {
            query.push(", price = ").push_bind(price);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<Cart>().fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AsResource for Cart {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Cart).with(Field::UserId, Some(self.user_id))
    }
}
