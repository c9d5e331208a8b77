/// Orders
///
/// An order belongs to a user and groups previously created order items.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('PENDING', 'PROCESSING', 'COMPLETED', 'CANCELLED');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status order_status NOT NULL DEFAULT 'PENDING',
///     reference VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::order_item::OrderItem;
use crate::auth::policy::{AsResource, Field, Resource, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    /// Payment reference, once a transaction was initialized
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its items
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: Uuid,
    pub status: Option<OrderStatus>,
    pub reference: Option<String>,
    /// Existing order item ids to attach
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub reference: Option<String>,
    /// Additional order item ids to attach
    pub item_ids: Vec<Uuid>,
}

impl Order {
    /// Creates an order and attaches its items in one transaction
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<OrderDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, status, reference)
            VALUES ($1, COALESCE($2, 'PENDING'::order_status), $3)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.status)
        .bind(data.reference)
        .fetch_one(&mut *tx)
        .await?;

        OrderItem::attach_to_order(&mut *tx, order.id, &data.item_ids).await?;

        tx.commit().await?;

        let items = OrderItem::list_for_orders(pool, &[order.id]).await?;
        Ok(OrderDetail { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<OrderDetail>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        Ok(Self::with_items(pool, vec![order]).await?.pop())
    }

    /// Every order, newest first
    pub async fn list_details(pool: &PgPool) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        Self::with_items(pool, orders).await
    }

    /// Orders placed by one user, newest first
    pub async fn list_details_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Self::with_items(pool, orders).await
    }

    async fn with_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in OrderItem::list_for_orders(pool, &ids).await? {
            if let Some(order_id) = item.order_id {
                items.entry(order_id).or_default().push(item);
            }
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderDetail {
                items: items.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    /// Updates status/reference and attaches extra items in one transaction
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateOrder,
    ) -> Result<Option<OrderDetail>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE orders SET updated_at = NOW()");
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(reference) = data.reference {
            query.push(", reference = ").push_bind(reference);
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let Some(order) = query.build_query_as::<Order>().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        OrderItem::attach_to_order(&mut *tx, order.id, &data.item_ids).await?;
        tx.commit().await?;

        Ok(Self::with_items(pool, vec![order]).await?.pop())
    }

    /// Deletes an order; its items are detached, not deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AsResource for Order {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Order).with(Field::UserId, Some(self.user_id))
    }
}

impl AsResource for OrderDetail {
    fn as_resource(&self) -> Resource {
        self.order.as_resource()
    }
}
