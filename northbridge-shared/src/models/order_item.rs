/// Order items
///
/// Items are created on their own and later attached to an order. An item
/// whose order is deleted keeps existing with `order_id = NULL`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

impl OrderItem {
    pub async fn create(pool: &PgPool, data: CreateOrderItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (product_id, quantity, price)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.product_id)
        .bind(data.quantity)
        .bind(data.price)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_orders(pool: &PgPool, order_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at",
        )
        .bind(order_ids)
        .fetch_all(pool)
        .await
    }

    /// Attaches loose items to an order
    ///
    /// Items that already belong to a different order are left untouched.
    ///
    /// # Returns
    ///
    /// Number of items attached
    pub async fn attach_to_order(
        executor: impl PgExecutor<'_>,
        order_id: Uuid,
        item_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if item_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET order_id = $1, updated_at = NOW()
            WHERE id = ANY($2) AND (order_id IS NULL OR order_id = $1)
            "#,
        )
        .bind(order_id)
        .bind(item_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_item_serializes_null_order() {
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: None,
            product_id: Uuid::new_v4(),
            quantity: 1,
            price: 3.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert!(json["orderId"].is_null());
        assert_eq!(json["price"], 3.0);
    }
}
