/// Shopper accounts
///
/// Users own cart lines and orders. Every read endpoint returns the user
/// together with its cart (see [`UserWithCart`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     user_name VARCHAR(255) NOT NULL,
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     other_name VARCHAR(255),
///     phone VARCHAR(32) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     role account_role NOT NULL DEFAULT 'USER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::models::user::User;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_with_cart(&pool, user_id).await? {
///     println!("{} has {} cart lines", user.user.email, user.cart.len());
/// }
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::cart::Cart;
use super::role::Role;
use crate::auth::policy::{AsResource, Field, Resource, Subject};

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: String,

    /// Argon2id hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub is_active: bool,
    pub is_email_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user and its cart lines
#[derive(Debug, Clone, Serialize)]
pub struct UserWithCart {
    #[serde(flatten)]
    pub user: User,
    pub cart: Vec<Cart>,
}

/// Input for creating a user. The email should already be lowercased.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: String,
    pub password_hash: String,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`users_email_key`) if the email is taken
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, user_name, first_name, last_name, other_name, phone,
                               password_hash, is_active, is_email_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, TRUE), COALESCE($9, FALSE))
            RETURNING *
            "#,
        )
        .bind(data.email)
        .bind(data.user_name)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.other_name)
        .bind(data.phone)
        .bind(data.password_hash)
        .bind(data.is_active)
        .bind(data.is_email_verified)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Loads a user together with its cart
    pub async fn find_with_cart(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<UserWithCart>, sqlx::Error> {
        let Some(user) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let cart = Cart::list_for_user(pool, id).await?;

        Ok(Some(UserWithCart { user, cart }))
    }

    /// Lists every user with its cart, newest first
    ///
    /// Cart lines are fetched in a single query for all users.
    pub async fn list_with_cart(pool: &PgPool) -> Result<Vec<UserWithCart>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let mut carts: HashMap<Uuid, Vec<Cart>> = HashMap::new();
        for line in Cart::list_for_users(pool, &ids).await? {
            carts.entry(line.user_id).or_default().push(line);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let cart = carts.remove(&user.id).unwrap_or_default();
                UserWithCart { user, cart }
            })
            .collect())
    }

    /// Applies the non-`None` fields of `data`
    ///
    /// # Returns
    ///
    /// The updated user, or `None` if no user has this id
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(user_name) = data.user_name {
            query.push(", user_name = ").push_bind(user_name);
        }
        if let Some(first_name) = data.first_name {
            query.push(", first_name = ").push_bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            query.push(", last_name = ").push_bind(last_name);
        }
        if let Some(other_name) = data.other_name {
            query.push(", other_name = ").push_bind(other_name);
        }
        if let Some(phone) = data.phone {
            query.push(", phone = ").push_bind(phone);
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(is_active) = data.is_active {
            query.push(", is_active = ").push_bind(is_active);
        }
        if let Some(verified) = data.is_email_verified {
            query.push(", is_email_verified = ").push_bind(verified);
        }

        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query.build_query_as::<User>().fetch_optional(pool).await
    }

    /// Deletes a user; carts and orders cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

impl AsResource for User {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::User).with(Field::Id, Some(self.id))
    }
}
