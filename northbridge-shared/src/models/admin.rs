/// Admin accounts
///
/// # Schema
///
/// ```sql
/// CREATE TABLE admins (
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
///     role account_role NOT NULL DEFAULT 'ADMIN',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::models::admin::{Admin, CreateAdmin};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let admin = Admin::create(&pool, CreateAdmin {
///     email: "ops@example.com".to_string(),
///     user_name: "ops".to_string(),
///     first_name: None,
///     last_name: None,
///     other_name: None,
///     phone: "+2348012345678".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_active: None,
///     is_email_verified: None,
/// })
/// .await?;
///
/// assert!(Admin::find_by_email(&pool, "ops@example.com").await?.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::role::Role;
use crate::auth::policy::{AsResource, Field, Resource, Subject};

/// Admin account
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: String,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub is_active: bool,
    pub is_email_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an admin. `None` flags fall back to column defaults.
#[derive(Debug, Clone)]
pub struct CreateAdmin {
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

/// Partial update. Email is not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdmin {
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

impl Admin {
    /// Inserts a new admin
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`admins_email_key`) if the email is taken
    pub async fn create(pool: &PgPool, data: CreateAdmin) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, user_name, first_name, last_name, other_name, phone,
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
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM admins WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Lists all admins, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    /// Applies the non-`None` fields of `data`
    ///
    /// # Returns
    ///
    /// The updated admin, or `None` if no admin has this id
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAdmin,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE admins SET updated_at = NOW()");

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

        query.build_query_as::<Admin>().fetch_optional(pool).await
    }

    /// Deletes an admin
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

impl AsResource for Admin {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Admin).with(Field::Id, Some(self.id))
    }
}
