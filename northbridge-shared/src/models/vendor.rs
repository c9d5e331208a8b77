/// Vendor accounts
///
/// Vendors own stores, and through them products. Public vendor endpoints
/// return the vendor with its stores ([`VendorWithStores`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE vendors (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     user_name VARCHAR(255) NOT NULL,
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     other_name VARCHAR(255),
///     phone VARCHAR(32) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     role account_role NOT NULL DEFAULT 'VENDOR',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::role::Role;
use super::store::{Store, StoreDetail};
use crate::auth::policy::{AsResource, Field, Resource, Subject};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    /// Trading name
    pub name: String,
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

/// A vendor with its stores (each with products and categories)
#[derive(Debug, Clone, Serialize)]
pub struct VendorWithStores {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub stores: Vec<StoreDetail>,
}

#[derive(Debug, Clone)]
pub struct CreateVendor {
    pub name: String,
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

#[derive(Debug, Clone, Default)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

impl Vendor {
    /// Inserts a new vendor
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`vendors_email_key`) if the email is taken
    pub async fn create(pool: &PgPool, data: CreateVendor) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (name, email, user_name, first_name, last_name, other_name, phone,
                                 password_hash, is_active, is_email_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, TRUE), COALESCE($10, FALSE))
            RETURNING *
            "#,
        )
        .bind(data.name)
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
        sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vendors WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    pub async fn find_with_stores(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<VendorWithStores>, sqlx::Error> {
        let Some(vendor) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let stores = Store::list_details_for_vendors(pool, &[id]).await?;

        Ok(Some(VendorWithStores { vendor, stores }))
    }

    /// Lists every vendor with its stores, newest first
    pub async fn list_with_stores(pool: &PgPool) -> Result<Vec<VendorWithStores>, sqlx::Error> {
        let vendors = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = vendors.iter().map(|v| v.id).collect();
        let mut stores: HashMap<Uuid, Vec<StoreDetail>> = HashMap::new();
        for detail in Store::list_details_for_vendors(pool, &ids).await? {
            stores.entry(detail.store.vendor_id).or_default().push(detail);
        }

        Ok(vendors
            .into_iter()
            .map(|vendor| VendorWithStores {
                stores: stores.remove(&vendor.id).unwrap_or_default(),
                vendor,
            })
            .collect())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateVendor,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE vendors SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
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

        query.build_query_as::<Vendor>().fetch_optional(pool).await
    }

    /// Deletes a vendor; stores and their products cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl AsResource for Vendor {
    fn as_resource(&self) -> Resource {
        Resource::new(Subject::Vendor).with(Field::Id, Some(self.id))
    }
}
