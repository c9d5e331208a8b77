/// Role based token validation
///
/// A decoded token names a role; the role selects the account table the
/// subject is looked up in:
///
/// | Role   | Validator            |
/// |--------|----------------------|
/// | USER   | [`validate_user`]    |
/// | VENDOR | [`validate_vendor`]  |
/// | ADMIN  | [`validate_admin`]   |
///
/// A token whose account no longer exists is rejected.

use sqlx::PgPool;
use tracing::debug;

use super::jwt::Claims;
use super::middleware::{AuthError, Principal};
use crate::models::{admin::Admin, role::Role, user::User, vendor::Vendor};

/// Dispatches claims to the validator for their role
pub async fn validate(pool: &PgPool, claims: &Claims) -> Result<Principal, AuthError> {
    let principal = match claims.role {
        Role::User => validate_user(pool, claims).await?,
        Role::Vendor => validate_vendor(pool, claims).await?,
        Role::Admin => validate_admin(pool, claims).await?,
    };

    match principal {
        Some(principal) => {
            debug!(account_id = %principal.id, role = %principal.role, "Principal resolved");
            Ok(principal)
        }
        None => {
            debug!(account_id = %claims.sub, role = %claims.role, "Token for unknown account");
            Err(AuthError::UnknownAccount)
        }
    }
}

pub async fn validate_user(pool: &PgPool, claims: &Claims) -> Result<Option<Principal>, AuthError> {
    Ok(User::find_by_id(pool, claims.sub)
        .await?
        .map(|user| Principal::new(user.id, Role::User, user.email)))
}

pub async fn validate_vendor(pool: &PgPool, claims: &Claims) -> Result<Option<Principal>, AuthError> {
    Ok(Vendor::find_by_id(pool, claims.sub)
        .await?
        .map(|vendor| Principal::new(vendor.id, Role::Vendor, vendor.email)))
}

pub async fn validate_admin(pool: &PgPool, claims: &Claims) -> Result<Option<Principal>, AuthError> {
    Ok(Admin::find_by_id(pool, claims.sub)
        .await?
        .map(|admin| Principal::new(admin.id, Role::Admin, admin.email)))
}
