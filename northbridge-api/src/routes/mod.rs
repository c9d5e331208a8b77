/// API route handlers
///
/// - `health`: health check
/// - `welcome`: API banner at `/api/v1`
/// - `account`: registration, login and profile helpers shared by the
///   admin, user and vendor modules
/// - `admin`, `user`, `vendor`, `store`, `product`, `payment`: resource modules

pub mod account;
pub mod admin;
pub mod health;
pub mod payment;
pub mod product;
pub mod store;
pub mod user;
pub mod vendor;
pub mod welcome;

use northbridge_shared::auth::{
    authorization::require_on,
    middleware::Principal,
    policy::{Action, AsResource, Resource},
};
use tracing::warn;

use crate::error::ApiResult;

/// Instance-level policy check against a loaded record
pub(crate) fn authorize_on<R: AsResource>(
    principal: &Principal,
    action: Action,
    record: &R,
) -> ApiResult<()> {
    authorize_resource(principal, action, &record.as_resource())
}

/// Instance-level policy check against a resource built from request input
pub(crate) fn authorize_resource(
    principal: &Principal,
    action: Action,
    resource: &Resource,
) -> ApiResult<()> {
    require_on(&principal.ability(), action, resource).map_err(|err| {
        warn!(account_id = %principal.id, role = %principal.role, "Ownership check failed: {}", err);
        err.into()
    })
}
