/// Policy guard middleware
///
/// Runs after the JWT layer. Each guarded route declares the policy checks
/// it needs; the guard builds the [`Ability`](northbridge_shared::auth::policy::Ability)
/// of the request [`Principal`] and rejects the request with 403 unless every
/// check passes.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use northbridge_api::middleware::guard::create_policy_guard;
/// use northbridge_shared::auth::policy::PolicyCheck;
///
/// let app: Router = Router::new()
///     .route("/admins", get(|| async { "admins" }))
///     .route_layer(middleware::from_fn(create_policy_guard(&[PolicyCheck::READ_ADMIN])));
/// ```

use std::future::Future;
use std::pin::Pin;

use axum::{extract::Request, middleware::Next, response::Response};
use northbridge_shared::auth::{authorization::require_all, middleware::Principal, policy::PolicyCheck};
use tracing::warn;

use crate::error::ApiError;

/// Checks the principal against `checks` before running the handler
pub async fn policy_guard(
    checks: &'static [PolicyCheck],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    if let Err(err) = require_all(&principal.ability(), checks) {
        warn!(
            account_id = %principal.id,
            role = %principal.role,
            path = %req.uri().path(),
            "Policy check failed: {}",
            err
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}

/// Creates a guard closure for `middleware::from_fn`
pub fn create_policy_guard(
    checks: &'static [PolicyCheck],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>> + Clone
{
    move |req, next| Box::pin(policy_guard(checks, req, next))
}
