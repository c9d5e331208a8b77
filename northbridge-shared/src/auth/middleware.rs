/// Request authentication
///
/// Access tokens travel in the http-only `access_token` cookie. This module
/// pulls the token out of the request headers, validates it, resolves the
/// account through [`super::strategy`] and produces the request
/// [`Principal`].
///
/// # Token lookup
///
/// 1. The `access_token` cookie
/// 2. If that cookie is absent, the raw `Cookie` header value itself
///    (clients that send the bare token as the header value)
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use northbridge_shared::auth::jwt::Algorithm;
/// use northbridge_shared::auth::middleware::authenticate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) {
/// match authenticate(&pool, &headers, "secret", Algorithm::HS256).await {
///     Ok(principal) => println!("{} ({})", principal.email, principal.role),
///     Err(e) => println!("rejected: {}", e),
/// }
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, Algorithm, JwtError};
use super::policy::Ability;
use super::strategy;
use crate::models::role::Role;

/// Name of the cookie that carries the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The authenticated account behind a request
///
/// Inserted into request extensions by the auth layer; handlers read it with
/// `Extension<Principal>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Principal {
    pub fn new(id: Uuid, role: Role, email: impl Into<String>) -> Self {
        Self {
            id,
            role,
            email: email.into(),
        }
    }

    /// Capability rules for this principal
    pub fn ability(&self) -> Ability {
        Ability::for_principal(self.id, self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in the request
    #[error("Unauthorized")]
    MissingCredentials,

    /// Token failed signature, issuer or expiry checks
    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but the account no longer exists
    #[error("Unauthorized")]
    UnknownAccount,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

/// Finds a cookie by name in a `Cookie` header value
///
/// ```
/// use northbridge_shared::auth::middleware::cookie_value;
///
/// assert_eq!(cookie_value("theme=dark; access_token=abc", "access_token"), Some("abc"));
/// assert_eq!(cookie_value("theme=dark", "access_token"), None);
/// ```
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Extracts the access token from request headers
///
/// Returns `None` when there is no usable token. An empty `access_token`
/// cookie (as left behind by logout) counts as no token.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    for cookie_header in &cookies {
        if let Some(token) = cookie_value(cookie_header, ACCESS_TOKEN_COOKIE) {
            return (!token.is_empty()).then(|| token.to_string());
        }
    }

    cookies
        .first()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty() && !raw.contains('='))
        .map(str::to_string)
}

/// Validates the request token and resolves the principal
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when no token is present
/// - `AuthError::InvalidToken` when validation fails
/// - `AuthError::UnknownAccount` when the account was deleted
pub async fn authenticate(
    pool: &PgPool,
    headers: &HeaderMap,
    secret: &str,
    algorithm: Algorithm,
) -> Result<Principal, AuthError> {
    let token = extract_access_token(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = validate_token(&token, secret, algorithm)?;

    strategy::validate(pool, &claims).await
}
