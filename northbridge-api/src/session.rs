/// Access token cookie handling
///
/// Login and registration hand the JWT back in an http-only cookie named
/// `access_token`; logout and account deletion overwrite it with an empty
/// value that expires immediately.

use axum::http::HeaderValue;
use northbridge_shared::auth::{
    jwt::{create_token, Claims},
    middleware::ACCESS_TOKEN_COOKIE,
};
use northbridge_shared::models::role::Role;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// A freshly issued token and the cookie that carries it
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub cookie: HeaderValue,
}

/// `Set-Cookie` value carrying `token`
pub fn access_token_cookie(
    token: &str,
    max_age: chrono::Duration,
    secure: bool,
) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ACCESS_TOKEN_COOKIE,
        token,
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie value: {}", e)))
}

/// `Set-Cookie` value that clears the access token
pub fn clear_access_token_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=1; Secure")
    } else {
        HeaderValue::from_static("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=1")
    }
}

/// Signs a token for the account and builds its cookie
pub fn issue(state: &AppState, account_id: Uuid, email: &str, role: Role) -> Result<Session, ApiError> {
    let jwt = &state.config.jwt;
    let claims = Claims::new(account_id, email.to_string(), role, jwt.expires_in);
    let token = create_token(&claims, &jwt.secret, jwt.algorithm)?;
    let cookie = access_token_cookie(&token, jwt.expires_in, state.config.api.production)?;

    Ok(Session { token, cookie })
}
