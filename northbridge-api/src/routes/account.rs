/// Account endpoints shared by admins, users and vendors
///
/// The three account modules differ only in the table they hit; request
/// bodies, password rules, login checks and the cookie responses are
/// defined once here.
///
/// # Register
///
/// ```text
/// POST /api/v1/{admin|user|vendor}/register
/// Content-Type: application/json
///
/// {
///   "email": "jane@example.com",
///   "password": "Str0ng!Pass",
///   "userName": "jane",
///   "phone": "+2348030000000"
/// }
/// ```
///
/// Responds 201 with `Set-Cookie: access_token=...; HttpOnly` and
///
/// ```json
/// { "data": { "access_token": "eyJ..." }, "message": "...", "success": true }
/// ```

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use northbridge_shared::{
    auth::password::{hash_password, validate_password_strength, verify_password},
    models::role::Role,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
    session::{clear_access_token_cookie, Session},
    validation::validate_phone,
};

/// Registration body for admins and users
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength is checked separately so the response names the failed rule
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "userName should not be empty"))]
    pub user_name: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "password should not be empty"))]
    pub password: String,
}

/// Partial account update
///
/// `email` is accepted only so a changed address can be rejected.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub email: Option<String>,

    #[validate(length(min = 1, max = 100, message = "userName should not be empty"))]
    pub user_name: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
}

/// Rejects an email change; resending the current address is fine
pub fn ensure_email_unchanged(current: &str, requested: Option<&str>) -> ApiResult<()> {
    match requested {
        Some(email) if !email.trim().eq_ignore_ascii_case(current) => {
            Err(ApiError::BadRequest("Email cannot be changed".to_string()))
        }
        _ => Ok(()),
    }
}

/// Checks password strength and hashes it
pub fn new_password_hash(password: &str) -> ApiResult<String> {
    validate_password_strength(password)?;
    Ok(hash_password(password)?)
}

pub fn optional_password_hash(password: Option<&str>) -> ApiResult<Option<String>> {
    password.map(new_password_hash).transpose()
}

/// Verifies a login password; a mismatch is a 400, never a 401
pub fn verify_login(password: &str, password_hash: &str) -> ApiResult<()> {
    if verify_password(password, password_hash)? {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid email or password".to_string()))
    }
}

pub fn no_account(role: Role, email: &str) -> ApiError {
    ApiError::NotFound(format!("No account found for {} with email {}", role.label(), email))
}

pub fn email_taken() -> ApiError {
    ApiError::Conflict("Email Already Exist".to_string())
}

/// Token body plus the `Set-Cookie` that carries it
pub fn session_response(status: StatusCode, session: Session, message: &str) -> Response {
    let body = ApiResponse::new(
        TokenData {
            access_token: session.token,
        },
        message,
    );

    (status, [(header::SET_COOKIE, session.cookie)], Json(body)).into_response()
}

/// Clears the access token cookie
pub fn logout_response(state: &AppState, message: &str) -> Response {
    let cookie = clear_access_token_cookie(state.config.api.production);
    (
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(true, message),
    )
        .into_response()
}

/// Deleted account id, with the access token cookie cleared
pub fn deleted_response(state: &AppState, id: Uuid, message: &str) -> Response {
    let cookie = clear_access_token_cookie(state.config.api.production);
    ([(header::SET_COOKIE, cookie)], ApiResponse::ok(id, message)).into_response()
}
