/// Admin endpoints
///
/// # Endpoints
///
/// - `POST   /api/v1/admin/register`
/// - `POST   /api/v1/admin/login`
/// - `GET    /api/v1/admin/admins`       (read Admin)
/// - `GET    /api/v1/admin/profile`      (read Admin)
/// - `GET    /api/v1/admin/admin/:id`    (read Admin)
/// - `PATCH  /api/v1/admin/admin/:id`    (update Admin)
/// - `DELETE /api/v1/admin/admin/:id`    (delete Admin)
/// - `GET    /api/v1/admin/logout`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use northbridge_shared::{
    auth::{middleware::Principal, policy::{Action, PolicyCheck}},
    models::{
        admin::{Admin, CreateAdmin, UpdateAdmin},
        role::Role,
    },
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{
    account::{self, LoginRequest, RegisterRequest, UpdateAccountRequest},
    authorize_on,
};
use crate::{
    app::{guarded, AppState},
    error::{ApiError, ApiResult},
    response::ApiResponse,
    session,
    validation::{normalize_email, validate},
};

#[derive(Debug, Serialize)]
pub struct AdminData {
    pub admin: Admin,
}

#[derive(Debug, Serialize)]
pub struct AdminsData {
    pub admins: Vec<Admin>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/admins", guarded(state, &[PolicyCheck::READ_ADMIN], get(list_admins)))
        .route("/profile", guarded(state, &[PolicyCheck::READ_ADMIN], get(profile)))
        .route("/admin/:id", guarded(state, &[PolicyCheck::READ_ADMIN], get(get_admin)))
        .route("/admin/:id", guarded(state, &[PolicyCheck::UPDATE_ADMIN], patch(update_admin)))
        .route("/admin/:id", guarded(state, &[PolicyCheck::DELETE_ADMIN], delete(delete_admin)))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Admin not found".to_string())
}

/// Registers an admin and signs it in
///
/// # Errors
///
/// - `400 Bad Request`: invalid body or weak password
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    if Admin::email_exists(&state.db, &email).await? {
        return Err(account::email_taken());
    }

    let password_hash = account::new_password_hash(&req.password)?;

    let admin = Admin::create(
        &state.db,
        CreateAdmin {
            email,
            user_name: req.user_name,
            first_name: req.first_name,
            last_name: req.last_name,
            other_name: req.other_name,
            phone: req.phone,
            password_hash,
            is_active: req.is_active,
            is_email_verified: req.is_email_verified,
        },
    )
    .await?;

    info!(admin_id = %admin.id, "Admin registered");

    let session = session::issue(&state, admin.id, &admin.email, Role::Admin)?;
    Ok(account::session_response(StatusCode::CREATED, session, "admin registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    let admin = Admin::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| account::no_account(Role::Admin, &email))?;

    account::verify_login(&req.password, &admin.password_hash)?;

    info!(admin_id = %admin.id, "Admin logged in");

    let session = session::issue(&state, admin.id, &admin.email, Role::Admin)?;
    Ok(account::session_response(StatusCode::OK, session, "admin logged in successfully"))
}

pub async fn list_admins(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<AdminsData>>> {
    let admins = Admin::list(&state.db).await?;
    Ok(ApiResponse::ok(AdminsData { admins }, "admins fetched successfully"))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiResponse<AdminData>>> {
    let admin = Admin::find_by_id(&state.db, principal.id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(AdminData { admin }, "admin profile fetched successfully"))
}

pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AdminData>>> {
    let admin = Admin::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(ApiResponse::ok(AdminData { admin }, "admin fetched successfully"))
}

pub async fn update_admin(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<ApiResponse<AdminData>>> {
    validate(&req)?;

    let current = Admin::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Update, &current)?;
    account::ensure_email_unchanged(&current.email, req.email.as_deref())?;

    let password_hash = account::optional_password_hash(req.password.as_deref())?;

    let admin = Admin::update(
        &state.db,
        id,
        UpdateAdmin {
            user_name: req.user_name,
            first_name: req.first_name,
            last_name: req.last_name,
            other_name: req.other_name,
            phone: req.phone,
            password_hash,
            is_active: req.is_active,
            is_email_verified: req.is_email_verified,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(AdminData { admin }, "admin updated successfully"))
}

pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let admin = Admin::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Delete, &admin)?;

    if !Admin::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(admin_id = %id, deleted_by = %principal.id, "Admin deleted");

    Ok(account::deleted_response(&state, id, "admin deleted successfully"))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    account::logout_response(&state, "admin logged out successfully")
}
