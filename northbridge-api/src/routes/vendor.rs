/// Vendor endpoints
///
/// # Endpoints
///
/// - `POST   /api/v1/vendor/register`
/// - `POST   /api/v1/vendor/login`
/// - `GET    /api/v1/vendor/vendors`       (public)
/// - `GET    /api/v1/vendor/profile`       (read Vendor)
/// - `GET    /api/v1/vendor/vendor/:id`    (public)
/// - `PATCH  /api/v1/vendor/vendor/:id`    (update Vendor, own record)
/// - `DELETE /api/v1/vendor/vendor/:id`    (delete Vendor, own record)
/// - `GET    /api/v1/vendor/logout`
///
/// Vendor records are returned with their stores, each carrying its
/// products and categories.

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
        role::Role,
        vendor::{CreateVendor, UpdateVendor, Vendor, VendorWithStores},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{
    account::{self, LoginRequest},
    authorize_on,
};
use crate::{
    app::{guarded, AppState},
    error::{ApiError, ApiResult},
    response::ApiResponse,
    session,
    validation::{normalize_email, validate, validate_phone},
};

/// Vendor registration; unlike shoppers a vendor must give a business
/// name and a first and last name
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VendorRegisterRequest {
    #[validate(length(min = 1, max = 255, message = "name should not be empty"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(min = 1, max = 100, message = "userName should not be empty"))]
    pub user_name: String,

    #[validate(length(min = 1, message = "firstName should not be empty"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "lastName should not be empty"))]
    pub last_name: String,

    pub other_name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    #[validate(length(min = 1, max = 255, message = "name should not be empty"))]
    pub name: Option<String>,

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

#[derive(Debug, Serialize)]
pub struct VendorData {
    pub vendor: VendorWithStores,
}

#[derive(Debug, Serialize)]
pub struct VendorsData {
    pub vendors: Vec<VendorWithStores>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/vendors", get(list_vendors))
        .route("/profile", guarded(state, &[PolicyCheck::READ_VENDOR], get(profile)))
        .route("/vendor/:id", get(get_vendor))
        .route("/vendor/:id", guarded(state, &[PolicyCheck::UPDATE_VENDOR], patch(update_vendor)))
        .route("/vendor/:id", guarded(state, &[PolicyCheck::DELETE_VENDOR], delete(delete_vendor)))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Vendor not found".to_string())
}

async fn vendor_with_stores(state: &AppState, id: Uuid) -> ApiResult<VendorWithStores> {
    Vendor::find_with_stores(&state.db, id).await?.ok_or_else(not_found)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<VendorRegisterRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    if Vendor::email_exists(&state.db, &email).await? {
        return Err(account::email_taken());
    }

    let password_hash = account::new_password_hash(&req.password)?;

    let vendor = Vendor::create(
        &state.db,
        CreateVendor {
            name: req.name,
            email,
            user_name: req.user_name,
            first_name: Some(req.first_name),
            last_name: Some(req.last_name),
            other_name: req.other_name,
            phone: req.phone,
            password_hash,
            is_active: req.is_active,
            is_email_verified: req.is_email_verified,
        },
    )
    .await?;

    info!(vendor_id = %vendor.id, "Vendor registered");

    let session = session::issue(&state, vendor.id, &vendor.email, Role::Vendor)?;
    Ok(account::session_response(StatusCode::CREATED, session, "Vendor registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    let vendor = Vendor::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| account::no_account(Role::Vendor, &email))?;

    account::verify_login(&req.password, &vendor.password_hash)?;

    info!(vendor_id = %vendor.id, "Vendor logged in");

    let session = session::issue(&state, vendor.id, &vendor.email, Role::Vendor)?;
    Ok(account::session_response(StatusCode::OK, session, "Vendor logged in successfully"))
}

pub async fn list_vendors(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<VendorsData>>> {
    let vendors = Vendor::list_with_stores(&state.db).await?;
    Ok(ApiResponse::ok(VendorsData { vendors }, "Vendors fetched successfully"))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiResponse<VendorData>>> {
    let vendor = vendor_with_stores(&state, principal.id).await?;
    Ok(ApiResponse::ok(VendorData { vendor }, "Vendor profile retrieved successfully"))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<VendorData>>> {
    let vendor = vendor_with_stores(&state, id).await?;
    Ok(ApiResponse::ok(VendorData { vendor }, "Vendor profile retrieved successfully"))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVendorRequest>,
) -> ApiResult<Json<ApiResponse<VendorData>>> {
    validate(&req)?;

    let current = Vendor::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Update, &current)?;
    account::ensure_email_unchanged(&current.email, req.email.as_deref())?;

    let password_hash = account::optional_password_hash(req.password.as_deref())?;

    Vendor::update(
        &state.db,
        id,
        UpdateVendor {
            name: req.name,
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

    let vendor = vendor_with_stores(&state, id).await?;
    Ok(ApiResponse::ok(VendorData { vendor }, "Vendor profile updated successfully"))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let vendor = Vendor::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Delete, &vendor)?;

    if !Vendor::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(vendor_id = %id, deleted_by = %principal.id, "Vendor deleted");

    Ok(account::deleted_response(&state, id, "Vendor deleted successfully"))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    account::logout_response(&state, "Vendor logged out successfully")
}
