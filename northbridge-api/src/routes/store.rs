/// Store and store category endpoints
///
/// # Endpoints
///
/// - `POST   /api/v1/store/create`               (create Store)
/// - `POST   /api/v1/store/create-category`      (create StoreCategory)
/// - `GET    /api/v1/store/stores`               (public)
/// - `GET    /api/v1/store/categories`           (read StoreCategory)
/// - `GET    /api/v1/store/:id`                  (public)
/// - `GET    /api/v1/store/category/:id`         (read StoreCategory)
/// - `PATCH  /api/v1/store/:id`                  (update Store, owner)
/// - `PATCH  /api/v1/store/category/:id`         (update StoreCategory)
/// - `PATCH  /api/v1/store/add-category/:id`     (update Store, owner)
/// - `PATCH  /api/v1/store/remove-category/:id`  (update Store, owner)
/// - `PATCH  /api/v1/store/add-product/:id`      (update Store, owner)
/// - `PATCH  /api/v1/store/remove-product/:id`   (update Store, owner)
/// - `DELETE /api/v1/store/:id`                  (delete Store, owner)
/// - `DELETE /api/v1/store/category/:id`         (delete StoreCategory)
///
/// A store belongs to one vendor. Vendors may only create and change their
/// own stores; admins may change any.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use northbridge_shared::{
    auth::{
        middleware::Principal,
        policy::{Action, PolicyCheck},
    },
    models::{
        product::Product,
        role::Role,
        store::{CreateStore, Store, StoreDetail, UpdateStore},
        store_category::{StoreCategory, UpdateStoreCategory},
        vendor::Vendor,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::authorize_on;
use crate::{
    app::{guarded, AppState},
    error::{ApiError, ApiResult},
    response::ApiResponse,
    validation::{validate, validate_phone},
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 255, message = "name should not be empty"))]
    pub name: String,

    pub about: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    pub address: String,
    pub location: String,

    /// Existing store category ids
    #[serde(default)]
    pub categories: Vec<Uuid>,

    pub vendor_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, max = 255, message = "name should not be empty"))]
    pub name: Option<String>,

    pub about: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    pub address: Option<String>,
    pub location: Option<String>,

    /// Category ids to connect; existing links are kept
    #[serde(default)]
    pub categories: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name should not be empty"))]
    pub name: String,

    pub description: Option<String>,

    /// Store to link the new category to
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name should not be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StoreData {
    pub store: StoreDetail,
}

#[derive(Debug, Serialize)]
pub struct StoresData {
    pub stores: Vec<StoreDetail>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCategoryData {
    pub store_category: StoreCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCategoriesData {
    pub store_categories: Vec<StoreCategory>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/create", guarded(state, &[PolicyCheck::CREATE_STORE], post(create_store)))
        .route(
            "/create-category",
            guarded(state, &[PolicyCheck::CREATE_STORE_CATEGORY], post(create_category)),
        )
        .route("/stores", get(list_stores))
        .route(
            "/categories",
            guarded(state, &[PolicyCheck::READ_STORE_CATEGORY], get(list_categories)),
        )
        .route("/:id", get(get_store))
        .route("/:id", guarded(state, &[PolicyCheck::UPDATE_STORE], patch(update_store)))
        .route("/:id", guarded(state, &[PolicyCheck::DELETE_STORE], delete(delete_store)))
        .route(
            "/category/:id",
            guarded(state, &[PolicyCheck::READ_STORE_CATEGORY], get(get_category)),
        )
        .route(
            "/category/:id",
            guarded(state, &[PolicyCheck::UPDATE_STORE_CATEGORY], patch(update_category)),
        )
        .route(
            "/category/:id",
            guarded(state, &[PolicyCheck::DELETE_STORE_CATEGORY], delete(delete_category)),
        )
        .route("/add-category/:id", guarded(state, &[PolicyCheck::UPDATE_STORE], patch(add_category)))
        .route(
            "/remove-category/:id",
            guarded(state, &[PolicyCheck::UPDATE_STORE], patch(remove_category)),
        )
        .route("/add-product/:id", guarded(state, &[PolicyCheck::UPDATE_STORE], patch(add_product)))
        .route(
            "/remove-product/:id",
            guarded(state, &[PolicyCheck::UPDATE_STORE], patch(remove_product)),
        )
}

fn not_found() -> ApiError {
    ApiError::NotFound("Store not found".to_string())
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Store category not found".to_string())
}

fn category_exists() -> ApiError {
    ApiError::Conflict("Store Category already Exist".to_string())
}

/// Vendors may only open stores in their own name
fn ensure_creates_for_self(principal: &Principal, vendor_id: Uuid) -> ApiResult<()> {
    if principal.role == Role::Vendor && principal.id != vendor_id {
        warn!(account_id = %principal.id, vendor_id = %vendor_id, "Vendor tried to create a store for another vendor");
        return Err(ApiError::Forbidden(
            "Vendors can only create stores for themselves".to_string(),
        ));
    }
    Ok(())
}

async fn store_detail(state: &AppState, id: Uuid) -> ApiResult<StoreDetail> {
    Store::find_detail(&state.db, id).await?.ok_or_else(not_found)
}

/// Loads a store and checks the principal may update it
async fn owned_store(state: &AppState, principal: &Principal, id: Uuid) -> ApiResult<Store> {
    let store = Store::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(principal, Action::Update, &store)?;
    Ok(store)
}

/// Creates a store and connects its categories in one transaction
pub async fn create_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateStoreRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<StoreData>>)> {
    validate(&req)?;

    if Vendor::find_by_id(&state.db, req.vendor_id).await?.is_none() {
        return Err(ApiError::NotFound("Vendor not found".to_string()));
    }
    ensure_creates_for_self(&principal, req.vendor_id)?;

    let mut tx = state.db.begin().await?;

    let store = Store::create(
        &mut *tx,
        CreateStore {
            name: req.name,
            about: req.about,
            phone: req.phone,
            address: req.address,
            location: req.location,
            vendor_id: req.vendor_id,
        },
    )
    .await?;

    StoreCategory::link(&mut *tx, store.id, &req.categories).await?;
    tx.commit().await?;

    info!(store_id = %store.id, vendor_id = %store.vendor_id, "Store created");

    let store = store_detail(&state, store.id).await?;
    Ok(ApiResponse::created(StoreData { store }, "Store created successfully"))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateStoreCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<StoreCategoryData>>)> {
    validate(&req)?;

    if StoreCategory::find_by_name(&state.db, &req.name).await?.is_some() {
        return Err(category_exists());
    }

    if let Some(store_id) = req.store_id {
        owned_store(&state, &principal, store_id).await?;
    }

    let mut tx = state.db.begin().await?;

    let store_category = StoreCategory::create(&mut *tx, &req.name, req.description).await?;
    if let Some(store_id) = req.store_id {
        StoreCategory::link(&mut *tx, store_id, &[store_category.id]).await?;
    }

    tx.commit().await?;

    info!(category_id = %store_category.id, name = %store_category.name, "Store category created");

    Ok(ApiResponse::created(
        StoreCategoryData { store_category },
        "Store category created successfully",
    ))
}

pub async fn list_stores(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<StoresData>>> {
    let stores = Store::list_details(&state.db).await?;
    Ok(ApiResponse::ok(StoresData { stores }, "Stores fetched successfully"))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<StoreCategoriesData>>> {
    let store_categories = StoreCategory::list(&state.db).await?;
    Ok(ApiResponse::ok(
        StoreCategoriesData { store_categories },
        "Store categories fetched successfully",
    ))
}

pub async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store fetched successfully"))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<StoreCategoryData>>> {
    let store_category = StoreCategory::find_by_id(&state.db, id)
        .await?
        .ok_or_else(category_not_found)?;

    Ok(ApiResponse::ok(
        StoreCategoryData { store_category },
        "Store category fetched successfully",
    ))
}

pub async fn update_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStoreRequest>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    validate(&req)?;
    owned_store(&state, &principal, id).await?;

    Store::update(
        &state.db,
        id,
        UpdateStore {
            name: req.name,
            about: req.about,
            phone: req.phone,
            address: req.address,
            location: req.location,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    StoreCategory::link(&state.db, id, &req.categories).await?;

    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store updated successfully"))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStoreCategoryRequest>,
) -> ApiResult<Json<ApiResponse<StoreCategoryData>>> {
    validate(&req)?;

    if let Some(name) = req.name.as_deref() {
        if let Some(existing) = StoreCategory::find_by_name(&state.db, name).await? {
            if existing.id != id {
                return Err(category_exists());
            }
        }
    }

    let store_category = StoreCategory::update(
        &state.db,
        id,
        UpdateStoreCategory {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(category_not_found)?;

    Ok(ApiResponse::ok(
        StoreCategoryData { store_category },
        "Store category updated successfully",
    ))
}

pub async fn add_category(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRef>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    owned_store(&state, &principal, id).await?;

    if StoreCategory::find_by_id(&state.db, req.category_id).await?.is_none() {
        return Err(category_not_found());
    }

    StoreCategory::link(&state.db, id, &[req.category_id]).await?;

    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store updated successfully"))
}

pub async fn remove_category(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRef>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    owned_store(&state, &principal, id).await?;

    if !StoreCategory::unlink(&state.db, id, req.category_id).await? {
        debug!(store_id = %id, category_id = %req.category_id, "Category was not linked to store");
    }

    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store updated successfully"))
}

/// Moves a product into the store
///
/// A product that already sits in a store can only be moved by someone
/// allowed to update it; a detached product can be claimed.
pub async fn add_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRef>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    owned_store(&state, &principal, id).await?;

    let product = Product::find_detail(&state.db, req.product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    if product.store.is_some() {
        authorize_on(&principal, Action::Update, &product)?;
    }

    Product::set_store(&state.db, req.product_id, Some(id)).await?;

    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store updated successfully"))
}

pub async fn remove_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRef>,
) -> ApiResult<Json<ApiResponse<StoreData>>> {
    owned_store(&state, &principal, id).await?;

    let product = Product::find_by_id(&state.db, req.product_id).await?;
    if product.and_then(|p| p.store_id) != Some(id) {
        return Err(ApiError::NotFound("Product not found in store".to_string()));
    }

    Product::set_store(&state.db, req.product_id, None).await?;

    let store = store_detail(&state, id).await?;
    Ok(ApiResponse::ok(StoreData { store }, "Store updated successfully"))
}

pub async fn delete_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    let store = Store::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Delete, &store)?;

    if !Store::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(store_id = %id, deleted_by = %principal.id, "Store deleted");

    Ok(ApiResponse::ok(id, "Store deleted successfully"))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    if !StoreCategory::delete(&state.db, id).await? {
        return Err(category_not_found());
    }

    info!(category_id = %id, "Store category deleted");

    Ok(ApiResponse::ok(id, "Store category deleted successfully"))
}
