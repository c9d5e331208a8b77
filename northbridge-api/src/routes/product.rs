/// Product and product category endpoints
///
/// # Endpoints
///
/// - `POST   /api/v1/product/create`           (create Product, multipart)
/// - `GET    /api/v1/product/products`         (public)
/// - `GET    /api/v1/product/product/:id`      (public)
/// - `PATCH  /api/v1/product/product/:id`      (update Product, store owner)
/// - `DELETE /api/v1/product/product/:id`      (delete Product, store owner)
/// - `POST   /api/v1/product/create-category`  (create ProductCategory)
/// - `GET    /api/v1/product/categories`       (public)
/// - `GET    /api/v1/product/category/:id`     (public)
/// - `PATCH  /api/v1/product/category/:id`     (update ProductCategory)
/// - `DELETE /api/v1/product/category/:id`     (delete ProductCategory)
///
/// # Creating a product
///
/// ```text
/// POST /api/v1/product/create
/// Content-Type: multipart/form-data
///
/// name=Sneakers
/// description=Running shoes
/// price[amount]=49.99
/// price[currency]=USD
/// quantity=10
/// storeId=6f1c...
/// categories[]=0b7e...
/// files=@front.png
/// files=@side.jpg
/// ```
///
/// `price` may also be sent as one JSON field: `price={"amount":"49.99","currency":"USD"}`.

use std::path::Path as FsPath;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
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
        file::{CreateFile, File},
        product::{CreateProduct, Price, Product, ProductDetail, ProductStatus, UpdateProduct},
        product_category::{ProductCategory, UpdateProductCategory},
        store::Store,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::authorize_on;
use crate::{
    app::{guarded, AppState},
    error::{ApiError, ApiResult},
    response::ApiResponse,
    storage::{self, MultipartForm, StoredFile},
    validation::validate,
};

/// Slack on top of the file limits for the text parts of a multipart body
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Product fields read from a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub rating: Option<f64>,
    pub status: Option<ProductStatus>,
    pub store_id: Uuid,
    pub categories: Vec<Uuid>,
    /// Ids of files uploaded earlier
    pub images: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "name should not be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub price: Option<Price>,

    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: Option<i32>,

    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,

    pub status: Option<ProductStatus>,
    pub store_id: Option<Uuid>,

    /// Category ids to connect; existing links are kept
    #[serde(default)]
    pub categories: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name should not be empty"))]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name should not be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductData {
    pub product: ProductDetail,
}

#[derive(Debug, Serialize)]
pub struct ProductsData {
    pub products: Vec<ProductDetail>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategoryData {
    pub product_category: ProductCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategoriesData {
    pub product_categories: Vec<ProductCategory>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    let uploads = &state.config.uploads;
    let body_limit = uploads.max_file_size * uploads.max_files + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/create",
            guarded(
                state,
                &[PolicyCheck::CREATE_PRODUCT],
                post(create_product).layer(DefaultBodyLimit::max(body_limit)),
            ),
        )
        .route("/products", get(list_products))
        .route("/product/:id", get(get_product))
        .route("/product/:id", guarded(state, &[PolicyCheck::UPDATE_PRODUCT], patch(update_product)))
        .route(
            "/product/:id",
            guarded(state, &[PolicyCheck::DELETE_PRODUCT], delete(delete_product)),
        )
        .route(
            "/create-category",
            guarded(state, &[PolicyCheck::CREATE_PRODUCT_CATEGORY], post(create_category)),
        )
        .route("/categories", get(list_categories))
        .route("/category/:id", get(get_category))
        .route(
            "/category/:id",
            guarded(state, &[PolicyCheck::UPDATE_PRODUCT_CATEGORY], patch(update_category)),
        )
        .route(
            "/category/:id",
            guarded(state, &[PolicyCheck::DELETE_PRODUCT_CATEGORY], delete(delete_category)),
        )
}

fn not_found() -> ApiError {
    ApiError::NotFound("Product not found".to_string())
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Product category not found".to_string())
}

fn category_exists() -> ApiError {
    ApiError::Conflict("Product Category already Exist".to_string())
}

fn required<'a>(form: &'a MultipartForm, name: &str) -> ApiResult<&'a str> {
    form.get(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} should not be empty", name)))
}

fn parse_uuid(value: &str, name: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("{} must be a valid id", name)))
}

fn parse_uuids(values: Vec<&str>, name: &str) -> ApiResult<Vec<Uuid>> {
    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_uuid(value, name))
        .collect()
}

/// `price` as a JSON object, or `price[amount]` and `price[currency]`
fn parse_price(form: &MultipartForm) -> ApiResult<Price> {
    let price = match form.get("price") {
        Some(raw) => serde_json::from_str::<Price>(raw)
            .map_err(|_| ApiError::BadRequest("price must be an object with amount and currency".to_string()))?,
        None => Price {
            amount: required(form, "price[amount]")?.to_string(),
            currency: required(form, "price[currency]")?.to_string(),
        },
    };

    check_price(&price)?;
    Ok(price)
}

/// Amount must parse as a non-negative number and currency must be set
fn check_price(price: &Price) -> ApiResult<()> {
    if price.amount.trim().parse::<f64>().map_or(true, |amount| amount < 0.0) {
        return Err(ApiError::BadRequest("price amount must be a positive number".to_string()));
    }
    if price.currency.trim().is_empty() {
        return Err(ApiError::BadRequest("price currency should not be empty".to_string()));
    }
    Ok(())
}

impl ProductForm {
    /// Reads and checks the text parts of a create request
    pub fn parse(form: &MultipartForm) -> ApiResult<Self> {
        let quantity = required(form, "quantity")?
            .parse::<i32>()
            .ok()
            .filter(|quantity| *quantity >= 0)
            .ok_or_else(|| ApiError::BadRequest("quantity must be a whole number".to_string()))?;

        let rating = match form.get("rating").map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|rating| (0.0..=5.0).contains(rating))
                    .ok_or_else(|| ApiError::BadRequest("rating must be between 0 and 5".to_string()))?,
            ),
            None => None,
        };

        let status = match form.get("status").map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                ProductStatus::parse(raw)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown product status: {}", raw)))?,
            ),
            None => None,
        };

        Ok(Self {
            name: required(form, "name")?.to_string(),
            description: required(form, "description")?.to_string(),
            price: parse_price(form)?,
            quantity,
            rating,
            status,
            store_id: parse_uuid(required(form, "storeId")?, "storeId")?,
            categories: parse_uuids(form.get_all("categories"), "categories")?,
            images: parse_uuids(form.get_all("images"), "images")?,
        })
    }
}

async fn product_detail(state: &AppState, id: Uuid) -> ApiResult<ProductDetail> {
    Product::find_detail(&state.db, id).await?.ok_or_else(not_found)
}

/// Loads the target store and checks the principal may stock it
async fn owned_store(state: &AppState, principal: &Principal, store_id: Uuid) -> ApiResult<Store> {
    let store = Store::find_by_id(&state.db, store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Store not found".to_string()))?;
    authorize_on(principal, Action::Update, &store)?;
    Ok(store)
}

/// Deletes files from disk; failures are logged, not returned
async fn remove_files(root: &FsPath, paths: Vec<String>) {
    for path in &paths {
        if let Err(e) = storage::remove(root, path).await {
            warn!(path = %path, "Failed to remove uploaded file: {}", e);
        }
    }
}

fn stored_paths(stored: &[StoredFile]) -> Vec<String> {
    stored.iter().map(|file| file.path.clone()).collect()
}

/// Inserts the product, its file records and category links in one
/// transaction
async fn insert_product(state: &AppState, form: ProductForm, stored: &[StoredFile]) -> ApiResult<Uuid> {
    let mut tx = state.db.begin().await?;

    let product = Product::create(
        &mut *tx,
        CreateProduct {
            name: form.name,
            description: form.description,
            price: form.price,
            quantity: form.quantity,
            rating: form.rating,
            status: form.status,
            store_id: Some(form.store_id),
        },
    )
    .await?;

    let mut image_ids = form.images;
    for file in stored {
        let record = File::create(
            &mut *tx,
            CreateFile {
                name: file.name.clone(),
                size: file.size,
                mime_type: file.mime_type.clone(),
                path: file.path.clone(),
                checksum: file.checksum.clone(),
            },
        )
        .await?;
        image_ids.push(record.id);
    }

    File::attach_to_product(&mut *tx, product.id, &image_ids).await?;
    ProductCategory::link(&mut *tx, product.id, &form.categories).await?;

    tx.commit().await?;

    Ok(product.id)
}

/// Creates a product from a multipart body
///
/// Uploaded files are written before the database insert and removed again
/// if the insert fails.
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, unsupported file type, too many or too large files
/// - `403 Forbidden`: store owned by another vendor
/// - `404 Not Found`: unknown store
pub async fn create_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProductData>>)> {
    let uploads = &state.config.uploads;

    let form = storage::read_multipart(multipart, uploads).await?;
    let input = ProductForm::parse(&form)?;
    owned_store(&state, &principal, input.store_id).await?;

    let mut stored = Vec::with_capacity(form.files.len());
    for file in &form.files {
        match storage::store(&uploads.dir, file).await {
            Ok(file) => stored.push(file),
            Err(e) => {
                remove_files(&uploads.dir, stored_paths(&stored)).await;
                return Err(e.into());
            }
        }
    }

    let product_id = match insert_product(&state, input, &stored).await {
        Ok(id) => id,
        Err(e) => {
            remove_files(&uploads.dir, stored_paths(&stored)).await;
            return Err(e);
        }
    };

    info!(product_id = %product_id, files = stored.len(), created_by = %principal.id, "Product created");

    let product = product_detail(&state, product_id).await?;
    Ok(ApiResponse::created(ProductData { product }, "Product created successfully"))
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<ProductsData>>> {
    let products = Product::list_details(&state.db).await?;
    Ok(ApiResponse::ok(ProductsData { products }, "Products retrieved successfully"))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ProductData>>> {
    let product = product_detail(&state, id).await?;
    Ok(ApiResponse::ok(ProductData { product }, "Product retrieved successfully"))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<ApiResponse<ProductData>>> {
    validate(&req)?;
    if let Some(price) = &req.price {
        check_price(price)?;
    }

    let current = product_detail(&state, id).await?;
    authorize_on(&principal, Action::Update, &current)?;

    if let Some(store_id) = req.store_id {
        if current.product.store_id != Some(store_id) {
            owned_store(&state, &principal, store_id).await?;
        }
    }

    Product::update(
        &state.db,
        id,
        UpdateProduct {
            name: req.name,
            description: req.description,
            price: req.price,
            quantity: req.quantity,
            rating: req.rating,
            status: req.status,
            store_id: req.store_id,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    ProductCategory::link(&state.db, id, &req.categories).await?;

    let product = product_detail(&state, id).await?;
    Ok(ApiResponse::ok(ProductData { product }, "Product updated successfully"))
}

/// Deletes a product and removes its image files from disk
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    let product = product_detail(&state, id).await?;
    authorize_on(&principal, Action::Delete, &product)?;

    if !Product::delete(&state.db, id).await? {
        return Err(not_found());
    }

    let paths = product.images.iter().map(|image| image.path.clone()).collect();
    remove_files(&state.config.uploads.dir, paths).await;

    info!(product_id = %id, images = product.images.len(), deleted_by = %principal.id, "Product deleted");

    Ok(ApiResponse::ok(id, "Product deleted successfully"))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateProductCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProductCategoryData>>)> {
    validate(&req)?;

    if ProductCategory::find_by_name(&state.db, &req.name).await?.is_some() {
        return Err(category_exists());
    }

    let product_category = ProductCategory::create(&state.db, &req.name, req.description).await?;

    info!(category_id = %product_category.id, name = %product_category.name, "Product category created");

    Ok(ApiResponse::created(
        ProductCategoryData { product_category },
        "Product category created successfully",
    ))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<ProductCategoriesData>>> {
    let product_categories = ProductCategory::list(&state.db).await?;
    Ok(ApiResponse::ok(
        ProductCategoriesData { product_categories },
        "Product categories retrieved successfully",
    ))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ProductCategoryData>>> {
    let product_category = ProductCategory::find_by_id(&state.db, id)
        .await?
        .ok_or_else(category_not_found)?;

    Ok(ApiResponse::ok(
        ProductCategoryData { product_category },
        "Product category retrieved successfully",
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductCategoryRequest>,
) -> ApiResult<Json<ApiResponse<ProductCategoryData>>> {
    validate(&req)?;

    if let Some(name) = req.name.as_deref() {
        if let Some(existing) = ProductCategory::find_by_name(&state.db, name).await? {
            if existing.id != id {
                return Err(category_exists());
            }
        }
    }

    let product_category = ProductCategory::update(
        &state.db,
        id,
        UpdateProductCategory {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(category_not_found)?;

    Ok(ApiResponse::ok(
        ProductCategoryData { product_category },
        "Product category updated successfully",
    ))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    if !ProductCategory::delete(&state.db, id).await? {
        return Err(category_not_found());
    }

    info!(category_id = %id, "Product category deleted");

    Ok(ApiResponse::ok(id, "Product category deleted successfully"))
}
