/// User (shopper) endpoints: account, cart and orders
///
/// # Endpoints
///
/// Accounts:
/// - `POST   /api/v1/user/register`
/// - `POST   /api/v1/user/login`
/// - `GET    /api/v1/user/users`                  (read User)
/// - `GET    /api/v1/user/profile`                (any signed-in account)
/// - `GET    /api/v1/user/user/:id`               (read User)
/// - `PATCH  /api/v1/user/user/:id`               (update User, own record)
/// - `DELETE /api/v1/user/user/:id`               (delete User, own record)
/// - `GET    /api/v1/user/logout`
///
/// Cart:
/// - `PATCH  /api/v1/user/add-cart/:id`           (create Cart)
/// - `PATCH  /api/v1/user/update-cart/:id/:cartId` (update Cart)
/// - `PATCH  /api/v1/user/remove-cart/:id`        (delete Cart)
///
/// Orders:
/// - `POST   /api/v1/user/order-item`             (create OrderItem)
/// - `POST   /api/v1/user/order`                  (create Order)
/// - `GET    /api/v1/user/orders`                 (read Order)
/// - `GET    /api/v1/user/orders/:userId`         (read Order)
/// - `GET    /api/v1/user/order/:id`              (read Order)
/// - `PATCH  /api/v1/user/order/:id`              (update Order)
/// - `DELETE /api/v1/user/order/:id`              (delete Order)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use northbridge_shared::{
    auth::{
        middleware::Principal,
        policy::{Action, Field, PolicyCheck, Resource, Subject},
    },
    models::{
        cart::{Cart, CreateCart, UpdateCart},
        order::{CreateOrder, Order, OrderDetail, OrderStatus, UpdateOrder},
        order_item::{CreateOrderItem, OrderItem},
        role::Role,
        user::{CreateUser, UpdateUser, User, UserWithCart},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{
    account::{self, LoginRequest, RegisterRequest, UpdateAccountRequest},
    authorize_on, authorize_resource,
};
use crate::{
    app::{authenticated, guarded, AppState},
    error::{ApiError, ApiResult},
    response::ApiResponse,
    session,
    validation::{normalize_email, validate},
};

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserWithCart,
}

#[derive(Debug, Serialize)]
pub struct UsersData {
    pub users: Vec<UserWithCart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemData {
    pub order_item: OrderItem,
}

#[derive(Debug, Serialize)]
pub struct OrderData {
    pub order: OrderDetail,
}

#[derive(Debug, Serialize)]
pub struct OrdersData {
    pub orders: Vec<OrderDetail>,
}

/// A cart line to add
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCartRequest {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: Option<Uuid>,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartRequest {
    pub cart_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

/// New order; `userId` defaults to the signed-in account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub reference: Option<String>,

    #[serde(default)]
    pub order_items: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub reference: Option<String>,

    #[serde(default)]
    pub order_items: Vec<Uuid>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/users", guarded(state, &[PolicyCheck::READ_USER], get(list_users)))
        .route("/profile", authenticated(state, get(profile)))
        .route("/user/:id", guarded(state, &[PolicyCheck::READ_USER], get(get_user)))
        .route("/user/:id", guarded(state, &[PolicyCheck::UPDATE_USER], patch(update_user)))
        .route("/user/:id", guarded(state, &[PolicyCheck::DELETE_USER], delete(delete_user)))
        .route("/add-cart/:id", guarded(state, &[PolicyCheck::CREATE_CART], patch(add_cart)))
        .route(
            "/update-cart/:id/:cart_id",
            guarded(state, &[PolicyCheck::UPDATE_CART], patch(update_cart)),
        )
        .route("/remove-cart/:id", guarded(state, &[PolicyCheck::DELETE_CART], patch(remove_cart)))
        .route(
            "/order-item",
            guarded(state, &[PolicyCheck::CREATE_ORDER_ITEM], post(create_order_item)),
        )
        .route("/order", guarded(state, &[PolicyCheck::CREATE_ORDER], post(create_order)))
        .route("/orders", guarded(state, &[PolicyCheck::READ_ORDER], get(list_orders)))
        .route("/orders/:user_id", guarded(state, &[PolicyCheck::READ_ORDER], get(user_orders)))
        .route("/order/:id", guarded(state, &[PolicyCheck::READ_ORDER], get(get_order)))
        .route("/order/:id", guarded(state, &[PolicyCheck::UPDATE_ORDER], patch(update_order)))
        .route("/order/:id", guarded(state, &[PolicyCheck::DELETE_ORDER], delete(delete_order)))
}

fn not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

fn cart_item_not_found() -> ApiError {
    ApiError::NotFound("Cart item not found".to_string())
}

fn order_not_found() -> ApiError {
    ApiError::NotFound("Order not found".to_string())
}

/// Cart lines and orders are owned through `user_id`
fn owned_by(subject: Subject, user_id: Uuid) -> Resource {
    Resource::new(subject).with(Field::UserId, Some(user_id))
}

async fn user_with_cart(state: &AppState, id: Uuid) -> ApiResult<UserWithCart> {
    User::find_with_cart(&state.db, id).await?.ok_or_else(not_found)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    if User::email_exists(&state.db, &email).await? {
        return Err(account::email_taken());
    }

    let password_hash = account::new_password_hash(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
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

    info!(user_id = %user.id, "User registered");

    let session = session::issue(&state, user.id, &user.email, Role::User)?;
    Ok(account::session_response(StatusCode::CREATED, session, "User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    validate(&req)?;

    let email = normalize_email(&req.email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| account::no_account(Role::User, &email))?;

    account::verify_login(&req.password, &user.password_hash)?;

    info!(user_id = %user.id, "User logged in");

    let session = session::issue(&state, user.id, &user.email, Role::User)?;
    Ok(account::session_response(StatusCode::OK, session, "User logged in successfully"))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<UsersData>>> {
    let users = User::list_with_cart(&state.db).await?;
    Ok(ApiResponse::ok(UsersData { users }, "Users fetched successfully"))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    let user = user_with_cart(&state, principal.id).await?;
    Ok(ApiResponse::ok(UserData { user }, "User profile fetched successfully"))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    let user = user_with_cart(&state, id).await?;
    Ok(ApiResponse::ok(UserData { user }, "User fetched successfully"))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    validate(&req)?;

    let current = User::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Update, &current)?;
    account::ensure_email_unchanged(&current.email, req.email.as_deref())?;

    let password_hash = account::optional_password_hash(req.password.as_deref())?;

    User::update(
        &state.db,
        id,
        UpdateUser {
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

    let user = user_with_cart(&state, id).await?;
    Ok(ApiResponse::ok(UserData { user }, "User updated successfully"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let user = User::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    authorize_on(&principal, Action::Delete, &user)?;

    if !User::delete(&state.db, id).await? {
        return Err(not_found());
    }

    info!(user_id = %id, deleted_by = %principal.id, "User deleted");

    Ok(account::deleted_response(&state, id, "User deleted successfully"))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    account::logout_response(&state, "User logged out successfully")
}

/// Adds a cart line to user `id` and returns the user with its cart
pub async fn add_cart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCartRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    validate(&req)?;
    authorize_resource(&principal, Action::Create, &owned_by(Subject::Cart, id))?;

    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    Cart::create(
        &state.db,
        CreateCart {
            user_id: id,
            product_id: req.product_id,
            quantity: req.quantity,
            price: req.price,
        },
    )
    .await?;

    let user = user_with_cart(&state, id).await?;
    Ok(ApiResponse::ok(UserData { user }, "Cart added successfully"))
}

pub async fn update_cart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, cart_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateCartRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    validate(&req)?;

    let line = Cart::find_for_user(&state.db, id, cart_id)
        .await?
        .ok_or_else(cart_item_not_found)?;
    authorize_on(&principal, Action::Update, &line)?;

    Cart::update(
        &state.db,
        cart_id,
        UpdateCart {
            product_id: req.product_id,
            quantity: req.quantity,
            price: req.price,
        },
    )
    .await?
    .ok_or_else(cart_item_not_found)?;

    let user = user_with_cart(&state, id).await?;
    Ok(ApiResponse::ok(UserData { user }, "Cart updated successfully"))
}

pub async fn remove_cart(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveCartRequest>,
) -> ApiResult<Json<ApiResponse<UserData>>> {
    let line = Cart::find_for_user(&state.db, id, req.cart_id)
        .await?
        .ok_or_else(cart_item_not_found)?;
    authorize_on(&principal, Action::Delete, &line)?;

    if !Cart::delete(&state.db, line.id).await? {
        return Err(cart_item_not_found());
    }

    let user = user_with_cart(&state, id).await?;
    Ok(ApiResponse::ok(UserData { user }, "Cart removed successfully"))
}

pub async fn create_order_item(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderItemRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrderItemData>>)> {
    validate(&req)?;

    let order_item = OrderItem::create(
        &state.db,
        CreateOrderItem {
            product_id: req.product_id,
            quantity: req.quantity,
            price: req.price,
        },
    )
    .await?;

    Ok(ApiResponse::created(OrderItemData { order_item }, "Order item created successfully"))
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrderData>>)> {
    let user_id = req.user_id.unwrap_or(principal.id);
    authorize_resource(&principal, Action::Create, &owned_by(Subject::Order, user_id))?;

    let order = Order::create(
        &state.db,
        CreateOrder {
            user_id,
            status: req.status,
            reference: req.reference,
            item_ids: req.order_items,
        },
    )
    .await?;

    info!(order_id = %order.order.id, user_id = %user_id, items = order.items.len(), "Order created");

    Ok(ApiResponse::created(OrderData { order }, "Order created successfully"))
}

/// Admins see every order, everyone else their own
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ApiResponse<OrdersData>>> {
    let orders = if principal.is_admin() {
        Order::list_details(&state.db).await?
    } else {
        Order::list_details_for_user(&state.db, principal.id).await?
    };

    Ok(ApiResponse::ok(OrdersData { orders }, "Orders fetched successfully"))
}

pub async fn user_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrdersData>>> {
    authorize_resource(&principal, Action::Read, &owned_by(Subject::Order, user_id))?;

    let orders = Order::list_details_for_user(&state.db, user_id).await?;
    Ok(ApiResponse::ok(OrdersData { orders }, "Orders fetched successfully"))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderData>>> {
    let order = Order::find_detail(&state.db, id).await?.ok_or_else(order_not_found)?;
    authorize_on(&principal, Action::Read, &order)?;

    Ok(ApiResponse::ok(OrderData { order }, "Order fetched successfully"))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> ApiResult<Json<ApiResponse<OrderData>>> {
    let current = Order::find_by_id(&state.db, id).await?.ok_or_else(order_not_found)?;
    authorize_on(&principal, Action::Update, &current)?;

    let order = Order::update(
        &state.db,
        id,
        UpdateOrder {
            status: req.status,
            reference: req.reference,
            item_ids: req.order_items,
        },
    )
    .await?
    .ok_or_else(order_not_found)?;

    Ok(ApiResponse::ok(OrderData { order }, "Order updated successfully"))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    let order = Order::find_by_id(&state.db, id).await?.ok_or_else(order_not_found)?;
    authorize_on(&principal, Action::Delete, &order)?;

    if !Order::delete(&state.db, id).await? {
        return Err(order_not_found());
    }

    info!(order_id = %id, deleted_by = %principal.id, "Order deleted");

    Ok(ApiResponse::ok(id, "Order deleted successfully"))
}
