/// Payment endpoints
///
/// Every route requires a signed-in account. Gateway responses are passed
/// through unchanged.
///
/// # Initialize
///
/// ```text
/// POST /api/v1/payment/initialize
///
/// { "amount": 2500, "currency": "NGN", "email": "buyer@example.com" }
/// ```
///
/// ```json
/// {
///   "status": true,
///   "message": "Authorization URL created",
///   "data": { "authorization_url": "https://checkout.paystack.com/...", "access_code": "...", "reference": "..." }
/// }
/// ```

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use northbridge_shared::auth::middleware::Principal;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::{
    app::{authenticated, AppState},
    error::ApiResult,
    payment::InitializeTransaction,
    validation::validate,
};

/// Largest amount, in major units, accepted for one transaction
pub const MAX_AMOUNT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitializePaymentRequest {
    #[validate(range(min = 0.0, max = 1_000_000.0, message = "amount must not be greater than 1000000"))]
    pub amount: f64,

    #[validate(length(equal = 3, message = "currency must be exactly 3 characters"))]
    pub currency: String,

    #[validate(email(message = "email must be an email"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "reference should not be empty"))]
    pub reference: String,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/initialize", authenticated(state, post(initialize)))
        .route("/verify", authenticated(state, post(verify)))
        .route("/transactions", authenticated(state, get(transactions)))
}

pub async fn initialize(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<InitializePaymentRequest>,
) -> ApiResult<Json<Value>> {
    validate(&req)?;

    let request = InitializeTransaction::new(req.email, req.amount, req.currency);
    let response = state.payments.initialize(&request).await?;

    info!(account_id = %principal.id, amount = request.amount, currency = %request.currency, "Payment initialized");

    Ok(Json(response))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<Value>> {
    validate(&req)?;
    Ok(Json(state.payments.verify(req.reference.trim()).await?))
}

pub async fn transactions(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(state.payments.transactions().await?))
}
