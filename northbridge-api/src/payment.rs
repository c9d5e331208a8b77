/// Payment gateway proxy
///
/// The payment routes forward to Paystack's transaction API and return its
/// JSON verbatim. The gateway sits behind the [`PaymentGateway`] trait so the
/// application state can hold a test double.
///
/// | Operation      | Paystack call                          |
/// |----------------|----------------------------------------|
/// | initialize     | `POST /transaction/initialize`         |
/// | verify         | `GET /transaction/verify/{reference}`  |
/// | transactions   | `GET /transaction`                     |
///
/// Amounts are sent in the currency's subunit (`amount * 100`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PaymentConfig;

/// Message used when the gateway gives no usable error message
pub const GENERIC_GATEWAY_ERROR: &str = "An Error Occured";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The gateway answered with a non-2xx status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The gateway could not be reached or answered with garbage
    #[error("An Error Occured")]
    Unavailable(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Unavailable(err.to_string())
    }
}

/// Body of `POST /transaction/initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Amount in the subunit of `currency`
    pub amount: i64,
    pub currency: String,
}

impl InitializeTransaction {
    /// Builds the request, converting a major-unit amount to subunits
    pub fn new(email: impl Into<String>, amount: f64, currency: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            amount: to_subunit(amount),
            currency: currency.into(),
        }
    }
}

/// `12.5` -> `1250`
pub fn to_subunit(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &InitializeTransaction) -> Result<Value, PaymentError>;

    async fn verify(&self, reference: &str) -> Result<Value, PaymentError>;

    async fn transactions(&self) -> Result<Value, PaymentError>;
}

/// Paystack HTTP client
#[derive(Debug, Clone)]
pub struct PaystackClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The reference is a single path segment
    fn verify_url(&self, reference: &str) -> String {
        self.url(&format!("/transaction/verify/{}", urlencoding::encode(reference)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, PaymentError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = gateway_message(&body);
            warn!(status = status.as_u16(), "Payment gateway rejected request: {}", message);
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

/// The gateway's own `message`, or the generic fallback
pub fn gateway_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(GENERIC_GATEWAY_ERROR)
        .to_string()
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: &InitializeTransaction) -> Result<Value, PaymentError> {
        debug!(email = %request.email, amount = request.amount, currency = %request.currency, "Initializing transaction");
        self.send(self.http.post(self.url("/transaction/initialize")).json(request))
            .await
    }

    async fn verify(&self, reference: &str) -> Result<Value, PaymentError> {
        debug!(reference = %reference, "Verifying transaction");
        self.send(self.http.get(self.verify_url(reference))).await
    }

    async fn transactions(&self) -> Result<Value, PaymentError> {
        self.send(self.http.get(self.url("/transaction"))).await
    }
}
