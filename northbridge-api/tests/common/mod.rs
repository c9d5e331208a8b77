//! Common test utilities for integration tests
//!
//! - Database setup from `DATABASE_URL` (migrations are applied)
//! - A scratch upload directory per context
//! - A recording payment gateway in place of Paystack
//! - Request helpers that keep the `access_token` cookie
//! - Account fixtures registered through the API
//!
//! Every email and category name carries the context's run id so tests can
//! share one database; [`TestContext::cleanup`] deletes what the run created.

#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use northbridge_api::{
    app::{build_router, AppState},
    config::Config,
    payment::{InitializeTransaction, PaymentError, PaymentGateway},
};
use northbridge_shared::db::migrations::run_migrations;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

pub const PASSWORD: &str = "Str0ng!Passw0rd";

const TEST_JWT_SECRET: &str = "integration-test-secret-with-at-least-32-chars";

/// Gateway double that records calls and answers like Paystack
#[derive(Default)]
pub struct MockGateway {
    pub calls: Mutex<Vec<String>>,
    pub fail_with: Option<String>,
}

impl MockGateway {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    fn record(&self, call: String) -> Result<(), PaymentError> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(message) => Err(PaymentError::Rejected {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize(&self, request: &InitializeTransaction) -> Result<Value, PaymentError> {
        self.record(format!(
            "initialize {} {} {}",
            request.email, request.amount, request.currency
        ))?;
        Ok(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/test",
                "access_code": "test-access-code",
                "reference": "test-reference"
            }
        }))
    }

    async fn verify(&self, reference: &str) -> Result<Value, PaymentError> {
        self.record(format!("verify {}", reference))?;
        Ok(json!({
            "status": true,
            "message": "Verification successful",
            "data": { "reference": reference, "status": "success" }
        }))
    }

    async fn transactions(&self) -> Result<Value, PaymentError> {
        self.record("transactions".to_string())?;
        Ok(json!({ "status": true, "message": "Transactions retrieved", "data": [] }))
    }
}

/// A decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `access_token=...` from the `Set-Cookie` header, ready for a `Cookie` header
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
    }

    pub fn set_cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

/// A registered account and its session cookie
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub cookie: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    pub gateway: Arc<MockGateway>,
    pub run_id: String,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_gateway(MockGateway::default()).await
    }

    pub async fn with_gateway(gateway: MockGateway) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let run_id = Uuid::new_v4().simple().to_string()[..12].to_string();
        let uploads_dir = std::env::temp_dir().join(format!("northbridge-test-{}", run_id));

        // Only DATABASE_URL has to come from the environment
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
            "UPLOADS_DIR" => Some(uploads_dir.display().to_string()),
            "NODE_ENV" | "APP_ENV" => Some("test".to_string()),
            other => std::env::var(other).ok(),
        })?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let gateway = Arc::new(gateway);
        let state = AppState::with_gateway(db.clone(), config.clone(), gateway.clone());
        let app = build_router(state);

        Ok(Self {
            db,
            app,
            config,
            gateway,
            run_id,
        })
    }

    /// An address unique to this run
    pub fn email(&self, name: &str) -> String {
        format!("{}@{}.northbridge.test", name, self.run_id)
    }

    /// A category name unique to this run
    pub fn category_name(&self, name: &str) -> String {
        format!("{}-{}", name, self.run_id)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.config.uploads.dir.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a JSON request, with the session cookie when given
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn patch(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Sends a multipart body built from text fields and `(name, mime, bytes)` files
    pub async fn multipart(
        &self,
        uri: &str,
        fields: &[(&str, String)],
        files: &[(&str, &str, Vec<u8>)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let boundary = format!("northbridge-{}", self.run_id);
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        for (file_name, mime, bytes) in files {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                    file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Registers an account under `/api/v1/{role}/register`
    pub async fn register(&self, role: &str, name: &str) -> Account {
        let email = self.email(name);
        let mut body = json!({
            "email": email,
            "password": PASSWORD,
            "userName": name,
            "phone": "+2348030000000"
        });
        if role == "vendor" {
            body["name"] = json!(format!("{} store", name));
            body["firstName"] = json!("Ada");
            body["lastName"] = json!("Obi");
        }

        let response = self
            .post(&format!("/api/v1/{}/register", role), body, None)
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "register {} failed: {}",
            role,
            response.body
        );

        let cookie = response.cookie().expect("register sets a cookie");
        let id = self.account_id(role, &email).await;

        Account { id, email, cookie }
    }

    async fn account_id(&self, role: &str, email: &str) -> Uuid {
        let table = match role {
            "admin" => "admins",
            "vendor" => "vendors",
            _ => "users",
        };
        let (id,): (Uuid,) = sqlx::query_as(&format!("SELECT id FROM {} WHERE email = $1", table))
            .bind(email)
            .fetch_one(&self.db)
            .await
            .unwrap();
        id
    }

    /// Creates a store for `vendor` through the API
    pub async fn create_store(&self, vendor: &Account, name: &str) -> Value {
        let response = self
            .post(
                "/api/v1/store/create",
                json!({
                    "name": name,
                    "about": "Test store",
                    "phone": "+2348030000001",
                    "address": "1 Market Road",
                    "location": "Lagos",
                    "vendorId": vendor.id
                }),
                Some(&vendor.cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["store"].clone()
    }

    /// Creates a product without images in `store_id`
    pub async fn create_product(&self, account: &Account, store_id: &str, name: &str) -> Value {
        let response = self
            .multipart(
                "/api/v1/product/create",
                &[
                    ("name", name.to_string()),
                    ("description", "A test product".to_string()),
                    ("price[amount]", "49.99".to_string()),
                    ("price[currency]", "USD".to_string()),
                    ("quantity", "5".to_string()),
                    ("storeId", store_id.to_string()),
                ],
                &[],
                Some(&account.cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["product"].clone()
    }

    /// Deletes everything this run created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let pattern = format!("%@{}.northbridge.test", self.run_id);
        let names = format!("%-{}", self.run_id);

        // Stores, products, carts and orders cascade from their accounts
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM vendors WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM admins WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM store_categories WHERE name LIKE $1")
            .bind(&names)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM product_categories WHERE name LIKE $1")
            .bind(&names)
            .execute(&self.db)
            .await?;

        if self.config.uploads.dir.exists() {
            tokio::fs::remove_dir_all(&self.config.uploads.dir).await?;
        }

        Ok(())
    }
}
