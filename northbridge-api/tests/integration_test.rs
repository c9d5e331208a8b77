/// Integration tests for the NorthBridge API
///
/// These tests drive the full router against a real database:
/// - Registration, login and the `access_token` cookie
/// - Authentication and policy guards
/// - Account updates, deletion and logout
/// - The payment proxy against a recording gateway
///
/// They need `DATABASE_URL` to point at a PostgreSQL database.

mod common;

use axum::http::StatusCode;
use common::{MockGateway, TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_welcome_and_health() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/api/v1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["message"],
        format!("welcome to {} {}", ctx.config.app.name, ctx.config.app.version)
    );

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");

    // Security headers are set on every response
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_sets_http_only_cookie() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/api/v1/user/register",
            json!({
                "email": ctx.email("Shopper").to_uppercase(),
                "password": PASSWORD,
                "userName": "shopper",
                "phone": "+2348030000000"
            }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["success"], true);

    let token = response.body["data"]["access_token"].as_str().unwrap();
    let set_cookie = response.set_cookie();
    assert!(set_cookie.starts_with(&format!("access_token={}", token)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));

    // Stored lowercased
    let (email,): (String,) = sqlx::query_as("SELECT email FROM users WHERE email = $1")
        .bind(ctx.email("shopper"))
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(email, ctx.email("shopper"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_email_and_weak_password() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.register("admin", "ops").await;

    let response = ctx
        .post(
            "/api/v1/admin/register",
            json!({
                "email": admin.email,
                "password": PASSWORD,
                "userName": "ops2",
                "phone": "+2348030000000"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Email Already Exist");
    assert_eq!(response.body["statusCode"], 409);

    let response = ctx
        .post(
            "/api/v1/admin/register",
            json!({
                "email": ctx.email("weak"),
                "password": "short",
                "userName": "weak",
                "phone": "+2348030000000"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/api/v1/admin/register",
            json!({
                "email": "not-an-email",
                "password": PASSWORD,
                "userName": "bad",
                "phone": "+2348030000000"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(response.body["details"][0]["field"], "email");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_login_errors_and_success() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;

    let unknown = ctx.email("nobody");
    let response = ctx
        .post(
            "/api/v1/vendor/login",
            json!({ "email": unknown, "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body["message"],
        format!("No account found for vendor with email {}", unknown)
    );

    let response = ctx
        .post(
            "/api/v1/vendor/login",
            json!({ "email": vendor.email, "password": "Wr0ng!Password" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid email or password");

    let response = ctx
        .post(
            "/api/v1/vendor/login",
            json!({ "email": vendor.email.to_uppercase(), "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.cookie().unwrap().starts_with("access_token="));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_guards_require_cookie_and_policy() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("user", "shopper").await;
    let admin = ctx.register("admin", "ops").await;

    let response = ctx.get("/api/v1/admin/admins", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx.get("/api/v1/admin/admins", Some("access_token=garbage")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx.get("/api/v1/admin/admins", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");

    let response = ctx.get("/api/v1/admin/admins", Some(&admin.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["admins"].is_array());

    let response = ctx.get("/api/v1/admin/profile", Some(&admin.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["admin"]["email"], admin.email);
    assert!(response.body["data"]["admin"].get("passwordHash").is_none());

    // A user token whose account is gone no longer authenticates
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    let response = ctx.get("/api/v1/user/profile", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_user_profile_and_updates() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("user", "shopper").await;
    let other = ctx.register("user", "neighbour").await;

    let response = ctx.get("/api/v1/user/profile", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["id"], user.id.to_string());
    assert!(response.body["data"]["user"]["cart"].is_array());

    let uri = format!("/api/v1/user/user/{}", user.id);

    let response = ctx
        .patch(&uri, json!({ "firstName": "Ada" }), Some(&user.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["firstName"], "Ada");

    let response = ctx
        .patch(&uri, json!({ "email": ctx.email("changed") }), Some(&user.cookie))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Email cannot be changed");

    // Users may only change their own record
    let response = ctx
        .patch(&uri, json!({ "firstName": "Eve" }), Some(&other.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .patch(
            &format!("/api/v1/user/user/{}", uuid::Uuid::new_v4()),
            json!({ "firstName": "Nobody" }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_logout_and_delete_clear_cookie() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("user", "leaving").await;

    let response = ctx.get("/api/v1/user/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], true);
    assert!(response.set_cookie().starts_with("access_token=;"));
    assert!(response.set_cookie().contains("Max-Age=1"));

    let response = ctx
        .delete(&format!("/api/v1/user/user/{}", user.id), Some(&user.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], user.id.to_string());
    assert!(response.set_cookie().contains("Max-Age=1"));

    let response = ctx
        .post(
            "/api/v1/user/login",
            json!({ "email": user.email, "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_vendor_listing_is_public() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    ctx.create_store(&vendor, "Seller Store").await;

    let response = ctx
        .get(&format!("/api/v1/vendor/vendor/{}", vendor.id), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["vendor"]["name"], "seller store");
    assert_eq!(response.body["data"]["vendor"]["stores"][0]["name"], "Seller Store");

    let response = ctx.get("/api/v1/vendor/profile", Some(&vendor.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_payment_proxy() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register("user", "buyer").await;

    let body = json!({ "amount": 25.5, "currency": "NGN", "email": user.email });

    let response = ctx.post("/api/v1/payment/initialize", body.clone(), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx
        .post("/api/v1/payment/initialize", body, Some(&user.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["reference"], "test-reference");

    let response = ctx
        .post(
            "/api/v1/payment/initialize",
            json!({ "amount": 2_000_000, "currency": "NGN", "email": user.email }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/api/v1/payment/verify",
            json!({ "reference": "test-reference" }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "success");

    let response = ctx.get("/api/v1/payment/transactions", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let calls = ctx.gateway.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            format!("initialize {} 2550 NGN", user.email),
            "verify test-reference".to_string(),
            "transactions".to_string(),
        ]
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_payment_gateway_errors_are_bad_requests() {
    let ctx = TestContext::with_gateway(MockGateway::failing("Invalid key"))
        .await
        .unwrap();
    let user = ctx.register("user", "buyer").await;

    let response = ctx.get("/api/v1/payment/transactions", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid key");

    ctx.cleanup().await.unwrap();
}
