/// Integration tests for stores, products, carts and orders
///
/// They need `DATABASE_URL` to point at a PostgreSQL database.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

/// Smallest valid PNG header; content is never decoded
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

#[tokio::test]
async fn test_store_ownership() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register("vendor", "owner").await;
    let rival = ctx.register("vendor", "rival").await;
    let user = ctx.register("user", "shopper").await;

    let store = ctx.create_store(&owner, "Owner Store").await;
    let store_id = store["id"].as_str().unwrap().to_string();
    assert_eq!(store["vendorId"], owner.id.to_string());

    let create_for_owner = json!({
        "name": "Hijack",
        "about": "Not mine",
        "phone": "+2348030000002",
        "address": "2 Market Road",
        "location": "Abuja",
        "vendorId": owner.id
    });

    // A vendor cannot open a store for someone else
    let response = ctx
        .post("/api/v1/store/create", create_for_owner.clone(), Some(&rival.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Shoppers cannot create stores at all
    let response = ctx
        .post("/api/v1/store/create", create_for_owner, Some(&user.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let mut unknown_vendor = json!({
        "name": "Ghost",
        "about": "Nobody",
        "phone": "+2348030000003",
        "address": "3 Market Road",
        "location": "Kano",
    });
    unknown_vendor["vendorId"] = json!(Uuid::new_v4());
    let response = ctx
        .post("/api/v1/store/create", unknown_vendor, Some(&owner.cookie))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/store/{}", store_id);

    let response = ctx
        .patch(&uri, json!({ "about": "Taken over" }), Some(&rival.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .patch(&uri, json!({ "about": "Fresh produce" }), Some(&owner.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["store"]["about"], "Fresh produce");

    let response = ctx.delete(&uri, Some(&rival.cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.delete(&uri, Some(&owner.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], store_id);

    let response = ctx.get(&uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Store not found");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_store_categories() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    let store = ctx.create_store(&vendor, "Seller Store").await;
    let store_id = store["id"].as_str().unwrap().to_string();

    let name = ctx.category_name("Groceries");
    let response = ctx
        .post(
            "/api/v1/store/create-category",
            json!({ "name": name, "storeId": store_id }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let category = response.body["data"]["storeCategory"].clone();
    assert_eq!(category["name"], name.to_lowercase());

    // Names are compared case-insensitively
    let response = ctx
        .post(
            "/api/v1/store/create-category",
            json!({ "name": name.to_uppercase() }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Store Category already Exist");

    let response = ctx.get(&format!("/api/v1/store/{}", store_id), None).await;
    assert_eq!(response.body["data"]["store"]["categories"][0]["id"], category["id"]);

    let response = ctx
        .patch(
            &format!("/api/v1/store/remove-category/{}", store_id),
            json!({ "categoryId": category["id"] }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["store"]["categories"], json!([]));

    let response = ctx
        .patch(
            &format!("/api/v1/store/add-category/{}", store_id),
            json!({ "categoryId": Uuid::new_v4() }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Store category not found");

    let category_uri = format!("/api/v1/store/category/{}", category["id"].as_str().unwrap());
    let response = ctx.delete(&category_uri, Some(&vendor.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = ctx.get(&category_uri, Some(&vendor.cookie)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_product_upload_and_delete() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    let store = ctx.create_store(&vendor, "Seller Store").await;
    let store_id = store["id"].as_str().unwrap().to_string();

    let category = ctx.category_name("Shoes");
    let response = ctx
        .post(
            "/api/v1/product/create-category",
            json!({ "name": category }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let category_id = response.body["data"]["productCategory"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let fields = vec![
        ("name", "Sneakers".to_string()),
        ("description", "Running shoes".to_string()),
        ("price", r#"{"amount":"49.99","currency":"USD"}"#.to_string()),
        ("quantity", "10".to_string()),
        ("storeId", store_id.clone()),
        ("categories[]", category_id.clone()),
    ];

    let response = ctx
        .multipart(
            "/api/v1/product/create",
            &fields,
            &[("front-view.png", "image/png", PNG.to_vec())],
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

    let product = response.body["data"]["product"].clone();
    assert_eq!(product["price"]["currency"], "USD");
    assert_eq!(product["storeId"], store_id);
    assert_eq!(product["categories"][0]["id"], category_id);

    let image_path = product["images"][0]["path"].as_str().unwrap().to_string();
    assert!(image_path.starts_with("products/front-view-"));
    assert!(image_path.ends_with(".png"));
    assert!(ctx.uploads_dir().join(&image_path).exists());

    // Only JPEG and PNG are accepted
    let response = ctx
        .multipart(
            "/api/v1/product/create",
            &fields,
            &[("notes.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "File not supported");

    // Another vendor cannot stock this store
    let rival = ctx.register("vendor", "rival").await;
    let response = ctx
        .multipart("/api/v1/product/create", &fields, &[], Some(&rival.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let product_uri = format!("/api/v1/product/product/{}", product["id"].as_str().unwrap());

    let response = ctx
        .patch(&product_uri, json!({ "quantity": 3 }), Some(&rival.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .patch(
            &product_uri,
            json!({ "price": { "amount": "-2", "currency": "USD" } }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "price amount must be a positive number");

    let response = ctx
        .patch(&product_uri, json!({ "quantity": 3, "status": "DRAFT" }), Some(&vendor.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["product"]["quantity"], 3);
    assert_eq!(response.body["data"]["product"]["status"], "DRAFT");

    let response = ctx.delete(&product_uri, Some(&vendor.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!ctx.uploads_dir().join(&image_path).exists());

    let response = ctx.get(&product_uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Product not found");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_images_stay_with_their_product() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register("vendor", "owner").await;
    let owner_store = ctx.create_store(&owner, "Owner Store").await;

    let owner_fields = vec![
        ("name", "Mug".to_string()),
        ("description", "Stoneware mug".to_string()),
        ("price", r#"{"amount":"12","currency":"USD"}"#.to_string()),
        ("quantity", "4".to_string()),
        ("storeId", owner_store["id"].as_str().unwrap().to_string()),
    ];
    let response = ctx
        .multipart(
            "/api/v1/product/create",
            &owner_fields,
            &[("mug.png", "image/png", PNG.to_vec())],
            Some(&owner.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let owner_product = response.body["data"]["product"].clone();
    let image_id = owner_product["images"][0]["id"].as_str().unwrap().to_string();
    let image_path = owner_product["images"][0]["path"].as_str().unwrap().to_string();

    // Referencing another product's image does not move it
    let rival = ctx.register("vendor", "rival").await;
    let rival_store = ctx.create_store(&rival, "Rival Store").await;
    let rival_fields = vec![
        ("name", "Cup".to_string()),
        ("description", "Plain cup".to_string()),
        ("price", r#"{"amount":"3","currency":"USD"}"#.to_string()),
        ("quantity", "1".to_string()),
        ("storeId", rival_store["id"].as_str().unwrap().to_string()),
        ("images[]", image_id.clone()),
    ];
    let response = ctx
        .multipart("/api/v1/product/create", &rival_fields, &[], Some(&rival.cookie))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let rival_product = response.body["data"]["product"].clone();
    assert_eq!(rival_product["images"].as_array().unwrap().len(), 0);

    let owner_uri = format!("/api/v1/product/product/{}", owner_product["id"].as_str().unwrap());
    let response = ctx.get(&owner_uri, None).await;
    assert_eq!(response.body["data"]["product"]["images"][0]["id"], image_id);

    let rival_uri = format!("/api/v1/product/product/{}", rival_product["id"].as_str().unwrap());
    let response = ctx.delete(&rival_uri, Some(&rival.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(ctx.uploads_dir().join(&image_path).exists());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_move_products_between_stores() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    let first = ctx.create_store(&vendor, "First").await;
    let second = ctx.create_store(&vendor, "Second").await;
    let first_id = first["id"].as_str().unwrap().to_string();
    let second_id = second["id"].as_str().unwrap().to_string();

    let product = ctx.create_product(&vendor, &first_id, "Lamp").await;
    let product_id = product["id"].as_str().unwrap().to_string();

    // Detaching only works from the store the product is in
    let response = ctx
        .patch(
            &format!("/api/v1/store/remove-product/{}", second_id),
            json!({ "productId": product_id }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx
        .patch(
            &format!("/api/v1/store/remove-product/{}", first_id),
            json!({ "productId": product_id }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["store"]["products"], json!([]));

    let response = ctx
        .patch(
            &format!("/api/v1/store/add-product/{}", second_id),
            json!({ "productId": product_id }),
            Some(&vendor.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["store"]["products"][0]["id"], product_id);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    let store = ctx.create_store(&vendor, "Seller Store").await;
    let product = ctx
        .create_product(&vendor, store["id"].as_str().unwrap(), "Kettle")
        .await;

    let user = ctx.register("user", "shopper").await;
    let other = ctx.register("user", "neighbour").await;

    let add_uri = format!("/api/v1/user/add-cart/{}", user.id);
    let line = json!({ "productId": product["id"], "quantity": 2, "price": 49.99 });

    let response = ctx.patch(&add_uri, line.clone(), Some(&other.cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.patch(&add_uri, line, Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let cart = response.body["data"]["user"]["cart"].clone();
    assert_eq!(cart.as_array().unwrap().len(), 1);
    let cart_id = cart[0]["id"].as_str().unwrap().to_string();

    let response = ctx
        .patch(
            &format!("/api/v1/user/update-cart/{}/{}", user.id, cart_id),
            json!({ "quantity": 5 }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["cart"][0]["quantity"], 5);

    let response = ctx
        .patch(
            &format!("/api/v1/user/update-cart/{}/{}", user.id, Uuid::new_v4()),
            json!({ "quantity": 1 }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Cart item not found");

    let response = ctx
        .patch(
            &format!("/api/v1/user/remove-cart/{}", user.id),
            json!({ "cartId": cart_id }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["cart"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_orders() {
    let ctx = TestContext::new().await.unwrap();
    let vendor = ctx.register("vendor", "seller").await;
    let store = ctx.create_store(&vendor, "Seller Store").await;
    let product = ctx
        .create_product(&vendor, store["id"].as_str().unwrap(), "Blender")
        .await;

    let user = ctx.register("user", "shopper").await;
    let other = ctx.register("user", "neighbour").await;
    let admin = ctx.register("admin", "ops").await;

    let response = ctx
        .post(
            "/api/v1/user/order-item",
            json!({ "productId": product["id"], "quantity": 1, "price": 49.99 }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let item_id = response.body["data"]["orderItem"]["id"].clone();

    // Orders cannot be placed for someone else
    let response = ctx
        .post(
            "/api/v1/user/order",
            json!({ "userId": user.id, "orderItems": [item_id] }),
            Some(&other.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .post(
            "/api/v1/user/order",
            json!({ "orderItems": [item_id], "reference": "ref-001" }),
            Some(&user.cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let order = response.body["data"]["order"].clone();
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["items"][0]["id"], item_id);
    let order_uri = format!("/api/v1/user/order/{}", order["id"].as_str().unwrap());

    let response = ctx.get(&order_uri, Some(&other.cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.get("/api/v1/user/orders", Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["orders"].as_array().unwrap().len(), 1);

    let response = ctx.get("/api/v1/user/orders", Some(&other.cookie)).await;
    assert_eq!(response.body["data"]["orders"], json!([]));

    let response = ctx
        .get(&format!("/api/v1/user/orders/{}", user.id), Some(&other.cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx
        .patch(&order_uri, json!({ "status": "COMPLETED" }), Some(&admin.cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["order"]["status"], "COMPLETED");

    let response = ctx.delete(&order_uri, Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = ctx.get(&order_uri, Some(&user.cookie)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Order not found");

    ctx.cleanup().await.unwrap();
}
