/// Database models for NorthBridge
///
/// Each model is a `sqlx::FromRow` struct with associated async query
/// functions taking a `PgPool` (or any `PgExecutor` where the call may run
/// inside a transaction). JSON output is camelCase; password hashes are
/// never serialized.
///
/// # Models
///
/// - `role`: account role enum shared by all account tables
/// - `admin`, `user`, `vendor`: accounts
/// - `store`, `store_category`: vendor stores and their categories
/// - `product`, `product_category`, `file`: catalog and uploaded images
/// - `cart`, `order`, `order_item`: shopping
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::models::user::{CreateUser, User};
/// use northbridge_shared::db::pool::{create_pool, PoolConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(PoolConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     user_name: "user".to_string(),
///     first_name: None,
///     last_name: None,
///     other_name: None,
///     phone: "+2348012345678".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_active: None,
///     is_email_verified: None,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod admin;
pub mod cart;
pub mod file;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod role;
pub mod store;
pub mod store_category;
pub mod user;
pub mod vendor;
