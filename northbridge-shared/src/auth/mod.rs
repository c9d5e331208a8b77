/// Authentication and authorization for NorthBridge
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: Access token creation and validation
/// - [`middleware`]: Cookie token extraction and the request [`Principal`](middleware::Principal)
/// - [`strategy`]: Role based dispatch of decoded claims to account validators
/// - [`policy`]: Capability rules (can / cannot) per role
/// - [`authorization`]: Guard helpers that turn policy decisions into errors
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::auth::password::{hash_password, verify_password};
/// use northbridge_shared::auth::jwt::{create_token, Algorithm, Claims};
/// use northbridge_shared::models::role::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Sup3r$ecret")?;
/// assert!(verify_password("Sup3r$ecret", &hash)?);
///
/// let claims = Claims::new(
///     Uuid::new_v4(),
///     "user@example.com".to_string(),
///     Role::User,
///     chrono::Duration::days(1),
/// );
/// let token = create_token(&claims, "a-very-long-secret-key-of-32-bytes!", Algorithm::HS256)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod strategy;
