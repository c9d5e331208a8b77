/// JWT access tokens
///
/// Tokens are HMAC-signed (HS256 by default) and carry the account id, the
/// account email and its [`Role`]. The role decides which account table the
/// token is validated against (see [`super::strategy`]).
///
/// # Claims
///
/// - `sub`: account id
/// - `username`: account email
/// - `role`: USER, VENDOR or ADMIN
/// - `iss`: always `northbridge`
/// - `iat`, `nbf`, `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use northbridge_shared::auth::jwt::{create_token, validate_token, Algorithm, Claims};
/// use northbridge_shared::models::role::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new(
///     Uuid::new_v4(),
///     "vendor@example.com".to_string(),
///     Role::Vendor,
///     chrono::Duration::hours(12),
/// );
///
/// let token = create_token(&claims, secret, Algorithm::HS256)?;
/// let decoded = validate_token(&token, secret, Algorithm::HS256)?;
/// assert_eq!(decoded.role, Role::Vendor);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::Role;

pub use jsonwebtoken::Algorithm;

/// Issuer written into and required from every token
pub const ISSUER: &str = "northbridge";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    /// Only HMAC algorithms are supported
    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,

    /// Account email
    pub username: String,

    /// Account role
    pub role: Role,

    /// Issuer (always "northbridge")
    pub iss: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// Not before
    pub nbf: i64,
}

impl Claims {
    /// Builds claims for an account that expire `expires_in` from now
    pub fn new(account_id: Uuid, email: String, role: Role, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: account_id,
            username: email,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Parses an HMAC algorithm name (`HS256`, `HS384`, `HS512`)
pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(JwtError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Parses a token lifetime
///
/// Accepts plain seconds (`3600`) or a number with one of the suffixes
/// `s`, `m`, `h`, `d`. Returns `None` for empty, zero or malformed input.
///
/// ```
/// use northbridge_shared::auth::jwt::parse_expires_in;
/// use chrono::Duration;
///
/// assert_eq!(parse_expires_in("1d"), Some(Duration::days(1)));
/// assert_eq!(parse_expires_in("90"), Some(Duration::seconds(90)));
/// assert_eq!(parse_expires_in("soon"), None);
/// ```
pub fn parse_expires_in(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&value[..idx], c.to_ascii_lowercase()),
        _ => (value, 's'),
    };

    let amount: i64 = digits.trim().parse().ok()?;
    if amount <= 0 {
        return None;
    }

    match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => None,
    }
}

/// Signs claims into a compact JWT
///
/// # Errors
///
/// Returns `JwtError::UnsupportedAlgorithm` for non-HMAC algorithms and
/// `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str, algorithm: Algorithm) -> Result<String, JwtError> {
    ensure_hmac(algorithm)?;

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(algorithm), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token's signature, issuer and time claims
///
/// # Errors
///
/// - `JwtError::Expired` if `exp` has passed
/// - `JwtError::InvalidIssuer` if `iss` is not "northbridge"
/// - `JwtError::ValidationError` for anything else (bad signature, malformed token)
pub fn validate_token(token: &str, secret: &str, algorithm: Algorithm) -> Result<Claims, JwtError> {
    ensure_hmac(algorithm)?;

    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(data.claims)
}

fn ensure_hmac(algorithm: Algorithm) -> Result<(), JwtError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
        other => Err(JwtError::UnsupportedAlgorithm(format!("{:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn claims(role: Role) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "someone@example.com".to_string(),
            role,
            Duration::hours(1),
        )
    }

    #[test]
    fn test_claims_new() {
        let claims = claims(Role::User);

        assert_eq!(claims.iss, "northbridge");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.nbf, claims.iat);
    }

    #[test]
    fn test_token_roundtrip_each_algorithm() {
        for algorithm in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let original = claims(Role::Admin);
            let token = create_token(&original, SECRET, algorithm).unwrap();
            assert_eq!(token.split('.').count(), 3);

            let decoded = validate_token(&token, SECRET, algorithm).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(&claims(Role::User), SECRET, Algorithm::HS256).unwrap();
        let result = validate_token(&token, "another-secret-that-is-long-enough!!", Algorithm::HS256);

        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let token = create_token(&claims(Role::User), SECRET, Algorithm::HS512).unwrap();
        assert!(validate_token(&token, SECRET, Algorithm::HS256).is_err());
    }

    #[test]
    fn test_expired_token() {
        let mut expired = claims(Role::Vendor);
        expired.iat -= 7200;
        expired.nbf -= 7200;
        expired.exp = Utc::now().timestamp() - 3600;

        let token = create_token(&expired, SECRET, Algorithm::HS256).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET, Algorithm::HS256),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_foreign_issuer() {
        let mut foreign = claims(Role::User);
        foreign.iss = "someone-else".to_string();

        let token = create_token(&foreign, SECRET, Algorithm::HS256).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET, Algorithm::HS256),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(validate_token("not.a.token", SECRET, Algorithm::HS256).is_err());
        assert!(validate_token("", SECRET, Algorithm::HS256).is_err());
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        assert!(matches!(
            create_token(&claims(Role::User), SECRET, Algorithm::RS256),
            Err(JwtError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("hs384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm(" HS512 ").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in("3600"), Some(Duration::seconds(3600)));
        assert_eq!(parse_expires_in("45s"), Some(Duration::seconds(45)));
        assert_eq!(parse_expires_in("30m"), Some(Duration::minutes(30)));
        assert_eq!(parse_expires_in("12h"), Some(Duration::hours(12)));
        assert_eq!(parse_expires_in("1d"), Some(Duration::days(1)));
        assert_eq!(parse_expires_in("7D"), Some(Duration::days(7)));
        assert_eq!(parse_expires_in(""), None);
        assert_eq!(parse_expires_in("0"), None);
        assert_eq!(parse_expires_in("-5m"), None);
        assert_eq!(parse_expires_in("2w"), None);
        assert_eq!(parse_expires_in("abc"), None);
    }
}
