/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// | Variable | Default | |
/// |----------|---------|-|
/// | `API_HOST` | `0.0.0.0` | |
/// | `PORT` | `5000` | |
/// | `NODE_ENV` / `APP_ENV` | `development` | development, production, test, provision |
/// | `APP_NAME` | `NORTH BRIDGE` | shown by the welcome route |
/// | `API_VERSION` | `1.0.0` | shown by the welcome route |
/// | `FRONTEND_URL` / `ORIGIN_URL` | `*` | comma separated CORS origins |
/// | `DATABASE_URL` | required | |
/// | `DATABASE_MAX_CONNECTIONS` | `10` | |
/// | `JWT_SECRET` | required | at least 32 characters |
/// | `JWT_ALGORITHM` | `HS256` | HS256, HS384, HS512 |
/// | `JWT_EXPIRES_IN` | `1d` | `3600`, `30m`, `12h`, `1d` |
/// | `UPLOADS_DIR` | required | root for uploaded images |
/// | `PAYSTACK_SECRET_KEY` | empty | |
/// | `PAYSTACK_BASE_URL` | `https://api.paystack.co` | |

use std::env;
use std::path::PathBuf;

use northbridge_shared::auth::jwt::{parse_algorithm, parse_expires_in, Algorithm};

/// Largest accepted product image
pub const MAX_UPLOAD_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Most images accepted by one product create request
pub const MAX_UPLOAD_FILES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
    Provision,
}

impl Environment {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            "provision" => Ok(Environment::Provision),
            other => anyhow::bail!("Unknown environment '{}'", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,

    /// Enables HSTS and `Secure` cookies
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    /// Token and cookie lifetime
    pub expires_in: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_size: usize,
    pub max_files: usize,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub base_url: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let environment = Environment::parse(
            &var("NODE_ENV")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        )?;

        let port = var("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?;

        let cors_origins: Vec<String> = var("FRONTEND_URL")
            .or_else(|| var("ORIGIN_URL"))
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let secret = required("JWT_SECRET")?;
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let algorithm = parse_algorithm(&var("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()))?;

        let expires_raw = var("JWT_EXPIRES_IN").unwrap_or_else(|| "1d".to_string());
        let expires_in = parse_expires_in(&expires_raw)
            .ok_or_else(|| anyhow::anyhow!("JWT_EXPIRES_IN '{}' is not a valid duration", expires_raw))?;

        Ok(Self {
            app: AppConfig {
                name: var("APP_NAME").unwrap_or_else(|| "NORTH BRIDGE".to_string()),
                version: var("API_VERSION").unwrap_or_else(|| "1.0.0".to_string()),
                environment,
            },
            api: ApiConfig {
                host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                cors_origins,
                production: environment == Environment::Production,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections,
            },
            jwt: JwtConfig {
                secret,
                algorithm,
                expires_in,
            },
            uploads: UploadConfig {
                dir: PathBuf::from(required("UPLOADS_DIR")?),
                max_file_size: MAX_UPLOAD_FILE_SIZE,
                max_files: MAX_UPLOAD_FILES,
            },
            payment: PaymentConfig {
                secret_key: var("PAYSTACK_SECRET_KEY").unwrap_or_default(),
                base_url: var("PAYSTACK_BASE_URL")
                    .unwrap_or_else(|| "https://api.paystack.co".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
        })
    }

    /// `host:port` for the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
