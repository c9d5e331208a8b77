/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use northbridge_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, MethodRouter},
    Router,
};
use northbridge_shared::auth::{middleware::authenticate, policy::PolicyCheck};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error::ApiError,
    middleware::{guard::create_policy_guard, security::SecurityHeadersLayer},
    payment::{PaymentError, PaymentGateway, PaystackClient},
    routes,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Payment gateway used by the payment routes
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Creates state backed by the Paystack client
    pub fn new(db: PgPool, config: Config) -> Result<Self, PaymentError> {
        let payments = Arc::new(PaystackClient::new(&config.payment)?);
        Ok(Self::with_gateway(db, config, payments))
    }

    pub fn with_gateway(db: PgPool, config: Config, payments: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            payments,
        }
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── /health                 health check (public)
/// ├── /uploads/*              uploaded images (static)
/// └── /api/v1                 welcome message
///     ├── /admin/...
///     ├── /user/...
///     ├── /vendor/...
///     ├── /store/...
///     ├── /product/...
///     └── /payment/...
/// ```
///
/// Authentication and policy checks are attached per route with
/// [`authenticated`] and [`guarded`].
pub fn build_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/", get(routes::welcome::welcome))
        .nest("/admin", routes::admin::router(&state))
        .nest("/user", routes::user::router(&state))
        .nest("/vendor", routes::vendor::router(&state))
        .nest("/store", routes::store::router(&state))
        .nest("/product", routes::product::router(&state))
        .nest("/payment", routes::payment::router(&state));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Mirrors the request origin so cookies still work
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Reads the `access_token` cookie, validates it, resolves the account for
/// the token's role and inserts the [`Principal`](northbridge_shared::auth::middleware::Principal)
/// into request extensions.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(
        &state.db,
        req.headers(),
        &state.config.jwt.secret,
        state.config.jwt.algorithm,
    )
    .await?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Requires a valid token on `route`
pub fn authenticated(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer))
}

/// Requires a valid token and every policy in `checks` on `route`
pub fn guarded(
    state: &AppState,
    checks: &'static [PolicyCheck],
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    authenticated(
        state,
        route.route_layer(middleware::from_fn(create_policy_guard(checks))),
    )
}
