/// Database access layer
///
/// - [`pool`]: PostgreSQL connection pool creation, health checks and stats
/// - [`migrations`]: embedded schema migrations and database lifecycle helpers
///
/// # Example
///
/// ```no_run
/// use northbridge_shared::db::pool::{create_pool, PoolConfig};
/// use northbridge_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(PoolConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
