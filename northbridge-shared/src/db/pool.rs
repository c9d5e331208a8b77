/// PostgreSQL connection pool
///
/// One pool is opened at start-up and handed to every request through the
/// application state. The health endpoint reports [`PoolStats`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use northbridge_shared::db::pool::{create_pool, get_pool_stats, PoolConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = create_pool(
///     PoolConfig::from_url("postgresql://localhost/northbridge")
///         .with_max_connections(20)
///         .with_acquire_timeout(Duration::from_secs(5)),
/// )
/// .await?;
///
/// println!("{:?}", get_pool_stats(&pool));
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

/// How the pool connects and how long connections live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub url: String,

    /// Upper bound on open connections (at least 1)
    pub max_connections: u32,

    /// Connections kept open while idle, never above `max_connections`
    pub min_connections: u32,

    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,

    /// Idle connections above `min_connections` are closed after this
    pub idle_timeout: Option<Duration>,

    /// Connections are recycled after this
    pub max_lifetime: Option<Duration>,
}

impl PoolConfig {
    /// 10 connections (2 kept warm), 30s acquire timeout, 10 min idle
    /// timeout, 30 min lifetime
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            max_lifetime: Some(Duration::from_secs(30 * 60)),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }

    pub fn with_min_connections(mut self, min_connections: u32) -> Self {
        self.min_connections = min_connections.min(self.max_connections);
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Keeps connections open until the pool closes
    pub fn without_recycling(mut self) -> Self {
        self.idle_timeout = None;
        self.max_lifetime = None;
        self
    }

    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .test_before_acquire(true)
    }
}

/// Opens the pool and runs [`health_check`] on it
///
/// # Errors
///
/// Fails when the URL is malformed, the server cannot be reached within
/// `acquire_timeout` or the health check fails.
pub async fn create_pool(config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Opening database pool"
    );

    let pool = config.options().connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database pool ready");
    Ok(pool)
}

/// Round-trips `SELECT 1`
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value != 1 {
        warn!(value, "Unexpected health check result");
        return Err(sqlx::Error::Protocol(format!(
            "health check returned {} instead of 1",
            value
        )));
    }

    debug!("Database reachable");
    Ok(())
}

/// Connection counts at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub idle: usize,
    /// Checked out by a request
    pub active: usize,
}

impl PoolStats {
    fn from_counts(size: u32, idle: usize) -> Self {
        let total = size as usize;
        let idle = idle.min(total);

        Self {
            total,
            idle,
            active: total - idle,
        }
    }
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    PoolStats::from_counts(pool.size(), pool.num_idle())
}

/// Waits for checked-out connections to return, then closes everything
pub async fn close_pool(pool: PgPool) {
    info!(stats = ?get_pool_stats(&pool), "Closing database pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_defaults() {
        let config = PoolConfig::from_url("postgresql://localhost/northbridge");

        assert_eq!(config.url, "postgresql://localhost/northbridge");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_connection_bounds_are_clamped() {
        let single = PoolConfig::from_url("postgresql://localhost/db").with_max_connections(1);
        assert_eq!(single.max_connections, 1);
        assert_eq!(single.min_connections, 1);

        let zero = PoolConfig::from_url("postgresql://localhost/db").with_max_connections(0);
        assert_eq!(zero.max_connections, 1);

        let warm = PoolConfig::from_url("postgresql://localhost/db")
            .with_max_connections(4)
            .with_min_connections(8);
        assert_eq!(warm.min_connections, 4);
    }

    #[test]
    fn test_without_recycling() {
        let config = PoolConfig::from_url("postgresql://localhost/db").without_recycling();
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.max_lifetime, None);
    }

    #[test]
    fn test_stats_from_counts() {
        assert_eq!(
            PoolStats::from_counts(5, 2),
            PoolStats {
                total: 5,
                idle: 2,
                active: 3
            }
        );
        assert_eq!(PoolStats::from_counts(0, 0).active, 0);
        assert_eq!(PoolStats::from_counts(1, 3).active, 0);
    }
}
