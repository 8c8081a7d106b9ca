//! Connection pool for the item and embedding tables.
//!
//! Sizing comes from [`SynapseConfig`]; the pool is created once at startup
//! and shared by [`crate::Database`]'s stores.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use synapse_core::{Error, Result, SynapseConfig};

/// Idle connections above `min_connections` are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// Time to wait for a free connection before a store call fails.
    pub acquire_timeout: Duration,
}

impl From<&SynapseConfig> for PoolSettings {
    fn from(config: &SynapseConfig) -> Self {
        Self {
            max_connections: config.database_max_connections,
            acquire_timeout: config.database_acquire_timeout(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::from(&SynapseConfig::default())
    }
}

impl PoolSettings {
    /// One warm connection, never above the maximum.
    fn min_connections(&self) -> u32 {
        self.max_connections.min(1)
    }
}

/// Open a pool against `database_url`.
pub async fn connect_pool(database_url: &str, settings: &PoolSettings) -> Result<PgPool> {
    let start = Instant::now();
    debug!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = settings.max_connections,
        acquire_timeout_secs = settings.acquire_timeout.as_secs(),
        "Opening connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections())
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Connection pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy; warns when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(subsystem = "db", component = "pool", pool_size = size, pool_idle = idle, "Pool occupancy");
    if idle == 0 && size > 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            "All pooled connections are busy"
        );
    }
}
