//! # synapse-db
//!
//! PostgreSQL storage layer for synapse.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgItemRepository`]: item CRUD and filtered substring search
//! - [`PgVectorStore`]: nearest-neighbor queries over pgvector embeddings
//!
//! ## Example
//!
//! ```rust,ignore
//! use synapse_db::{Database, ItemRepository, SynapseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SynapseConfig::from_env()?;
//!     let db = Database::connect(&config).await?;
//!     db.migrate().await?;
//!
//!     for item in db.items.list().await? {
//!         println!("{} {}", item.id, item.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod item_filter;
pub mod items;
pub mod pool;
pub mod vectors;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use synapse_core::*;

pub use item_filter::{ItemFilterQueryBuilder, QueryParam};
pub use items::PgItemRepository;
pub use pool::{connect_pool, log_pool_metrics, PoolSettings};
pub use vectors::PgVectorStore;

/// Database handle aggregating the repositories over one pool.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Relational item store.
    pub items: PgItemRepository,
    /// Vector store for item embeddings.
    pub vectors: PgVectorStore,
}

impl Database {
    /// Create a new database instance from a pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            items: PgItemRepository::new(pool.clone()),
            vectors: PgVectorStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect using the configured URL and pool sizing.
    pub async fn connect(config: &SynapseConfig) -> Result<Self> {
        let pool = connect_pool(&config.database_url, &PoolSettings::from(config)).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Check that the database answers a trivial query.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        log_pool_metrics(&self.pool);
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
