//! # Database Pool
//!
//! One [`Database`] per process, built from a [`DbConfig`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig                                                               │
//! │    ├── Storage::File(path)  → WAL journal, pool of N writers/readers    │
//! │    └── Storage::Memory      → one pinned connection (tests)             │
//! │                                                                         │
//! │  Database::new(config)                                                  │
//! │    ├── open SqlitePool (foreign keys ON, busy timeout)                  │
//! │    ├── embedded migrations                                              │
//! │    └── repositories: inventory() sales() cash_drawers() services() ...  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets the reporting reads (sale lists, drawer history) run while a
//! sale transaction is writing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cash_drawer::CashDrawerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::service::ServiceRepository;
use crate::repository::user::UserRepository;

/// Where the clinic database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    /// Private in-memory database. Lives as long as the pool's only connection.
    Memory,
}

/// Pool settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/vetpos/vetpos.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,
    /// Default: 5 (always 1 in memory)
    pub max_connections: u32,
    /// How long a request waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// Ignored for in-memory storage, which must stay on one connection.
    pub fn max_connections(mut self, max: u32) -> Self {
        if self.storage != Storage::Memory {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the pool without applying the embedded migrations.
    pub fn without_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.storage {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            Storage::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    fn describe(&self) -> String {
        match &self.storage {
            Storage::File(path) => path.display().to_string(),
            Storage::Memory => ":memory:".to_string(),
        }
    }
}

/// Shared handle over the pool. Cloning shares the pool.
///
/// ```rust,ignore
/// let drawer = state.db.cash_drawers().find_open().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(storage = %config.describe(), "Opening clinic database");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);

        if config.storage == Storage::Memory {
            // dropping the connection would drop the data
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn cash_drawers(&self) -> CashDrawerRepository {
        CashDrawerRepository::new(self.pool.clone())
    }

    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing clinic database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn memory_data_survives_between_acquires() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().upsert("u-1", "vet@clinic.test", None).await.unwrap();

        assert!(db.users().get_by_id("u-1").await.unwrap().is_some());
    }

    #[test]
    fn memory_storage_keeps_one_connection() {
        let config = DbConfig::in_memory().max_connections(8);
        assert_eq!(config.max_connections, 1);

        let config = DbConfig::new("/tmp/vetpos.db")
            .max_connections(8)
            .busy_timeout(Duration::from_secs(1))
            .without_migrations();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.migrate);
    }
}
