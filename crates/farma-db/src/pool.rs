//! # Database Pool Management
//!
//! Connection pool creation, configuration, and the catalog-facing facade.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Database Connection Pool                       │
//! │                                                                 │
//! │  DbConfig::new(path) ← configure pool settings                  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  Database::new(config).await ← create pool + run migrations     │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────┐                          │
//! │  │            SqlitePool             │                          │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐          │  (max_connections)       │
//! │  │  │Conn1│ │Conn2│ │Conn3│ ...      │                          │
//! │  │  └─────┘ └─────┘ └─────┘          │                          │
//! │  └───────────────────────────────────┘                          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  Repositories + SaleEngine share the pool; concurrent sale      │
//! │  attempts serialize on the write transaction                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled:
//! - readers don't block writers, writers don't block readers
//! - better crash recovery

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use farma_core::{LotView, ProductSummary, SaleError, SalePolicy, SaleResult};

use crate::engine::SaleEngine;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::lot::LotRepository;
use crate::repository::operator::OperatorRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/farmapos.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a single-store POS)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection timeout duration.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The database file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // In-memory requires a single connection: every connection of a
            // :memory: pool would otherwise see its own empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access and the catalog facade.
///
/// This is the narrow interface a presentation layer talks to:
///
/// - [`Database::list_products`] - catalog with stock and display price
/// - [`Database::lots_for_product`] - lots annotated with expiry info
/// - [`Database::create_lot`] - stock intake
/// - [`Database::lots_expiring_soon`] - expiry alert
/// - [`Database::engine`] - the sale transaction engine
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite for POS use:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path with mode=rwc creates the file if missing
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off for backwards compatibility
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Automatically called by `new()` unless disabled in the config.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced queries not covered by repositories. Prefer repository
    /// methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Repository accessors
    // -------------------------------------------------------------------------

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the lot repository.
    pub fn lots(&self) -> LotRepository {
        LotRepository::new(self.pool.clone())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the operator repository.
    pub fn operators(&self) -> OperatorRepository {
        OperatorRepository::new(self.pool.clone())
    }

    /// Builds a sale engine over this database with the given policy.
    pub fn engine(&self, policy: SalePolicy) -> SaleEngine {
        SaleEngine::new(self.pool.clone(), policy)
    }

    // -------------------------------------------------------------------------
    // Catalog facade
    // -------------------------------------------------------------------------

    /// Lists the catalog: every product with aggregated stock, nearest
    /// expiry, and the display price quoted against `today`.
    ///
    /// Fails softly: a storage error is logged and an empty list returned,
    /// so a catalog screen degrades instead of erroring. Use
    /// [`ProductRepository::list_with_stock`] directly when the error
    /// matters.
    pub async fn list_products(&self, today: NaiveDate) -> Vec<ProductSummary> {
        match self.products().list_with_stock(today).await {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "Catalog listing failed, returning empty list");
                Vec::new()
            }
        }
    }

    /// Lists a product's lots ordered by ascending expiry, annotated with
    /// days-to-expiry and the expiring-soon flag relative to `today`.
    pub async fn lots_for_product(
        &self,
        product_id: i64,
        today: NaiveDate,
    ) -> DbResult<Vec<LotView>> {
        let lots = self.lots().list_for_product(product_id).await?;
        Ok(lots.into_iter().map(|lot| LotView::new(lot, today)).collect())
    }

    /// Registers a new stock lot after validating the input.
    ///
    /// ## Errors
    /// - `InvalidRequest` - empty lot number, negative quantity, or unknown
    ///   product
    /// - `Storage` - persistence failure
    pub async fn create_lot(
        &self,
        product_id: i64,
        lot_number: &str,
        expiry_date: NaiveDate,
        quantity: i64,
    ) -> SaleResult<i64> {
        farma_core::validation::validate_lot_number(lot_number)?;
        farma_core::validation::validate_stock_quantity(quantity)?;

        match self.lots().insert(product_id, lot_number, expiry_date, quantity).await {
            Ok(id) => Ok(id),
            Err(DbError::ForeignKeyViolation { .. }) => Err(SaleError::invalid(format!(
                "unknown product: {product_id}"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists lots expiring inside the 30-day alert window, joined with
    /// their product's identity. Display-only.
    pub async fn lots_expiring_soon(
        &self,
        today: NaiveDate,
    ) -> DbResult<Vec<farma_core::ExpiringLot>> {
        self.lots()
            .expiring_within(today, farma_core::EXPIRY_ALERT_WINDOW_DAYS)
            .await
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }
}
