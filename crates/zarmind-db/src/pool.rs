//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  API Server Startup                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ One request handler per connection at a time                   │
//! │       ▼                                                                 │
//! │  GET /api/crm/customers     ──► db.customers().list(..)                │
//! │  POST /api/suppliers        ──► db.suppliers().insert(..)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so list queries don't
//! block writers and vice versa.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::branch::BranchRepository;
use crate::repository::cash::CashRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::employee::EmployeeRepository;
use crate::repository::expense::ExpenseRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::payroll::PayrollRepository;
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::setting::SettingRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::user::UserRepository;
use crate::repository::work_order::WorkOrderRepository;
use crate::repository::workshop::WorkshopRepository;
use zarmind_core::LedgerKind;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/zarmind/zarmind.db")
///     .max_connections(10)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
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
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Fresh schema, isolated from every other test
    /// ```
    ///
    /// An in-memory database lives on a single connection, so code must
    /// never reach for the pool while it holds an open transaction.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
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

/// Main database handle providing repository access.
///
/// Cheap to clone; every clone shares the same pool.
///
/// ## Usage in Services
/// ```rust,ignore
/// let page = db.customers().list(&query).await?;
/// let ap = db.payables().get(&id).await?;
/// ```
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
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
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

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods; this is for aggregate queries and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn branches(&self) -> BranchRepository {
        BranchRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn workshops(&self) -> WorkshopRepository {
        WorkshopRepository::new(self.pool.clone())
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Returns the product repository (items plus branch inventory rows).
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the ledger repository for one side of the books.
    pub fn ledger(&self, kind: LedgerKind) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone(), kind)
    }

    /// Accounts payable: what we owe suppliers.
    pub fn payables(&self) -> LedgerRepository {
        self.ledger(LedgerKind::Payable)
    }

    /// Accounts receivable: what customers owe us.
    pub fn receivables(&self) -> LedgerRepository {
        self.ledger(LedgerKind::Receivable)
    }

    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingRepository {
        SettingRepository::new(self.pool.clone())
    }

    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool.clone())
    }

    /// Branch cash book.
    pub fn cash(&self) -> CashRepository {
        CashRepository::new(self.pool.clone())
    }

    pub fn payroll(&self) -> PayrollRepository {
        PayrollRepository::new(self.pool.clone())
    }

    pub fn work_orders(&self) -> WorkOrderRepository {
        WorkOrderRepository::new(self.pool.clone())
    }

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
