//! # Database Migrations
//!
//! Embedded SQL migrations for Zarmind ERP.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Server Startup (or seed binary)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table                                          │
//! │       │                                                                 │
//! │       ├── Table doesn't exist? Create it                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql                                       │
//! │       └── 002_operations.sql                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_work_orders.sql`)
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts, for health output.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
