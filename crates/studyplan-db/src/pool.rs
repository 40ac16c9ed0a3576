//! Connection pooling, the embedded migrator, and database bootstrap for
//! `studyplan db-init`.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;
use crate::queries::history as history_db;

/// Migrations embedded at compile time from `crates/studyplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot reported after `db-init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStatus {
    /// Migrations recorded as applied in `_sqlx_migrations`.
    pub applied_migrations: i64,
    /// Migrations embedded in this binary.
    pub known_migrations: usize,
    /// Rows in the `history` table.
    pub history_entries: i64,
}

impl DbStatus {
    pub fn is_current(&self) -> bool {
        usize::try_from(self.applied_migrations).is_ok_and(|n| n == self.known_migrations)
    }
}

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Open the pool used by the web server and the `history` command.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, MAX_CONNECTIONS).await
}

/// Apply any pending embedded migrations. Safe to call on every start.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply history migrations")?;

    info!(known = MIGRATOR.iter().count(), "history schema is up to date");
    Ok(())
}

/// Create the configured database on its server if it is not there yet.
///
/// Returns `true` when the database was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .context("database URL has no database name")?;

    let maint_pool = connect(&config.maintenance_url(), 1).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint_pool)
            .await
            .context("failed to look up database in pg_database")?;

    let created = if exists {
        info!(db = db_name, "database already exists");
        false
    } else {
        let stmt = format!("CREATE DATABASE {}", quote_identifier(db_name));
        maint_pool
            .execute(stmt.as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "database created");
        true
    };

    maint_pool.close().await;
    Ok(created)
}

/// Report migration state and how many study plans are stored.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let applied_migrations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
            .context("failed to read applied migrations")?;

    Ok(DbStatus {
        applied_migrations,
        known_migrations: MIGRATOR.iter().count(),
        history_entries: history_db::count_entries(pool).await?,
    })
}

/// Double-quote a Postgres identifier. `CREATE DATABASE` takes no bind
/// parameters.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
