//! Append-only history of generated plans.
//!
//! [`HistoryStore`] is the only persistence surface the web layer sees:
//! entries can be appended and listed, never updated or deleted.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use studyplan_db::models::{HistoryEntry, NewHistoryEntry};
use studyplan_db::queries::history as history_db;

/// The store was unreachable or rejected the write.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PersistenceError(#[from] anyhow::Error);

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert an entry; the store assigns `id` and `created_at`.
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, PersistenceError>;

    /// All entries, newest first. Empty when nothing has been stored.
    async fn list_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn HistoryStore) {}
};

/// [`HistoryStore`] backed by the PostgreSQL `history` table.
#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, PersistenceError> {
        let stored = history_db::insert_entry(&self.pool, &entry).await?;
        tracing::info!(id = stored.id, "history entry appended");
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        Ok(history_db::list_entries(&self.pool).await?)
    }
}
