//! Database query functions for the `history` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{HistoryEntry, NewHistoryEntry};

/// Insert a new history row. Returns the stored entry with its
/// server-generated `id` and `created_at`.
pub async fn insert_entry(pool: &PgPool, entry: &NewHistoryEntry) -> Result<HistoryEntry> {
    let stored = sqlx::query_as::<_, HistoryEntry>(
        "INSERT INTO history (syllabus, deadlines, available_time, study_plan) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&entry.syllabus)
    .bind(&entry.deadlines)
    .bind(&entry.available_time)
    .bind(&entry.study_plan)
    .fetch_one(pool)
    .await
    .context("failed to insert history entry")?;

    Ok(stored)
}

/// List every entry, newest first.
pub async fn list_entries(pool: &PgPool) -> Result<Vec<HistoryEntry>> {
    let entries = sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM history ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list history entries")?;

    Ok(entries)
}

/// List at most `limit` entries, newest first.
pub async fn list_recent_entries(pool: &PgPool, limit: i64) -> Result<Vec<HistoryEntry>> {
    let entries = sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM history ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list recent history entries")?;

    Ok(entries)
}

/// Total number of stored entries.
pub async fn count_entries(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
        .fetch_one(pool)
        .await
        .context("failed to count history entries")?;

    Ok(count)
}
