use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One generated study plan and the request that produced it.
///
/// Rows are write-once: the application inserts them and never updates or
/// deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub syllabus: String,
    /// Canonical `YYYY-MM-DD, YYYY-MM-DD` form.
    pub deadlines: String,
    /// Hours per day, exactly as the student submitted it.
    pub available_time: String,
    /// Rendered HTML.
    pub study_plan: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`HistoryEntry`]; `id` and `created_at` are assigned by
/// the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub syllabus: String,
    pub deadlines: String,
    pub available_time: String,
    pub study_plan: String,
}
