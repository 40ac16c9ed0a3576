//! `studyplan history` command: print stored study plans, newest first.

use anyhow::Result;
use sqlx::PgPool;

use studyplan_db::models::HistoryEntry;
use studyplan_db::queries::history as history_db;

/// Run the history command. `limit` of `None` prints every entry.
pub async fn run_history(pool: &PgPool, limit: Option<i64>) -> Result<()> {
    let total = history_db::count_entries(pool).await?;
    let entries = match limit {
        Some(n) => history_db::list_recent_entries(pool, n).await?,
        None => history_db::list_entries(pool).await?,
    };

    if entries.is_empty() {
        println!("No study plans stored yet.");
        return Ok(());
    }

    println!("Showing {} of {total} study plan(s):", entries.len());
    println!();
    for entry in &entries {
        print!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &HistoryEntry) -> String {
    format!(
        "#{id}  {at}\n  syllabus:  {syllabus}\n  deadlines: {deadlines}\n  hours/day: {hours}\n  plan:      {len} bytes of HTML\n\n",
        id = entry.id,
        at = entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        syllabus = entry.syllabus,
        deadlines = entry.deadlines,
        hours = entry.available_time,
        len = entry.study_plan.len(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn format_entry_lists_fields() {
        let entry = HistoryEntry {
            id: 3,
            syllabus: "Math, Physics".to_string(),
            deadlines: "2025-05-01, 2025-05-15".to_string(),
            available_time: "5".to_string(),
            study_plan: "<p>plan</p>".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 24, 14, 30, 0).unwrap(),
        };
        let text = format_entry(&entry);
        assert!(text.starts_with("#3  2025-03-24 14:30:00 UTC\n"));
        assert!(text.contains("syllabus:  Math, Physics"));
        assert!(text.contains("deadlines: 2025-05-01, 2025-05-15"));
        assert!(text.contains("hours/day: 5"));
        assert!(text.contains("11 bytes of HTML"));
    }
}
