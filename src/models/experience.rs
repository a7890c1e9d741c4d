use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// Time-boxed XP bonus. Global when `user_id` is None, otherwise scoped to
/// one user. Overlapping events stack additively over the 1.00 baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEvent {
    pub id: String,
    pub name: String,
    pub multiplier: f64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub user_id: Option<String>,
}

impl ExperienceEvent {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }
}

impl FromSqliteRow for ExperienceEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            multiplier: row.get("multiplier")?,
            starts_on: row.get("starts_on")?,
            ends_on: row.get("ends_on")?,
            user_id: row.get("user_id")?,
        })
    }
}

/// Write-once ledger row for an XP grant. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceHistory {
    pub id: String,
    pub user_id: String,
    pub workout_id: String,
    pub xp_granted: i64,
    pub exp_before: i64,
    pub exp_after: i64,
    pub level_before: i64,
    pub level_after: i64,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ExperienceHistory {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            workout_id: row.get("workout_id")?,
            xp_granted: row.get("xp_granted")?,
            exp_before: row.get("exp_before")?,
            exp_after: row.get("exp_after")?,
            level_before: row.get("level_before")?,
            level_after: row.get("level_after")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(starts: (i32, u32, u32), ends: (i32, u32, u32)) -> ExperienceEvent {
        ExperienceEvent {
            id: "e1".to_string(),
            name: "double weekend".to_string(),
            multiplier: 2.0,
            starts_on: NaiveDate::from_ymd_opt(starts.0, starts.1, starts.2).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(ends.0, ends.1, ends.2).unwrap(),
            user_id: None,
        }
    }

    #[test]
    fn test_event_active_window_is_inclusive() {
        let e = event((2026, 8, 1), (2026, 8, 3));
        assert!(!e.is_active_on(NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()));
        assert!(e.is_active_on(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
        assert!(e.is_active_on(NaiveDate::from_ymd_opt(2026, 8, 2).unwrap()));
        assert!(e.is_active_on(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()));
        assert!(!e.is_active_on(NaiveDate::from_ymd_opt(2026, 8, 4).unwrap()));
    }
}
