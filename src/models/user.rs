use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub exp: i64,
    pub level: i64,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            exp: row.get("exp")?,
            level: row.get("level")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// One entry in a user's chronological weight history. The most recent
/// entry is the user's current bodyweight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub user_id: String,
    pub weight: f64,
    pub recorded_on: NaiveDate,
}

impl FromSqliteRow for WeightEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            weight: row.get("weight")?,
            recorded_on: row.get("recorded_on")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordWeight {
    pub weight: f64,
    pub recorded_on: Option<NaiveDate>,
}
