use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    Standard,
    Custom,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Standard => "standard",
            ExerciseKind::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "custom" => ExerciseKind::Custom,
            _ => ExerciseKind::Standard,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ExerciseKind::Custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub kind: ExerciseKind,
    /// Set for user-created exercises, None for the shared catalog.
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind_str: String = row.get("kind")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            kind: ExerciseKind::parse(&kind_str),
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
}

impl FromSqliteRow for Equipment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Muscle {
    pub id: String,
    pub name: String,
}

impl FromSqliteRow for Muscle {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateExercise {
    pub name: String,
    #[serde(default)]
    pub kind: ExerciseKind,
    #[serde(default)]
    pub equipment_ids: Vec<String>,
    #[serde(default)]
    pub muscle_ids: Vec<String>,
}
