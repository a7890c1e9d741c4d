use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::exercise::ExerciseKind;
use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Skipped,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::Planned => "planned",
            WorkoutStatus::InProgress => "in_progress",
            WorkoutStatus::Completed => "completed",
            WorkoutStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => WorkoutStatus::InProgress,
            "completed" => WorkoutStatus::Completed,
            "skipped" => WorkoutStatus::Skipped,
            _ => WorkoutStatus::Planned,
        }
    }

    /// Completed and skipped workouts never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkoutStatus::Completed | WorkoutStatus::Skipped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub related_workout_id: Option<String>,
    pub name: String,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status_str: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            related_workout_id: row.get("related_workout_id")?,
            name: row.get("name")?,
            date: row.get("date")?,
            status: WorkoutStatus::parse(&status_str),
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// One exercise slot within a workout, ordered by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for WorkoutExercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            exercise_id: row.get("exercise_id")?,
            position: row.get("position")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    pub workout_exercise_id: String,
    pub reps: i32,
    pub weight: f64,
    pub position: i32,
}

impl FromSqliteRow for WorkoutSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_exercise_id: row.get("workout_exercise_id")?,
            reps: row.get("reps")?,
            weight: row.get("weight")?,
            position: row.get("position")?,
        })
    }
}

/// A workout exercise joined with the catalog facts scoring cares about:
/// the exercise kind and whether it uses any equipment.
#[derive(Debug, Clone, Serialize)]
pub struct PerformedExercise {
    pub exercise_id: String,
    pub kind: ExerciseKind,
    pub has_equipment: bool,
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkout {
    pub name: String,
    pub date: NaiveDate,
    pub related_workout_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkoutExercise {
    pub exercise_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkoutSet {
    pub reps: i32,
    #[serde(default)]
    pub weight: f64,
}
