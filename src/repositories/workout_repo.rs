use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    ExerciseKind, FromSqliteRow, PerformedExercise, Workout, WorkoutExercise, WorkoutSet,
    WorkoutStatus,
};

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        date: NaiveDate,
        related_workout_id: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Workout> {
        let pool = self.pool.clone();
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            related_workout_id: related_workout_id.map(|s| s.to_string()),
            name: name.to_string(),
            date,
            status: WorkoutStatus::Planned,
            started_at: None,
            finished_at: None,
            notes: notes.map(|s| s.to_string()),
            created_at: Utc::now(),
        };
        let w = workout.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            let inserted = conn.execute(
                "INSERT INTO workouts (id, user_id, related_workout_id, name, date, status, notes, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    w.id,
                    w.user_id,
                    w.related_workout_id,
                    w.name,
                    w.date,
                    w.status.as_str(),
                    w.notes,
                    w.created_at
                ],
            );
            match inserted {
                Ok(_) => Ok(()),
                // One workout per (user, date)
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(AppError::Conflict(
                        "A workout already exists for this date".to_string(),
                    ))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(workout)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workouts WHERE id = ?")?;
            let result = stmt.query_row([&id], Workout::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM workouts WHERE user_id = ? ORDER BY date DESC")?;
            let workouts = stmt
                .query_map([&user_id], Workout::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workouts WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_exercise(
        &self,
        workout_id: &str,
        exercise_id: &str,
    ) -> Result<WorkoutExercise> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        let exercise_id = exercise_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let position: i32 = conn.query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM workout_exercises WHERE workout_id = ?",
                [&workout_id],
                |row| row.get(0),
            )?;

            let entry = WorkoutExercise {
                id: Uuid::new_v4().to_string(),
                workout_id,
                exercise_id,
                position,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO workout_exercises (id, workout_id, exercise_id, position, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![
                    entry.id,
                    entry.workout_id,
                    entry.exercise_id,
                    entry.position,
                    entry.created_at
                ],
            )?;
            Ok(entry)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_set(
        &self,
        workout_exercise_id: &str,
        reps: i32,
        weight: f64,
    ) -> Result<WorkoutSet> {
        let pool = self.pool.clone();
        let workout_exercise_id = workout_exercise_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let position: i32 = conn.query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM workout_sets WHERE workout_exercise_id = ?",
                [&workout_exercise_id],
                |row| row.get(0),
            )?;

            let set = WorkoutSet {
                id: Uuid::new_v4().to_string(),
                workout_exercise_id,
                reps,
                weight,
                position,
            };
            conn.execute(
                "INSERT INTO workout_sets (id, workout_exercise_id, reps, weight, position)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![set.id, set.workout_exercise_id, set.reps, set.weight, set.position],
            )?;
            Ok(set)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_exercise_entry(&self, id: &str) -> Result<Option<WorkoutExercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workout_exercises WHERE id = ?")?;
            let result = stmt
                .query_row([&id], WorkoutExercise::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Load a workout's exercises in order, each joined with its catalog
    /// kind and equipment flag plus its ordered sets.
    pub async fn performed_exercises(&self, workout_id: &str) -> Result<Vec<PerformedExercise>> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT we.id, we.exercise_id, e.kind,
                        (SELECT COUNT(*) FROM exercise_equipment ee WHERE ee.exercise_id = e.id) AS equipment_count
                 FROM workout_exercises we
                 JOIN exercises e ON we.exercise_id = e.id
                 WHERE we.workout_id = ?
                 ORDER BY we.position",
            )?;
            let rows = stmt
                .query_map([&workout_id], |row| {
                    let entry_id: String = row.get("id")?;
                    let exercise_id: String = row.get("exercise_id")?;
                    let kind_str: String = row.get("kind")?;
                    let equipment_count: i64 = row.get("equipment_count")?;
                    Ok((entry_id, exercise_id, kind_str, equipment_count))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut set_stmt = conn.prepare(
                "SELECT * FROM workout_sets WHERE workout_exercise_id = ? ORDER BY position",
            )?;

            let mut performed = Vec::with_capacity(rows.len());
            for (entry_id, exercise_id, kind_str, equipment_count) in rows {
                let sets = set_stmt
                    .query_map([&entry_id], WorkoutSet::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                performed.push(PerformedExercise {
                    exercise_id,
                    kind: ExerciseKind::parse(&kind_str),
                    has_equipment: equipment_count > 0,
                    sets,
                });
            }
            Ok(performed)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Conditional transition planned -> in_progress. Returns false when the
    /// workout was not in `planned` (lost the race or already moved on).
    pub async fn mark_started(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.transition(
            "UPDATE workouts SET status = ?, started_at = ? WHERE id = ? AND status = ?",
            id,
            WorkoutStatus::InProgress,
            Some(at),
            WorkoutStatus::Planned,
        )
        .await
    }

    /// Conditional transition in_progress -> planned, clearing `started_at`.
    pub async fn mark_stopped(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workouts SET status = ?, started_at = NULL WHERE id = ? AND status = ?",
                rusqlite::params![
                    WorkoutStatus::Planned.as_str(),
                    id,
                    WorkoutStatus::InProgress.as_str()
                ],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Conditional transition in_progress -> completed. The status guard is
    /// what makes two concurrent finish calls resolve to a single winner.
    pub async fn mark_finished(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.transition(
            "UPDATE workouts SET status = ?, finished_at = ? WHERE id = ? AND status = ?",
            id,
            WorkoutStatus::Completed,
            Some(at),
            WorkoutStatus::InProgress,
        )
        .await
    }

    async fn transition(
        &self,
        sql: &'static str,
        id: &str,
        to: WorkoutStatus,
        at: Option<DateTime<Utc>>,
        from: WorkoutStatus,
    ) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                sql,
                rusqlite::params![to.as_str(), at, id, from.as_str()],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn count_completed(&self, user_id: &str) -> Result<i64> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workouts WHERE user_id = ? AND status = ?",
                rusqlite::params![user_id, WorkoutStatus::Completed.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Heaviest set the user has recorded for an exercise across completed
    /// workouts.
    pub async fn max_set_weight(&self, user_id: &str, exercise_id: &str) -> Result<Option<f64>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let exercise_id = exercise_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let max: Option<f64> = conn.query_row(
                "SELECT MAX(ws.weight)
                 FROM workout_sets ws
                 JOIN workout_exercises we ON ws.workout_exercise_id = we.id
                 JOIN workouts w ON we.workout_id = w.id
                 WHERE w.user_id = ? AND we.exercise_id = ? AND w.status = ?",
                rusqlite::params![user_id, exercise_id, WorkoutStatus::Completed.as_str()],
                |row| row.get(0),
            )?;
            Ok(max)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Batch-skip planned workouts whose date has fully elapsed. Idempotent:
    /// a second run matches nothing.
    pub async fn skip_stale_planned(&self, today: NaiveDate) -> Result<usize> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workouts SET status = ? WHERE status = ? AND date < ?",
                rusqlite::params![
                    WorkoutStatus::Skipped.as_str(),
                    WorkoutStatus::Planned.as_str(),
                    today
                ],
            )?;
            Ok(rows)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_stale_in_progress(&self, cutoff: DateTime<Utc>) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workouts WHERE status = ? AND started_at < ?",
            )?;
            let workouts = stmt
                .query_map(
                    rusqlite::params![WorkoutStatus::InProgress.as_str(), cutoff],
                    Workout::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
