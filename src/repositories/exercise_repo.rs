use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{Equipment, Exercise, ExerciseKind, FromSqliteRow, Muscle};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Exercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM exercises WHERE id = ?")?;
            let result = stmt.query_row([&id], Exercise::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Shared catalog plus the user's own custom exercises.
    pub async fn find_available_for_user(&self, user_id: &str) -> Result<Vec<Exercise>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM exercises WHERE user_id IS NULL OR user_id = ? ORDER BY name",
            )?;
            let exercises = stmt
                .query_map([&user_id], Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Create an exercise and link its equipment and muscles in one
    /// transaction. Custom exercises are owned by the creating user.
    pub async fn create(
        &self,
        name: &str,
        kind: ExerciseKind,
        owner: Option<&str>,
        equipment_ids: &[String],
        muscle_ids: &[String],
    ) -> Result<Exercise> {
        let pool = self.pool.clone();
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            user_id: owner.map(|s| s.to_string()),
            created_at: Utc::now(),
        };
        let e = exercise.clone();
        let equipment_ids = equipment_ids.to_vec();
        let muscle_ids = muscle_ids.to_vec();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO exercises (id, name, kind, user_id, created_at) VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![e.id, e.name, e.kind.as_str(), e.user_id, e.created_at],
            )?;
            for equipment_id in &equipment_ids {
                tx.execute(
                    "INSERT INTO exercise_equipment (exercise_id, equipment_id) VALUES (?, ?)",
                    rusqlite::params![e.id, equipment_id],
                )?;
            }
            for muscle_id in &muscle_ids {
                tx.execute(
                    "INSERT INTO exercise_muscles (exercise_id, muscle_id) VALUES (?, ?)",
                    rusqlite::params![e.id, muscle_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(exercise)
    }

    pub async fn has_equipment(&self, exercise_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let exercise_id = exercise_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM exercise_equipment WHERE exercise_id = ?",
                [&exercise_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create_equipment(&self, name: &str) -> Result<Equipment> {
        let pool = self.pool.clone();
        let equipment = Equipment {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        let eq = equipment.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO equipment (id, name) VALUES (?, ?)",
                rusqlite::params![eq.id, eq.name],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
        Ok(equipment)
    }

    pub async fn create_muscle(&self, name: &str) -> Result<Muscle> {
        let pool = self.pool.clone();
        let muscle = Muscle {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        let m = muscle.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO muscles (id, name) VALUES (?, ?)",
                rusqlite::params![m.id, m.name],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
        Ok(muscle)
    }

    pub async fn list_equipment(&self) -> Result<Vec<Equipment>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM equipment ORDER BY name")?;
            let items = stmt
                .query_map([], Equipment::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn list_muscles(&self) -> Result<Vec<Muscle>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM muscles ORDER BY name")?;
            let items = stmt
                .query_map([], Muscle::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
