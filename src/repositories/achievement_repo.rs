use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    Achievement, AchievementKind, AchievementProgressUpdate, FromSqliteRow, UserAchievement,
};

#[derive(Clone)]
pub struct AchievementRepository {
    pool: DbPool,
}

impl AchievementRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        kind: AchievementKind,
        target_value: f64,
        min_value: f64,
        exercise_id: Option<&str>,
        xp_reward: i64,
    ) -> Result<Achievement> {
        let pool = self.pool.clone();
        let achievement = Achievement {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            target_value,
            min_value,
            exercise_id: exercise_id.map(|s| s.to_string()),
            xp_reward,
        };
        let a = achievement.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO achievements (id, name, kind, target_value, min_value, exercise_id, xp_reward)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    a.id,
                    a.name,
                    a.kind.as_str(),
                    a.target_value,
                    a.min_value,
                    a.exercise_id,
                    a.xp_reward
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(achievement)
    }

    pub async fn find_all(&self) -> Result<Vec<Achievement>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM achievements ORDER BY name")?;
            let achievements = stmt
                .query_map([], Achievement::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(achievements)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Candidates for one finished workout: every workout-scoped achievement
    /// plus exercise-scoped ones linked to an exercise in the workout.
    pub async fn find_candidates(&self, exercise_ids: &[String]) -> Result<Vec<Achievement>> {
        let pool = self.pool.clone();
        let exercise_ids = exercise_ids.to_vec();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let placeholders = exercise_ids
                .iter()
                .map(|_| "?")
                .collect::<Vec<_>>()
                .join(", ");
            let sql = if exercise_ids.is_empty() {
                "SELECT * FROM achievements WHERE exercise_id IS NULL".to_string()
            } else {
                format!(
                    "SELECT * FROM achievements WHERE exercise_id IS NULL OR exercise_id IN ({placeholders})"
                )
            };
            let mut stmt = conn.prepare(&sql)?;
            let achievements = stmt
                .query_map(
                    rusqlite::params_from_iter(exercise_ids.iter()),
                    Achievement::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(achievements)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<Option<UserAchievement>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let achievement_id = achievement_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM user_achievements WHERE user_id = ? AND achievement_id = ?",
            )?;
            let result = stmt
                .query_row([&user_id, &achievement_id], UserAchievement::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn progress_for_user(&self, user_id: &str) -> Result<Vec<UserAchievement>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM user_achievements WHERE user_id = ?")?;
            let progress = stmt
                .query_map([&user_id], UserAchievement::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(progress)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Upsert one evaluated progress update. The `achieved = 0` guard keeps
    /// already-achieved rows immutable no matter what the caller computed.
    pub async fn upsert_progress(&self, update: &AchievementProgressUpdate) -> Result<()> {
        let pool = self.pool.clone();
        let update = update.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO user_achievements (user_id, achievement_id, current_value, achieved, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(user_id, achievement_id)
                 DO UPDATE SET current_value = excluded.current_value,
                               achieved = excluded.achieved,
                               updated_at = excluded.updated_at
                 WHERE user_achievements.achieved = 0",
                rusqlite::params![
                    update.user_id,
                    update.achievement_id,
                    update.current_value,
                    update.achieved,
                    now
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
