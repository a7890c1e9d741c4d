use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{ExperienceEvent, ExperienceHistory, FromSqliteRow};
use crate::progression::leveling::LevelCurve;

#[derive(Clone)]
pub struct ExperienceRepository {
    pool: DbPool,
}

impl ExperienceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Events whose window contains `date` and which apply to the user,
    /// either globally or scoped to them.
    pub async fn events_active_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExperienceEvent>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM experience_events
                 WHERE (user_id IS NULL OR user_id = ?)
                   AND starts_on <= ? AND ends_on >= ?",
            )?;
            let events = stmt
                .query_map(
                    rusqlite::params![user_id, date, date],
                    ExperienceEvent::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(events)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create_event(
        &self,
        name: &str,
        multiplier: f64,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
        user_id: Option<&str>,
    ) -> Result<ExperienceEvent> {
        let pool = self.pool.clone();
        let event = ExperienceEvent {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            multiplier,
            starts_on,
            ends_on,
            user_id: user_id.map(|s| s.to_string()),
        };
        let e = event.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO experience_events (id, name, multiplier, starts_on, ends_on, user_id)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![e.id, e.name, e.multiplier, e.starts_on, e.ends_on, e.user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(event)
    }

    /// Apply an XP grant to the user and append the ledger row, atomically.
    /// The user's exp and level and the history row commit together or not
    /// at all; a missing user is a hard failure.
    pub async fn apply_grant(
        &self,
        user_id: &str,
        workout_id: &str,
        xp_granted: i64,
        curve: LevelCurve,
    ) -> Result<ExperienceHistory> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let workout_id = workout_id.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            // Immediate: take the write lock before reading, so concurrent
            // grants for the same user serialize instead of losing updates.
            let tx =
                conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

            let current: Option<(i64, i64)> = tx
                .query_row(
                    "SELECT exp, level FROM users WHERE id = ?",
                    [&user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (exp_before, level_before) = current
                .ok_or_else(|| AppError::NotFound(format!("User not found: {user_id}")))?;

            let exp_after = exp_before + xp_granted;
            let level_after = curve.level_for_xp(exp_after);

            tx.execute(
                "UPDATE users SET exp = ?, level = ? WHERE id = ?",
                rusqlite::params![exp_after, level_after, user_id],
            )?;

            let record = ExperienceHistory {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.clone(),
                workout_id: workout_id.clone(),
                xp_granted,
                exp_before,
                exp_after,
                level_before,
                level_after,
                created_at: Utc::now(),
            };
            tx.execute(
                "INSERT INTO experience_history
                 (id, user_id, workout_id, xp_granted, exp_before, exp_after, level_before, level_after, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    record.id,
                    record.user_id,
                    record.workout_id,
                    record.xp_granted,
                    record.exp_before,
                    record.exp_after,
                    record.level_before,
                    record.level_after,
                    record.created_at
                ],
            )?;

            tx.commit()?;
            Ok(record)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ExperienceHistory>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM experience_history WHERE user_id = ?
                 ORDER BY created_at DESC LIMIT ?",
            )?;
            let history = stmt
                .query_map(
                    rusqlite::params![user_id, limit],
                    ExperienceHistory::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(history)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn history_for_workout(&self, workout_id: &str) -> Result<Vec<ExperienceHistory>> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM experience_history WHERE workout_id = ? ORDER BY created_at",
            )?;
            let history = stmt
                .query_map([&workout_id], ExperienceHistory::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(history)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
