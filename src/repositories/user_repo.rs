use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, User, WeightEntry};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, username: &str) -> Result<User> {
        let pool = self.pool.clone();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            exp: 0,
            level: 1,
            created_at: Utc::now(),
        };
        let user_clone = user.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO users (id, username, exp, level, created_at) VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_clone.id,
                    user_clone.username,
                    user_clone.exp,
                    user_clone.level,
                    user_clone.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([&id], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Most recent weight-history entry for the user, if any.
    pub async fn current_bodyweight(&self, user_id: &str) -> Result<Option<f64>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let weight: Option<f64> = conn
                .query_row(
                    "SELECT weight FROM weight_entries
                     WHERE user_id = ?
                     ORDER BY recorded_on DESC, id DESC
                     LIMIT 1",
                    [&user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(weight)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn record_weight(
        &self,
        user_id: &str,
        weight: f64,
        recorded_on: NaiveDate,
    ) -> Result<WeightEntry> {
        let pool = self.pool.clone();
        let entry = WeightEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            weight,
            recorded_on,
        };
        let entry_clone = entry.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO weight_entries (id, user_id, weight, recorded_on) VALUES (?, ?, ?, ?)",
                rusqlite::params![
                    entry_clone.id,
                    entry_clone.user_id,
                    entry_clone.weight,
                    entry_clone.recorded_on
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(entry)
    }

    pub async fn weight_history(&self, user_id: &str) -> Result<Vec<WeightEntry>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM weight_entries WHERE user_id = ? ORDER BY recorded_on DESC",
            )?;
            let entries = stmt
                .query_map([&user_id], WeightEntry::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
