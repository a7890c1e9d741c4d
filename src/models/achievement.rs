use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// Closed set of achievement kinds. Exercise-scoped kinds require a linked
/// exercise; the others aggregate over the whole workout or history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    ExerciseWeight,
    ExerciseReps,
    ExercisePb,
    WorkoutCount,
    WorkoutWeight,
    TotalWeight,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::ExerciseWeight => "exercise_weight",
            AchievementKind::ExerciseReps => "exercise_reps",
            AchievementKind::ExercisePb => "exercise_pb",
            AchievementKind::WorkoutCount => "workout_count",
            AchievementKind::WorkoutWeight => "workout_weight",
            AchievementKind::TotalWeight => "total_weight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exercise_weight" => Some(AchievementKind::ExerciseWeight),
            "exercise_reps" => Some(AchievementKind::ExerciseReps),
            "exercise_pb" => Some(AchievementKind::ExercisePb),
            "workout_count" => Some(AchievementKind::WorkoutCount),
            "workout_weight" => Some(AchievementKind::WorkoutWeight),
            "total_weight" => Some(AchievementKind::TotalWeight),
            _ => None,
        }
    }

    pub fn is_exercise_scoped(&self) -> bool {
        matches!(
            self,
            AchievementKind::ExerciseWeight
                | AchievementKind::ExerciseReps
                | AchievementKind::ExercisePb
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub kind: AchievementKind,
    pub target_value: f64,
    /// Progress at or below this value is not worth recording.
    pub min_value: f64,
    pub exercise_id: Option<String>,
    pub xp_reward: i64,
}

impl FromSqliteRow for Achievement {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind_str: String = row.get("kind")?;
        let kind = AchievementKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("unknown achievement kind: {kind_str}").into(),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            kind,
            target_value: row.get("target_value")?,
            min_value: row.get("min_value")?,
            exercise_id: row.get("exercise_id")?,
            xp_reward: row.get("xp_reward")?,
        })
    }
}

/// Per-user progress toward an achievement. Rows are created lazily; a
/// missing row means zero progress. Once `achieved` the row is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: String,
    pub achievement_id: String,
    pub current_value: f64,
    pub achieved: bool,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for UserAchievement {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            achievement_id: row.get("achievement_id")?,
            current_value: row.get("current_value")?,
            achieved: row.get("achieved")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Outcome of evaluating one achievement against a finished workout,
/// persisted as an upsert on `user_achievements`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgressUpdate {
    pub achievement_id: String,
    pub user_id: String,
    pub current_value: f64,
    pub achieved: bool,
    pub xp_reward: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_achievement_kind_parse_roundtrip() {
        for kind in [
            AchievementKind::ExerciseWeight,
            AchievementKind::ExerciseReps,
            AchievementKind::ExercisePb,
            AchievementKind::WorkoutCount,
            AchievementKind::WorkoutWeight,
            AchievementKind::TotalWeight,
        ] {
            assert_eq!(AchievementKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AchievementKind::parse("streak"), None);
    }

    #[test]
    fn test_achievement_kind_scoping() {
        assert!(AchievementKind::ExerciseWeight.is_exercise_scoped());
        assert!(AchievementKind::ExerciseReps.is_exercise_scoped());
        assert!(AchievementKind::ExercisePb.is_exercise_scoped());
        assert!(!AchievementKind::WorkoutCount.is_exercise_scoped());
        assert!(!AchievementKind::WorkoutWeight.is_exercise_scoped());
        assert!(!AchievementKind::TotalWeight.is_exercise_scoped());
    }
}
