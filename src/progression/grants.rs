use chrono::NaiveDate;

use crate::config::ProgressionConfig;
use crate::error::{AppError, Result};
use crate::models::{ExperienceHistory, PerformedExercise, Workout};
use crate::notify::{NotificationEvent, SharedNotifier};
use crate::progression::leveling::LevelCurve;
use crate::progression::multiplier::resolve_multiplier;
use crate::repositories::{ExperienceRepository, UserRepository};

/// Raw volume scored from a workout's exercises, in workout order.
///
/// Scoring stops at the first custom exercise: nothing after it counts,
/// not even later standard exercises. Equipment-free exercises score with
/// the performer's bodyweight in place of the recorded set weight.
pub fn raw_volume(performances: &[PerformedExercise], bodyweight: f64) -> f64 {
    let mut total = 0.0;
    for performance in performances {
        if performance.kind.is_custom() {
            break;
        }
        for set in &performance.sets {
            let weight = if performance.has_equipment {
                set.weight
            } else {
                bodyweight
            };
            total += set.reps as f64 * weight;
        }
    }
    total
}

/// Computes and applies XP grants: workout volume scaled and multiplied,
/// and flat achievement rewards. Owns the level-up signal.
#[derive(Clone)]
pub struct GrantCalculator {
    users: UserRepository,
    experience: ExperienceRepository,
    curve: LevelCurve,
    config: ProgressionConfig,
    notifier: SharedNotifier,
}

impl GrantCalculator {
    pub fn new(
        users: UserRepository,
        experience: ExperienceRepository,
        config: ProgressionConfig,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            users,
            experience,
            curve: LevelCurve::from_config(&config),
            config,
            notifier,
        }
    }

    pub fn curve(&self) -> LevelCurve {
        self.curve
    }

    /// The user's current bodyweight, falling back to the configured
    /// default when they have no weight history.
    pub async fn bodyweight_for(&self, user_id: &str) -> Result<f64> {
        Ok(self
            .users
            .current_bodyweight(user_id)
            .await?
            .unwrap_or(self.config.default_bodyweight))
    }

    /// Grant the XP earned by a finished workout. The workout must already
    /// carry `finished_at`; a missing owner is a hard failure.
    pub async fn grant_for_workout(
        &self,
        workout: &Workout,
        performances: &[PerformedExercise],
        today: NaiveDate,
    ) -> Result<ExperienceHistory> {
        if workout.finished_at.is_none() {
            return Err(AppError::Internal(format!(
                "Workout {} has no finish timestamp",
                workout.id
            )));
        }
        let user = self
            .users
            .find_by_id(&workout.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", workout.user_id)))?;

        let bodyweight = self.bodyweight_for(&user.id).await?;
        let raw = raw_volume(performances, bodyweight);
        let xp = (raw / self.config.xp_divisor).round() as i64;

        let events = self.experience.events_active_on(&user.id, today).await?;
        let multiplier = resolve_multiplier(&events);
        let xp_granted = (xp as f64 * multiplier).round() as i64;

        let record = self
            .experience
            .apply_grant(&user.id, &workout.id, xp_granted, self.curve)
            .await?;

        tracing::debug!(
            user_id = %user.id,
            workout_id = %workout.id,
            raw,
            multiplier,
            xp_granted,
            "experience granted"
        );
        self.signal_level_up(&record);
        Ok(record)
    }

    /// Grant a flat XP amount (achievement rewards) through the same
    /// ledger path as workout grants.
    pub async fn grant_reward(
        &self,
        user_id: &str,
        workout_id: &str,
        xp_reward: i64,
    ) -> Result<ExperienceHistory> {
        let record = self
            .experience
            .apply_grant(user_id, workout_id, xp_reward, self.curve)
            .await?;
        self.signal_level_up(&record);
        Ok(record)
    }

    fn signal_level_up(&self, record: &ExperienceHistory) {
        if record.level_after > record.level_before {
            self.notifier.notify(
                &record.user_id,
                NotificationEvent::LevelUp {
                    level: record.level_after,
                },
            );
        }
    }
}
