use std::collections::HashMap;

use chrono::{Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{
    AchievementProgressUpdate, ExperienceHistory, Workout, WorkoutStatus,
};
use crate::notify::{NotificationEvent, SharedNotifier};
use crate::progression::achievements::{evaluate, exercise_totals, WorkoutFigures};
use crate::progression::GrantCalculator;
use crate::repositories::{AchievementRepository, WorkoutRepository};

/// Everything a successful finish produced.
#[derive(Debug, Clone, Serialize)]
pub struct FinishSummary {
    pub workout: Workout,
    pub experience: ExperienceHistory,
    pub achievements: Vec<AchievementProgressUpdate>,
}

/// The workout state machine.
///
/// Legal transitions: planned -> in_progress -> completed, and
/// planned -> skipped via the sweep. Completed and skipped are terminal.
/// Every transition is guarded by a conditional update on the status
/// column, so two racing calls resolve to a single winner.
#[derive(Clone)]
pub struct WorkoutLifecycle {
    workouts: WorkoutRepository,
    achievements: AchievementRepository,
    grants: GrantCalculator,
    notifier: SharedNotifier,
    tz: FixedOffset,
    stale_after: Duration,
}

impl WorkoutLifecycle {
    pub fn new(
        workouts: WorkoutRepository,
        achievements: AchievementRepository,
        grants: GrantCalculator,
        notifier: SharedNotifier,
        tz: FixedOffset,
        stale_after_hours: i64,
    ) -> Self {
        Self {
            workouts,
            achievements,
            grants,
            notifier,
            tz,
            stale_after: Duration::hours(stale_after_hours),
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Begin a workout. Legal only for the owner, from `planned`, on the
    /// workout's scheduled day.
    pub async fn start(&self, actor: &str, workout_id: &str) -> Result<Workout> {
        let workout = self.load_owned(actor, workout_id).await?;
        self.ensure_status(&workout, WorkoutStatus::Planned)?;
        self.ensure_scheduled_today(&workout)?;

        if !self.workouts.mark_started(&workout.id, Utc::now()).await? {
            return Err(AppError::Conflict("Workout is already started".to_string()));
        }
        tracing::info!(workout_id = %workout.id, user_id = actor, "workout started");
        self.reload(&workout.id).await
    }

    /// Abort a started workout, reverting it to `planned` with no trace of
    /// the attempt.
    pub async fn stop(&self, actor: &str, workout_id: &str) -> Result<Workout> {
        let workout = self.load_owned(actor, workout_id).await?;
        self.ensure_status(&workout, WorkoutStatus::InProgress)?;
        self.ensure_scheduled_today(&workout)?;

        if !self.workouts.mark_stopped(&workout.id).await? {
            return Err(AppError::Conflict(
                "Workout is not in progress".to_string(),
            ));
        }
        tracing::info!(workout_id = %workout.id, user_id = actor, "workout stopped");
        self.reload(&workout.id).await
    }

    /// Complete a workout: win the status race, then grant experience and
    /// update achievement progress. A workout whose settlement fails is
    /// already durably completed; the error still surfaces to the caller.
    pub async fn finish(&self, actor: &str, workout_id: &str) -> Result<FinishSummary> {
        let workout = self.load_owned(actor, workout_id).await?;
        self.ensure_status(&workout, WorkoutStatus::InProgress)?;
        self.ensure_scheduled_today(&workout)?;

        if !self.workouts.mark_finished(&workout.id, Utc::now()).await? {
            return Err(AppError::Conflict(
                "Workout is already finished".to_string(),
            ));
        }
        let workout = self.reload(&workout.id).await?;
        tracing::info!(workout_id = %workout.id, user_id = actor, "workout finished");
        self.settle(workout).await
    }

    /// Sweep: skip every planned workout whose day has fully elapsed.
    /// Idempotent; a second run finds nothing.
    pub async fn skip_elapsed(&self) -> Result<usize> {
        let skipped = self.workouts.skip_stale_planned(self.today()).await?;
        if skipped > 0 {
            tracing::info!(skipped, "skipped elapsed workouts");
        }
        Ok(skipped)
    }

    /// Sweep: force-finish workouts left in progress past the stale window,
    /// through the same settlement as an interactive finish. A settlement
    /// failure is logged and the sweep moves on; one bad row must not
    /// wedge the batch.
    pub async fn finish_stale(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.stale_after;
        let stale = self.workouts.find_stale_in_progress(cutoff).await?;
        let mut finished = 0;

        for workout in stale {
            if !self.workouts.mark_finished(&workout.id, Utc::now()).await? {
                continue;
            }
            let workout = self.reload(&workout.id).await?;
            tracing::info!(workout_id = %workout.id, "workout force-finished by sweep");
            match self.settle(workout).await {
                Ok(_) => finished += 1,
                Err(e) => {
                    tracing::error!(error = %e, "failed to settle force-finished workout");
                }
            }
        }
        Ok(finished)
    }

    async fn load_owned(&self, actor: &str, workout_id: &str) -> Result<Workout> {
        let workout = self
            .workouts
            .find_by_id(workout_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workout not found: {workout_id}")))?;
        if workout.user_id != actor {
            return Err(AppError::Forbidden(
                "Workout belongs to another user".to_string(),
            ));
        }
        Ok(workout)
    }

    async fn reload(&self, workout_id: &str) -> Result<Workout> {
        self.workouts
            .find_by_id(workout_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workout not found: {workout_id}")))
    }

    fn ensure_status(&self, workout: &Workout, expected: WorkoutStatus) -> Result<()> {
        if workout.status == expected {
            return Ok(());
        }
        let message = match workout.status {
            WorkoutStatus::Planned => "Workout has not been started",
            WorkoutStatus::InProgress => "Workout is already started",
            WorkoutStatus::Completed => "Workout is already finished",
            WorkoutStatus::Skipped => "Workout was skipped",
        };
        Err(AppError::Conflict(message.to_string()))
    }

    fn ensure_scheduled_today(&self, workout: &Workout) -> Result<()> {
        if workout.date != self.today() {
            return Err(AppError::Validation(
                "Workout is not scheduled for today".to_string(),
            ));
        }
        Ok(())
    }

    /// Post-completion settlement: XP grant, then achievement progress,
    /// then reward grants for anything newly achieved.
    async fn settle(&self, workout: Workout) -> Result<FinishSummary> {
        let performances = self.workouts.performed_exercises(&workout.id).await?;
        let experience = self
            .grants
            .grant_for_workout(&workout, &performances, self.today())
            .await?;

        let bodyweight = self.grants.bodyweight_for(&workout.user_id).await?;
        let mut totals = exercise_totals(&performances, bodyweight);
        for entry in &mut totals {
            let has_equipment = performances
                .iter()
                .find(|p| p.exercise_id == entry.exercise_id)
                .map(|p| p.has_equipment)
                .unwrap_or(false);
            entry.personal_best = if has_equipment {
                self.workouts
                    .max_set_weight(&workout.user_id, &entry.exercise_id)
                    .await?
                    .unwrap_or(0.0)
            } else {
                bodyweight
            };
        }

        let exercise_ids: Vec<String> =
            totals.iter().map(|t| t.exercise_id.clone()).collect();
        let workout_total_weight = totals.iter().map(|t| t.total_weight).sum();
        let figures = WorkoutFigures {
            user_id: workout.user_id.clone(),
            exercises: totals,
            workout_total_weight,
            completed_count: self.workouts.count_completed(&workout.user_id).await?,
        };

        let candidates = self.achievements.find_candidates(&exercise_ids).await?;
        let existing: HashMap<_, _> = self
            .achievements
            .progress_for_user(&workout.user_id)
            .await?
            .into_iter()
            .map(|p| (p.achievement_id.clone(), p))
            .collect();

        let updates = evaluate(&figures, &candidates, &existing);
        for update in &updates {
            self.achievements.upsert_progress(update).await?;
            if update.achieved {
                if update.xp_reward > 0 {
                    self.grants
                        .grant_reward(&workout.user_id, &workout.id, update.xp_reward)
                        .await?;
                }
                let name = candidates
                    .iter()
                    .find(|a| a.id == update.achievement_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default();
                self.notifier.notify(
                    &workout.user_id,
                    NotificationEvent::AchievementUnlocked {
                        achievement_id: update.achievement_id.clone(),
                        name,
                        xp_reward: update.xp_reward,
                    },
                );
            }
        }

        Ok(FinishSummary {
            workout,
            experience,
            achievements: updates,
        })
    }
}
