use std::collections::HashMap;

use crate::models::{
    Achievement, AchievementKind, AchievementProgressUpdate, PerformedExercise, UserAchievement,
};

/// Per-exercise totals for one finished workout, scored under the same
/// rules as XP: workout order, stop at the first custom exercise,
/// bodyweight in place of set weight for equipment-free exercises.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseTotals {
    pub exercise_id: String,
    pub total_weight: f64,
    pub total_reps: i64,
    /// Heaviest qualifying set weight for this exercise across the user's
    /// completed history.
    pub personal_best: f64,
}

/// Everything the evaluator needs to know about one finished workout.
#[derive(Debug, Clone)]
pub struct WorkoutFigures {
    pub user_id: String,
    pub exercises: Vec<ExerciseTotals>,
    pub workout_total_weight: f64,
    /// Count of the user's completed workouts, including this one.
    pub completed_count: i64,
}

/// Compute the scored per-exercise totals. Personal bests are left at zero
/// for the caller to fill from history.
pub fn exercise_totals(performances: &[PerformedExercise], bodyweight: f64) -> Vec<ExerciseTotals> {
    let mut totals = Vec::new();
    for performance in performances {
        if performance.kind.is_custom() {
            break;
        }
        let mut total_weight = 0.0;
        let mut total_reps = 0i64;
        for set in &performance.sets {
            let weight = if performance.has_equipment {
                set.weight
            } else {
                bodyweight
            };
            total_weight += set.reps as f64 * weight;
            total_reps += set.reps as i64;
        }
        totals.push(ExerciseTotals {
            exercise_id: performance.exercise_id.clone(),
            total_weight,
            total_reps,
            personal_best: 0.0,
        });
    }
    totals
}

/// Evaluate every candidate achievement against the workout figures and
/// emit the progress updates worth persisting.
///
/// Guarantees: rows already `achieved` are never touched, progress is
/// clamped at the target, and updates at or below the achievement's
/// minimum are dropped rather than recorded as noise.
pub fn evaluate(
    figures: &WorkoutFigures,
    candidates: &[Achievement],
    existing: &HashMap<String, UserAchievement>,
) -> Vec<AchievementProgressUpdate> {
    let mut updates = Vec::new();

    for achievement in candidates {
        let row = existing.get(&achievement.id);
        if row.map(|r| r.achieved).unwrap_or(false) {
            continue;
        }
        let current = row.map(|r| r.current_value).unwrap_or(0.0);

        let value = match achievement.kind {
            AchievementKind::ExerciseWeight => match scoped_totals(figures, achievement) {
                Some((weight, _, _)) => current + weight,
                None => continue,
            },
            AchievementKind::ExerciseReps => match scoped_totals(figures, achievement) {
                Some((_, reps, _)) => current + reps as f64,
                None => continue,
            },
            AchievementKind::ExercisePb => match scoped_totals(figures, achievement) {
                Some((_, _, pb)) => pb,
                None => continue,
            },
            AchievementKind::WorkoutCount => figures.completed_count as f64,
            AchievementKind::WorkoutWeight => figures.workout_total_weight,
            AchievementKind::TotalWeight => current + figures.workout_total_weight,
        };

        let new_value = value.min(achievement.target_value);
        if new_value <= achievement.min_value {
            continue;
        }

        updates.push(AchievementProgressUpdate {
            achievement_id: achievement.id.clone(),
            user_id: figures.user_id.clone(),
            current_value: new_value,
            achieved: new_value >= achievement.target_value,
            xp_reward: achievement.xp_reward,
        });
    }

    updates
}

/// Totals for the exercise an exercise-scoped achievement is linked to,
/// summed across every scored appearance in the workout. None when the
/// exercise was not scored in this workout.
fn scoped_totals(figures: &WorkoutFigures, achievement: &Achievement) -> Option<(f64, i64, f64)> {
    let exercise_id = achievement.exercise_id.as_deref()?;
    let mut found = false;
    let mut weight = 0.0;
    let mut reps = 0i64;
    let mut pb = 0.0f64;
    for totals in &figures.exercises {
        if totals.exercise_id == exercise_id {
            found = true;
            weight += totals.total_weight;
            reps += totals.total_reps;
            pb = pb.max(totals.personal_best);
        }
    }
    found.then_some((weight, reps, pb))
}
