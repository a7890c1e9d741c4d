use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{achievements, exercises, health, progression, workouts};

pub fn create_router(
    workouts_state: workouts::WorkoutsState,
    exercises_state: exercises::ExercisesState,
    progression_state: progression::ProgressionState,
    achievements_state: achievements::AchievementsState,
) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Workout routes
        .route("/workouts", get(workouts::list).post(workouts::create))
        .route(
            "/workouts/{id}",
            get(workouts::show).delete(workouts::delete),
        )
        .route("/workouts/{id}/exercises", post(workouts::add_exercise))
        .route(
            "/workouts/{id}/exercises/{entry_id}/sets",
            post(workouts::add_set),
        )
        .route("/workouts/{id}/start", post(workouts::start))
        .route("/workouts/{id}/stop", post(workouts::stop))
        .route("/workouts/{id}/finish", post(workouts::finish))
        .with_state(workouts_state)
        // Exercise catalog
        .route("/exercises", get(exercises::list).post(exercises::create))
        .route("/equipment", get(exercises::list_equipment))
        .route("/muscles", get(exercises::list_muscles))
        .with_state(exercises_state)
        // Progression
        .route("/progression", get(progression::summary))
        .route("/progression/history", get(progression::history))
        .route(
            "/weight",
            get(progression::weight_history).post(progression::record_weight),
        )
        .with_state(progression_state)
        // Achievements
        .route("/achievements", get(achievements::list))
        .with_state(achievements_state)
}
