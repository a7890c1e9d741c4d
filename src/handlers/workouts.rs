use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::lifecycle::{FinishSummary, WorkoutLifecycle};
use crate::middleware::AuthUser;
use crate::models::{
    AddWorkoutExercise, AddWorkoutSet, CreateWorkout, PerformedExercise, Workout, WorkoutExercise,
    WorkoutSet,
};
use crate::repositories::{ExerciseRepository, WorkoutRepository};

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
    pub lifecycle: WorkoutLifecycle,
}

#[derive(Serialize)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<PerformedExercise>,
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Json(req): Json<CreateWorkout>,
) -> Result<(StatusCode, Json<Workout>)> {
    let workout = state
        .workout_repo
        .create(
            &auth_user.id,
            &req.name,
            req.date,
            req.related_workout_id.as_deref(),
            req.notes.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Workout>>> {
    Ok(Json(state.workout_repo.find_by_user(&auth_user.id).await?))
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetail>> {
    let workout = load_owned(&state, &auth_user, &id).await?;
    let exercises = state.workout_repo.performed_exercises(&workout.id).await?;
    Ok(Json(WorkoutDetail { workout, exercises }))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let deleted = state.workout_repo.delete(&id, &auth_user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Workout not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_exercise(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<AddWorkoutExercise>,
) -> Result<(StatusCode, Json<WorkoutExercise>)> {
    let workout = load_owned(&state, &auth_user, &id).await?;
    ensure_editable(&workout)?;

    let exercise = state
        .exercise_repo
        .find_by_id(&req.exercise_id)
        .await?
        .filter(|e| e.user_id.is_none() || e.user_id.as_deref() == Some(auth_user.id.as_str()))
        .ok_or_else(|| AppError::NotFound(format!("Exercise not found: {}", req.exercise_id)))?;

    let entry = state
        .workout_repo
        .add_exercise(&workout.id, &exercise.id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn add_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path((id, entry_id)): Path<(String, String)>,
    Json(req): Json<AddWorkoutSet>,
) -> Result<(StatusCode, Json<WorkoutSet>)> {
    let workout = load_owned(&state, &auth_user, &id).await?;
    ensure_editable(&workout)?;

    let entry = state
        .workout_repo
        .find_exercise_entry(&entry_id)
        .await?
        .filter(|e| e.workout_id == workout.id)
        .ok_or_else(|| AppError::NotFound(format!("Workout exercise not found: {entry_id}")))?;

    let set = state
        .workout_repo
        .add_set(&entry.id, req.reps, req.weight)
        .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn start(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Workout>> {
    Ok(Json(state.lifecycle.start(&auth_user.id, &id).await?))
}

pub async fn stop(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Workout>> {
    Ok(Json(state.lifecycle.stop(&auth_user.id, &id).await?))
}

pub async fn finish(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FinishSummary>> {
    Ok(Json(state.lifecycle.finish(&auth_user.id, &id).await?))
}

async fn load_owned(state: &WorkoutsState, auth_user: &AuthUser, id: &str) -> Result<Workout> {
    let workout = state
        .workout_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout not found: {id}")))?;
    if workout.user_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Workout belongs to another user".to_string(),
        ));
    }
    Ok(workout)
}

fn ensure_editable(workout: &Workout) -> Result<()> {
    if workout.status.is_terminal() {
        return Err(AppError::Conflict(
            "Workout can no longer be edited".to_string(),
        ));
    }
    Ok(())
}
