use axum::{extract::State, http::StatusCode, Json};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{CreateExercise, Equipment, Exercise, Muscle};
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
}

pub async fn list(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Exercise>>> {
    Ok(Json(
        state
            .exercise_repo
            .find_available_for_user(&auth_user.id)
            .await?,
    ))
}

pub async fn create(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Json(req): Json<CreateExercise>,
) -> Result<(StatusCode, Json<Exercise>)> {
    let exercise = state
        .exercise_repo
        .create(
            &req.name,
            req.kind,
            Some(&auth_user.id),
            &req.equipment_ids,
            &req.muscle_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

pub async fn list_equipment(
    State(state): State<ExercisesState>,
) -> Result<Json<Vec<Equipment>>> {
    Ok(Json(state.exercise_repo.list_equipment().await?))
}

pub async fn list_muscles(State(state): State<ExercisesState>) -> Result<Json<Vec<Muscle>>> {
    Ok(Json(state.exercise_repo.list_muscles().await?))
}
