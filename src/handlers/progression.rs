use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ExperienceHistory, RecordWeight, WeightEntry};
use crate::progression::LevelCurve;
use crate::repositories::{ExperienceRepository, UserRepository};

#[derive(Clone)]
pub struct ProgressionState {
    pub user_repo: UserRepository,
    pub experience_repo: ExperienceRepository,
    pub curve: LevelCurve,
}

#[derive(Serialize)]
pub struct ProgressionSummary {
    pub user_id: String,
    pub username: String,
    pub level: i64,
    pub exp: i64,
    pub progress: f64,
    pub missing_xp: i64,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

pub async fn summary(
    State(state): State<ProgressionState>,
    auth_user: AuthUser,
) -> Result<Json<ProgressionSummary>> {
    let user = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", auth_user.id)))?;
    let snapshot = state.curve.snapshot(user.exp);
    Ok(Json(ProgressionSummary {
        user_id: user.id,
        username: user.username,
        level: snapshot.level,
        exp: snapshot.exp,
        progress: snapshot.progress,
        missing_xp: snapshot.missing_xp,
    }))
}

pub async fn history(
    State(state): State<ProgressionState>,
    auth_user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ExperienceHistory>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    Ok(Json(
        state
            .experience_repo
            .history_for_user(&auth_user.id, limit)
            .await?,
    ))
}

pub async fn record_weight(
    State(state): State<ProgressionState>,
    auth_user: AuthUser,
    Json(req): Json<RecordWeight>,
) -> Result<(StatusCode, Json<WeightEntry>)> {
    if req.weight <= 0.0 {
        return Err(AppError::Validation("Weight must be positive".to_string()));
    }
    let recorded_on = req
        .recorded_on
        .unwrap_or_else(|| Utc::now().date_naive());
    let entry = state
        .user_repo
        .record_weight(&auth_user.id, req.weight, recorded_on)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn weight_history(
    State(state): State<ProgressionState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<WeightEntry>>> {
    Ok(Json(state.user_repo.weight_history(&auth_user.id).await?))
}
