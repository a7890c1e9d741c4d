use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::Achievement;
use crate::repositories::AchievementRepository;

#[derive(Clone)]
pub struct AchievementsState {
    pub achievement_repo: AchievementRepository,
}

#[derive(Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub current_value: f64,
    pub achieved: bool,
}

/// All achievement definitions joined with the caller's progress. Missing
/// progress rows read as zero, not achieved.
pub async fn list(
    State(state): State<AchievementsState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<AchievementStatus>>> {
    let achievements = state.achievement_repo.find_all().await?;
    let progress: HashMap<_, _> = state
        .achievement_repo
        .progress_for_user(&auth_user.id)
        .await?
        .into_iter()
        .map(|p| (p.achievement_id.clone(), p))
        .collect();

    let statuses = achievements
        .into_iter()
        .map(|achievement| {
            let row = progress.get(&achievement.id);
            AchievementStatus {
                current_value: row.map(|r| r.current_value).unwrap_or(0.0),
                achieved: row.map(|r| r.achieved).unwrap_or(false),
                achievement,
            }
        })
        .collect();
    Ok(Json(statuses))
}
