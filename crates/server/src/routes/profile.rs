//! Routes for the profile ledger and badges.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{badge::Badge, user_profile::UserProfile};
use serde::{Deserialize, Serialize};
use services::services::{achievements::AchievementService, progression::ProgressionService};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AchievementCheckResponse {
    pub new_badges: Vec<String>,
}

/// Register a profile with signup defaults (called by the auth gateway)
pub async fn create_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    let profile =
        ProgressionService::create_profile(&state.db().pool, state.balance(), user_id).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    let profile = ProgressionService::get_profile(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// Mark onboarding finished; never unset
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    let profile = ProgressionService::complete_onboarding(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn list_badges(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Badge>>>, ApiError> {
    let badges = Badge::find_by_user(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(badges)))
}

/// Re-run the achievement rules for a user
pub async fn check_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<AchievementCheckResponse>>, ApiError> {
    let new_badges =
        AchievementService::check_and_award(&state.db().pool, state.balance(), user_id).await;
    Ok(ResponseJson(ApiResponse::success(AchievementCheckResponse {
        new_badges,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users/{user_id}",
        Router::new()
            .route("/profile", post(create_profile).get(get_profile))
            .route("/onboarding/complete", post(complete_onboarding))
            .route("/badges", get(list_badges))
            .route("/achievements/check", post(check_achievements)),
    )
}
