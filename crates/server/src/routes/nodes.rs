//! Routes for the learning-node catalog and the leaderboard.

use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{learning_node::LearningNode, user_profile::LeaderboardEntry};
use serde::Deserialize;
use services::services::progression::ProgressionService;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// The full node catalog in unlock order
pub async fn list_nodes(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<LearningNode>>>, ApiError> {
    let nodes = LearningNode::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(nodes)))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<LeaderboardEntry>>>, ApiError> {
    let entries =
        ProgressionService::leaderboard(&state.db().pool, query.limit.unwrap_or(20)).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/nodes", get(list_nodes))
        .route("/leaderboard", get(leaderboard))
}
