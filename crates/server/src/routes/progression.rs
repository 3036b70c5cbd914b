//! Routes for the progression engine (node completion, daily stats, hearts).

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::node_progress::PathEntry;
use serde::{Deserialize, Serialize};
use services::services::{
    path_integrity::{PathIntegrityReport, PathIntegrityService},
    progression::{DailyStats, HeartBalance, NodeCompletionOutcome, ProgressionService},
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CompleteNodeRequest {
    /// Survey answers from the client, stored verbatim.
    pub response_payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PathInitializedResponse {
    pub nodes_seeded: u64,
}

/// Complete a node and collect its reward
pub async fn complete_node(
    State(state): State<AppState>,
    Path((user_id, node_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<CompleteNodeRequest>,
) -> Result<ResponseJson<ApiResponse<NodeCompletionOutcome>>, ApiError> {
    let outcome = ProgressionService::complete_node(
        &state.db().pool,
        state.balance(),
        user_id,
        node_id,
        payload.response_payload,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(outcome)))
}

/// Roll the profile over to a new session day if the date changed
pub async fn update_daily_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<DailyStats>>, ApiError> {
    let stats =
        ProgressionService::update_daily_stats(&state.db().pool, state.balance(), user_id).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

/// Spend one heart on a node attempt
pub async fn spend_heart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<HeartBalance>>, ApiError> {
    let balance = ProgressionService::spend_heart(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(balance)))
}

/// Seed the learning path for a user
pub async fn initialize_path(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PathInitializedResponse>>, ApiError> {
    let nodes_seeded = ProgressionService::initialize_path(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(PathInitializedResponse {
        nodes_seeded,
    })))
}

/// Get the user's path with per-node status
pub async fn get_path(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<PathEntry>>>, ApiError> {
    let entries = ProgressionService::get_path(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// Validate the path invariants for a user
pub async fn check_path_integrity(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PathIntegrityReport>>, ApiError> {
    let report = PathIntegrityService::validate(&state.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/users/{user_id}",
        Router::new()
            .route("/path/initialize", post(initialize_path))
            .route("/path", get(get_path))
            .route("/path/integrity", get(check_path_integrity))
            .route("/nodes/{node_id}/complete", post(complete_node))
            .route("/daily-stats", post(update_daily_stats))
            .route("/hearts/spend", post(spend_heart)),
    )
}
