//! Progression engine: node completion, daily roll-over, heart accounting and
//! path seeding.

use chrono::Utc;
use db::models::{
    learning_node::LearningNode,
    node_progress::{NodeProgress, PathEntry, ProgressStatus},
    user_profile::{LeaderboardEntry, UserProfile},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use super::{achievements::AchievementService, balance::BalanceConfig};

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("user not found")]
    UserNotFound,
    #[error("learning node not found")]
    NodeNotFound,
    #[error("node already completed")]
    NodeAlreadyCompleted,
    #[error("no hearts remaining")]
    NoHeartsRemaining,
    #[error("learning path not initialized")]
    PathNotInitialized,
}

/// Result of completing a node, rendered by the celebration screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NodeCompletionOutcome {
    pub insights_earned: i64,
    pub is_checkpoint: bool,
    pub next_node_unlocked: bool,
    pub new_badges: Vec<String>,
}

/// Result of the daily roll-over check.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DailyStats {
    pub streak: i64,
    pub hearts: i64,
    pub streak_extended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HeartBalance {
    pub hearts_remaining: i64,
}

pub struct ProgressionService;

impl ProgressionService {
    /// Complete a node: stamp the progress row, credit the reward, unlock the
    /// next node in sequence and evaluate achievements.
    ///
    /// Completion, profile credit and the unlock commit in one transaction,
    /// so a failure can never leave insights credited with the next node
    /// still locked. Badge evaluation runs after the commit and cannot undo
    /// a completion.
    pub async fn complete_node(
        pool: &SqlitePool,
        balance: &BalanceConfig,
        user_id: Uuid,
        node_id: Uuid,
        response_payload: Option<serde_json::Value>,
    ) -> Result<NodeCompletionOutcome, ProgressionError> {
        let node = LearningNode::find_by_id(pool, node_id)
            .await?
            .ok_or(ProgressionError::NodeNotFound)?;
        UserProfile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProgressionError::UserNotFound)?;

        let progress = NodeProgress::find_by_user_and_node(pool, user_id, node_id)
            .await?
            .ok_or(ProgressionError::PathNotInitialized)?;
        // `completed` is terminal: no status regression, no double credit.
        if progress.status == ProgressStatus::Completed {
            return Err(ProgressionError::NodeAlreadyCompleted);
        }

        let is_checkpoint = balance.is_checkpoint_day(node.sequence_day);
        let insights_earned = balance.node_reward(node.sequence_day);
        let payload_json = response_payload.map(|v| v.to_string());

        let mut tx = pool.begin().await?;

        NodeProgress::complete(
            &mut *tx,
            user_id,
            node_id,
            insights_earned,
            payload_json.as_deref(),
        )
        .await?;
        UserProfile::add_insights(&mut *tx, user_id, insights_earned).await?;

        let next_node_unlocked =
            match LearningNode::find_next_after(&mut *tx, node.sequence_day).await? {
                Some(next) => {
                    NodeProgress::upsert_status(&mut *tx, user_id, next.id, ProgressStatus::Current)
                        .await?;
                    true
                }
                None => false,
            };

        tx.commit().await?;

        info!(
            user_id = %user_id,
            node_id = %node_id,
            insights_earned,
            is_checkpoint,
            next_node_unlocked,
            "node completed"
        );

        let new_badges = AchievementService::check_and_award(pool, balance, user_id).await;

        Ok(NodeCompletionOutcome {
            insights_earned,
            is_checkpoint,
            next_node_unlocked,
            new_badges,
        })
    }

    /// Roll the profile over to a new session day if the calendar date has
    /// changed: bump or reset the streak, refill hearts, stamp the session
    /// timestamp. Same-day calls are a no-op.
    pub async fn update_daily_stats(
        pool: &SqlitePool,
        balance: &BalanceConfig,
        user_id: Uuid,
    ) -> Result<DailyStats, ProgressionError> {
        let profile = UserProfile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProgressionError::UserNotFound)?;

        let now = Utc::now();
        let today = now.date_naive();
        let last_day = profile.last_session_at.map(|t| t.date_naive());

        if last_day == Some(today) {
            debug!(user_id = %user_id, "daily stats unchanged, same session day");
            return Ok(DailyStats {
                streak: profile.streak,
                hearts: profile.hearts,
                streak_extended: false,
            });
        }

        // A first-ever session counts as non-consecutive: the streak starts
        // at 1.
        let streak_extended = last_day == today.pred_opt();
        let streak = if streak_extended { profile.streak + 1 } else { 1 };

        let updated = UserProfile::reset_daily(pool, user_id, streak, balance.max_hearts, now).await?;

        info!(
            user_id = %user_id,
            streak = updated.streak,
            streak_extended,
            "daily roll-over applied"
        );

        Ok(DailyStats {
            streak: updated.streak,
            hearts: updated.hearts,
            streak_extended,
        })
    }

    /// Spend one heart. Running out is a domain failure, not an exception.
    pub async fn spend_heart(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<HeartBalance, ProgressionError> {
        match UserProfile::spend_heart(pool, user_id).await? {
            Some(hearts_remaining) => {
                debug!(user_id = %user_id, hearts_remaining, "heart spent");
                Ok(HeartBalance { hearts_remaining })
            }
            // The guarded UPDATE matched nothing: either the user is unknown
            // or the balance is already zero.
            None => match UserProfile::find_by_id(pool, user_id).await? {
                Some(_) => Err(ProgressionError::NoHeartsRemaining),
                None => Err(ProgressionError::UserNotFound),
            },
        }
    }

    /// Seed one progress row per learning node: the first sequence day starts
    /// `current`, everything after it `locked`. Idempotent; an already-seeded
    /// path is left untouched.
    pub async fn initialize_path(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<u64, ProgressionError> {
        UserProfile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProgressionError::UserNotFound)?;

        let existing = NodeProgress::count_for_user(pool, user_id).await?;
        if existing > 0 {
            debug!(user_id = %user_id, existing, "path already initialized");
            return Ok(0);
        }

        let nodes = LearningNode::find_all(pool).await?;

        let mut tx = pool.begin().await?;
        let mut seeded = 0u64;
        for (position, node) in nodes.iter().enumerate() {
            let status = if position == 0 {
                ProgressStatus::Current
            } else {
                ProgressStatus::Locked
            };
            NodeProgress::upsert_status(&mut *tx, user_id, node.id, status).await?;
            seeded += 1;
        }
        tx.commit().await?;

        info!(user_id = %user_id, seeded, "learning path initialized");
        Ok(seeded)
    }

    /// The user's full path in unlock order. An empty path for a known user
    /// means `initialize_path` has not run yet.
    pub async fn get_path(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<PathEntry>, ProgressionError> {
        let entries = NodeProgress::path_for_user(pool, user_id).await?;
        if entries.is_empty()
            && UserProfile::find_by_id(pool, user_id).await?.is_none()
        {
            return Err(ProgressionError::UserNotFound);
        }
        Ok(entries)
    }

    /// Register a profile with signup defaults. Idempotent: an existing
    /// profile is returned unchanged.
    pub async fn create_profile(
        pool: &SqlitePool,
        balance: &BalanceConfig,
        user_id: Uuid,
    ) -> Result<UserProfile, ProgressionError> {
        if let Some(profile) = UserProfile::find_by_id(pool, user_id).await? {
            return Ok(profile);
        }
        let profile = UserProfile::create(pool, user_id, balance.max_hearts).await?;
        info!(user_id = %user_id, "profile created");
        Ok(profile)
    }

    pub async fn get_profile(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<UserProfile, ProgressionError> {
        UserProfile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProgressionError::UserNotFound)
    }

    pub async fn complete_onboarding(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<UserProfile, ProgressionError> {
        UserProfile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProgressionError::UserNotFound)?;
        let profile = UserProfile::complete_onboarding(pool, user_id).await?;
        Ok(profile)
    }

    pub async fn leaderboard(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, ProgressionError> {
        let limit = limit.clamp(1, 100);
        Ok(UserProfile::leaderboard(pool, limit).await?)
    }
}
