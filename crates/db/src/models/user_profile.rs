use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Per-user mutable counters: insight points, daily hearts, streak length.
/// Counters are mutated with atomic SQL arithmetic, never read-modify-write,
/// so concurrent actions from multiple devices cannot lose updates.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserProfile {
    pub id: Uuid,
    pub insights: i64,
    pub hearts: i64,
    pub streak: i64,
    pub last_session_at: Option<DateTime<Utc>>,
    pub has_completed_onboarding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the insights leaderboard.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub insights: i64,
    pub streak: i64,
}

const PROFILE_COLUMNS: &str = "id, insights, hearts, streak, last_session_at, \
     has_completed_onboarding, created_at, updated_at";

impl UserProfile {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Create a profile with signup defaults: zero insights, zero streak and a
    /// full heart allowance.
    pub async fn create(pool: &SqlitePool, id: Uuid, hearts: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO user_profiles (id, hearts) VALUES ($1, $2)
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(hearts)
        .fetch_one(pool)
        .await
    }

    /// Credit insights atomically. Returns the new balance.
    pub async fn add_insights<'e, E>(executor: E, id: Uuid, amount: i64) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar(
            "UPDATE user_profiles
             SET insights = insights + $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING insights",
        )
        .bind(id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }

    /// Spend one heart if any remain. Returns the new balance, or `None` when
    /// the user was already at zero (or does not exist). The guard lives in
    /// the WHERE clause, so the balance can never go negative.
    pub async fn spend_heart(pool: &SqlitePool, id: Uuid) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE user_profiles
             SET hearts = hearts - 1, updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND hearts > 0
             RETURNING hearts",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Apply the daily roll-over in a single UPDATE: new streak value, refilled
    /// hearts, stamped session timestamp.
    pub async fn reset_daily(
        pool: &SqlitePool,
        id: Uuid,
        streak: i64,
        hearts: i64,
        session_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE user_profiles
             SET streak = $2, hearts = $3, last_session_at = $4,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(streak)
        .bind(hearts)
        .bind(session_at)
        .fetch_one(pool)
        .await
    }

    /// Set-once onboarding flag; never unset.
    pub async fn complete_onboarding(pool: &SqlitePool, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE user_profiles
             SET has_completed_onboarding = 1, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn leaderboard(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT id AS user_id, insights, streak
             FROM user_profiles
             ORDER BY insights DESC, streak DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
